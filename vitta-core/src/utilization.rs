//! Credit utilization, available credit and threshold-based tips.

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::cycle::ordinal;
use crate::money::{monthly_interest, round1, round_cents};

/// Above this utilization a card gets the severe warning.
pub const HIGH_UTILIZATION_PERCENT: f64 = 70.0;
/// Above this (and not above the high mark) a card gets the moderate warning.
pub const MODERATE_UTILIZATION_PERCENT: f64 = 30.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TipKind {
    PayInFull,
    HighUtilization,
    ModerateUtilization,
    ZeroBalance,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Positive,
    Info,
    Warning,
    Severe,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tip {
    pub kind: TipKind,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UtilizationReport {
    pub card_id: String,
    /// `None` when the card has no credit limit
    pub utilization_percent: Option<f64>,
    pub available_credit: f64,
    pub tips: Vec<Tip>,
}

/// Balance as a percentage of the limit, one decimal. `None` for a zero limit.
pub fn utilization_percent(balance: f64, limit: f64) -> Option<f64> {
    if limit <= 0.0 || !limit.is_finite() || !balance.is_finite() {
        return None;
    }
    Some(round1(balance / limit * 100.0))
}

pub fn analyze(card: &Card) -> UtilizationReport {
    let utilization = utilization_percent(card.current_balance, card.credit_limit);
    let name = card.display_name();
    let mut tips = Vec::new();

    if card.current_balance <= 0.0 {
        tips.push(Tip {
            kind: TipKind::ZeroBalance,
            severity: Severity::Positive,
            message: format!("{name} has a zero balance. Nice work keeping it paid off."),
        });
    } else {
        if let Some(due_day) = card.payment_due_day {
            let interest = monthly_interest(card.current_balance, card.apr);
            tips.push(Tip {
                kind: TipKind::PayInFull,
                severity: Severity::Info,
                message: format!(
                    "Pay the full ${:.2} on {name} by the {} to avoid about ${:.2} \
                     in interest this month.",
                    card.current_balance,
                    ordinal(due_day),
                    round_cents(interest)
                ),
            });
        }

        match utilization {
            Some(u) if u > HIGH_UTILIZATION_PERCENT => tips.push(Tip {
                kind: TipKind::HighUtilization,
                severity: Severity::Severe,
                message: format!(
                    "{name} is at {u:.1}% utilization. Paying it below \
                     {HIGH_UTILIZATION_PERCENT:.0}% should be the priority; \
                     high utilization hurts your credit score."
                ),
            }),
            Some(u) if u > MODERATE_UTILIZATION_PERCENT => tips.push(Tip {
                kind: TipKind::ModerateUtilization,
                severity: Severity::Warning,
                message: format!(
                    "{name} is at {u:.1}% utilization. \
                     Try to keep it under {MODERATE_UTILIZATION_PERCENT:.0}%."
                ),
            }),
            _ => {}
        }
    }

    UtilizationReport {
        card_id: card.id.clone(),
        utilization_percent: utilization,
        available_credit: round_cents(card.available_credit()),
        tips,
    }
}

/// Totals across every card the user holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSummary {
    pub total_limit: f64,
    pub total_balance: f64,
    pub total_available: f64,
    pub utilization_percent: Option<f64>,
    pub cards: Vec<UtilizationReport>,
}

pub fn analyze_portfolio(cards: &[Card]) -> PortfolioSummary {
    let total_limit: f64 = cards.iter().map(|c| c.credit_limit).sum();
    let total_balance: f64 = cards.iter().map(|c| c.current_balance.max(0.0)).sum();
    let total_available: f64 = cards.iter().map(|c| c.available_credit()).sum();

    PortfolioSummary {
        total_limit: round_cents(total_limit),
        total_balance: round_cents(total_balance),
        total_available: round_cents(total_available),
        utilization_percent: utilization_percent(total_balance, total_limit),
        cards: cards.iter().map(analyze).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNetwork;

    fn card(limit: f64, balance: f64, apr: f64) -> Card {
        Card::new("c1", "Test Card", CardNetwork::Mastercard, limit, balance, apr)
    }

    fn kinds(report: &UtilizationReport) -> Vec<TipKind> {
        report.tips.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_zero_limit_is_undefined() {
        let report = analyze(&card(0.0, 0.0, 20.0));
        assert_eq!(report.utilization_percent, None);
        assert_eq!(report.available_credit, 0.0);
        assert_eq!(kinds(&report), vec![TipKind::ZeroBalance]);
    }

    #[test]
    fn test_utilization_rounds_to_one_decimal() {
        let report = analyze(&card(3000.0, 1000.0, 20.0));
        assert_eq!(report.utilization_percent, Some(33.3));
        assert_eq!(report.available_credit, 2000.0);
    }

    #[test]
    fn test_high_utilization_with_due_day() {
        let report = analyze(&card(1000.0, 800.0, 24.0).with_due_day(5));
        assert_eq!(kinds(&report), vec![TipKind::PayInFull, TipKind::HighUtilization]);
        // 800 * 24 / 100 / 12 = 16.00
        assert!(report.tips[0].message.contains("$16.00"));
        assert!(report.tips[0].message.contains("5th"));
        assert_eq!(report.tips[1].severity, Severity::Severe);
    }

    #[test]
    fn test_moderate_without_due_day() {
        let report = analyze(&card(1000.0, 500.0, 24.0));
        assert_eq!(kinds(&report), vec![TipKind::ModerateUtilization]);
    }

    #[test]
    fn test_low_utilization_only_pay_in_full() {
        let report = analyze(&card(1000.0, 100.0, 24.0).with_due_day(20));
        assert_eq!(kinds(&report), vec![TipKind::PayInFull]);
    }

    #[test]
    fn test_exactly_at_thresholds_not_flagged() {
        assert!(kinds(&analyze(&card(1000.0, 300.0, 20.0))).is_empty());
        assert_eq!(
            kinds(&analyze(&card(1000.0, 700.0, 20.0))),
            vec![TipKind::ModerateUtilization]
        );
    }

    #[test]
    fn test_portfolio_totals() {
        let cards = vec![
            card(1000.0, 500.0, 20.0),
            Card::new("c2", "Other", CardNetwork::Visa, 3000.0, 0.0, 15.0),
        ];
        let p = analyze_portfolio(&cards);
        assert_eq!(p.total_limit, 4000.0);
        assert_eq!(p.total_balance, 500.0);
        assert_eq!(p.total_available, 3500.0);
        assert_eq!(p.utilization_percent, Some(12.5));
        assert_eq!(p.cards.len(), 2);
    }

    #[test]
    fn test_empty_portfolio() {
        let p = analyze_portfolio(&[]);
        assert_eq!(p.utilization_percent, None);
        assert!(p.cards.is_empty());
    }
}
