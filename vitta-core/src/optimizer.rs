//! Payment allocation across balances: avalanche method.
//!
//! Highest APR first, `min(remaining, balance)` per card, zero-APR cards last.
//! Under a single-period budget with no early-payment fees this greedy order
//! minimizes total interest, so there is no search.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::money::{from_cents, monthly_interest, round_cents, to_cents};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Allocation {
    pub card_id: String,
    pub card_label: String,
    pub apr: f64,
    pub balance: f64,
    pub allocated: f64,
    pub residual: f64,
    /// Interest the residual accrues over the next cycle
    pub projected_interest: f64,
    /// Interest the allocated amount no longer accrues
    pub interest_avoided: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptimizationPlan {
    pub budget: f64,
    /// In payment order
    pub allocations: Vec<Allocation>,
    pub total_allocated: f64,
    pub total_projected_interest: f64,
    pub total_interest_avoided: f64,
    /// Budget left over once every balance is paid
    pub surplus: f64,
}

impl OptimizationPlan {
    pub fn allocation_for(&self, card_id: &str) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.card_id == card_id)
    }
}

fn avalanche_order(a: &Card, b: &Card) -> Ordering {
    let a_free = a.apr <= 0.0;
    let b_free = b.apr <= 0.0;
    a_free
        .cmp(&b_free)
        .then_with(|| b.apr.total_cmp(&a.apr))
        .then_with(|| b.current_balance.total_cmp(&a.current_balance))
        .then_with(|| a.created_seq.cmp(&b.created_seq))
        .then_with(|| a.id.cmp(&b.id))
}

/// Budget in whole cents, never rounded up past what the caller has.
fn budget_cents(budget: f64) -> i64 {
    if !budget.is_finite() || budget <= 0.0 {
        return 0;
    }
    let cents = to_cents(budget);
    if from_cents(cents) > budget { cents - 1 } else { cents }
}

pub fn optimize(cards: &[Card], budget: f64) -> OptimizationPlan {
    let mut ordered: Vec<&Card> = cards.iter().collect();
    ordered.sort_by(|a, b| avalanche_order(a, b));

    let budget_cents = budget_cents(budget);
    let mut remaining = budget_cents;
    let mut allocations = Vec::with_capacity(ordered.len());

    for card in ordered {
        let balance = to_cents(card.current_balance.max(0.0));
        let allocated = remaining.min(balance);
        remaining -= allocated;
        let residual = balance - allocated;

        allocations.push(Allocation {
            card_id: card.id.clone(),
            card_label: card.display_name().to_string(),
            apr: card.apr,
            balance: from_cents(balance),
            allocated: from_cents(allocated),
            residual: from_cents(residual),
            projected_interest: round_cents(monthly_interest(from_cents(residual), card.apr)),
            interest_avoided: round_cents(monthly_interest(from_cents(allocated), card.apr)),
        });
    }

    let total_allocated = budget_cents - remaining;
    let plan = OptimizationPlan {
        budget,
        total_allocated: from_cents(total_allocated),
        total_projected_interest: round_cents(
            allocations.iter().map(|a| a.projected_interest).sum(),
        ),
        total_interest_avoided: round_cents(allocations.iter().map(|a| a.interest_avoided).sum()),
        surplus: from_cents(remaining),
        allocations,
    };

    tracing::debug!(
        cards = plan.allocations.len(),
        allocated = plan.total_allocated,
        surplus = plan.surplus,
        "built payment plan"
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNetwork;

    fn card(id: &str, balance: f64, apr: f64) -> Card {
        Card::new(id, id, CardNetwork::Visa, 10_000.0, balance, apr)
    }

    #[test]
    fn test_avalanche_prefers_apr_over_small_balance() {
        let cards = vec![card("a", 1000.0, 24.0), card("b", 500.0, 0.0)];
        let plan = optimize(&cards, 800.0);

        let a = plan.allocation_for("a").unwrap();
        assert_eq!(a.allocated, 800.0);
        assert_eq!(a.residual, 200.0);
        // 200 * 24 / 100 / 12
        assert_eq!(a.projected_interest, 4.0);
        assert_eq!(a.interest_avoided, 16.0);

        let b = plan.allocation_for("b").unwrap();
        assert_eq!(b.allocated, 0.0);
        assert_eq!(b.residual, 500.0);
        assert_eq!(b.projected_interest, 0.0);

        assert_eq!(plan.total_allocated, 800.0);
        assert_eq!(plan.surplus, 0.0);
    }

    #[test]
    fn test_zero_apr_goes_last_even_if_listed_first() {
        let cards = vec![
            card("free", 300.0, 0.0),
            card("mid", 400.0, 18.0),
            card("high", 200.0, 29.9),
        ];
        let plan = optimize(&cards, 650.0);
        let order: Vec<&str> = plan.allocations.iter().map(|a| a.card_id.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "free"]);
        assert_eq!(plan.allocation_for("high").unwrap().allocated, 200.0);
        assert_eq!(plan.allocation_for("mid").unwrap().allocated, 400.0);
        assert_eq!(plan.allocation_for("free").unwrap().allocated, 50.0);
    }

    #[test]
    fn test_budget_covers_everything() {
        let cards = vec![card("a", 1000.0, 24.0), card("b", 500.0, 0.0)];
        let plan = optimize(&cards, 2000.0);
        assert!(plan.allocations.iter().all(|a| a.residual == 0.0));
        assert_eq!(plan.total_allocated, 1500.0);
        assert_eq!(plan.surplus, 500.0);
        assert_eq!(plan.total_projected_interest, 0.0);
    }

    #[test]
    fn test_non_positive_budget() {
        let cards = vec![card("a", 1200.0, 24.0)];
        for budget in [0.0, -50.0, f64::NAN] {
            let plan = optimize(&cards, budget);
            let a = plan.allocation_for("a").unwrap();
            assert_eq!(a.allocated, 0.0);
            assert_eq!(a.residual, 1200.0);
            assert_eq!(a.projected_interest, 24.0);
            assert_eq!(plan.total_allocated, 0.0);
            assert_eq!(plan.surplus, 0.0);
        }
    }

    #[test]
    fn test_empty_cards() {
        let plan = optimize(&[], 500.0);
        assert!(plan.allocations.is_empty());
        assert_eq!(plan.surplus, 500.0);
    }

    #[test]
    fn test_allocations_never_exceed_budget() {
        let cards = vec![card("a", 0.29, 20.0), card("b", 0.29, 10.0)];
        let plan = optimize(&cards, 0.3);
        let sum: f64 = plan.allocations.iter().map(|a| a.allocated).sum();
        assert!(sum <= 0.3 + 1e-9);
        assert_eq!(plan.allocation_for("a").unwrap().allocated, 0.29);
        assert_eq!(plan.allocation_for("b").unwrap().allocated, 0.01);
    }
}
