//! Card records: the revolving-credit instruments everything else reads.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cycle::BillingCycle;
use crate::error::{Collector, ValidationError};

/// Highest APR (percent) accepted on input.
pub const MAX_APR: f64 = 99.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CardNetwork {
    Visa,
    Mastercard,
    Amex,
    Discover,
}

impl FromStr for CardNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "visa" => Ok(CardNetwork::Visa),
            "mastercard" | "master card" | "mc" => Ok(CardNetwork::Mastercard),
            "amex" | "american express" => Ok(CardNetwork::Amex),
            "discover" => Ok(CardNetwork::Discover),
            other => Err(format!("unknown card network: {other}")),
        }
    }
}

/// Spend categories a reward multiplier can be attached to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpendCategory {
    #[serde(rename = "dining")]
    Dining,
    #[serde(rename = "groceries")]
    Groceries,
    #[serde(rename = "travel")]
    Travel,
    #[serde(rename = "gas")]
    Gas,
    #[serde(rename = "default", alias = "general")]
    Default,
}

impl SpendCategory {
    pub const ALL: [SpendCategory; 5] = [
        SpendCategory::Dining,
        SpendCategory::Groceries,
        SpendCategory::Travel,
        SpendCategory::Gas,
        SpendCategory::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpendCategory::Dining => "dining",
            SpendCategory::Groceries => "groceries",
            SpendCategory::Travel => "travel",
            SpendCategory::Gas => "gas",
            SpendCategory::Default => "default",
        }
    }
}

impl fmt::Display for SpendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SpendCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dining" => Ok(SpendCategory::Dining),
            "groceries" => Ok(SpendCategory::Groceries),
            "travel" => Ok(SpendCategory::Travel),
            "gas" => Ok(SpendCategory::Gas),
            "default" | "general" => Ok(SpendCategory::Default),
            other => Err(format!(
                "unknown category '{other}' (expected dining, groceries, travel, gas or default)"
            )),
        }
    }
}

/// Category -> multiplier (percent cashback or points per dollar).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RewardStructure(BTreeMap<SpendCategory, f64>);

impl RewardStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: SpendCategory, multiplier: f64) -> Self {
        self.0.insert(category, multiplier);
        self
    }

    pub fn set(&mut self, category: SpendCategory, multiplier: f64) {
        self.0.insert(category, multiplier);
    }

    pub fn get(&self, category: SpendCategory) -> Option<f64> {
        self.0.get(&category).copied()
    }

    /// Multiplier for `category`, falling back to `default`, then 1.
    pub fn multiplier_for(&self, category: SpendCategory) -> f64 {
        self.get(category)
            .or_else(|| self.get(SpendCategory::Default))
            .unwrap_or(1.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpendCategory, f64)> + '_ {
        self.0.iter().map(|(c, m)| (*c, *m))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A revolving-credit card owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    /// Stable identifier
    pub id: String,
    /// Creation order; ties in recommendations resolve to the older card
    #[serde(default)]
    pub created_seq: u64,
    pub card_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    pub card_network: CardNetwork,
    pub credit_limit: f64,
    #[serde(default)]
    pub current_balance: f64,
    /// Percent, 0-99
    pub apr: f64,
    /// Minimum / next payment amount
    #[serde(default)]
    pub amount_to_pay: f64,
    #[serde(default)]
    pub statement_close_day: Option<u32>,
    #[serde(default)]
    pub payment_due_day: Option<u32>,
    #[serde(default)]
    pub grace_period_days: Option<i64>,
    #[serde(default)]
    pub reward_structure: RewardStructure,
}

impl Card {
    pub fn new(
        id: impl Into<String>,
        card_name: impl Into<String>,
        card_network: CardNetwork,
        credit_limit: f64,
        current_balance: f64,
        apr: f64,
    ) -> Self {
        Self {
            id: id.into(),
            created_seq: 0,
            card_name: card_name.into(),
            nickname: None,
            issuer: None,
            card_network,
            credit_limit,
            current_balance,
            apr,
            amount_to_pay: 0.0,
            statement_close_day: None,
            payment_due_day: None,
            grace_period_days: None,
            reward_structure: RewardStructure::new(),
        }
    }

    pub fn with_seq(mut self, seq: u64) -> Self {
        self.created_seq = seq;
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_due_day(mut self, day: u32) -> Self {
        self.payment_due_day = Some(day);
        self
    }

    pub fn with_cycle(mut self, cycle: BillingCycle) -> Self {
        self.statement_close_day = Some(cycle.statement_close_day);
        self.payment_due_day = Some(cycle.payment_due_day);
        self.grace_period_days = Some(cycle.grace_period_days);
        self
    }

    pub fn with_amount_to_pay(mut self, amount: f64) -> Self {
        self.amount_to_pay = amount;
        self
    }

    pub fn with_reward(mut self, category: SpendCategory, multiplier: f64) -> Self {
        self.reward_structure.set(category, multiplier);
        self
    }

    /// Nickname if the user gave one, else the card name.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.card_name)
    }

    /// Never negative, even when the balance is over the limit.
    pub fn available_credit(&self) -> f64 {
        (self.credit_limit - self.current_balance).max(0.0)
    }

    /// Record a new balance, re-checking it against the limit.
    pub fn apply_balance(&mut self, new_balance: f64) -> Result<(), ValidationError> {
        check_balance(new_balance, self.credit_limit)?;
        self.current_balance = new_balance;
        Ok(())
    }

    /// Record a new limit, re-checking the current balance against it.
    pub fn apply_limit(&mut self, new_limit: f64) -> Result<(), ValidationError> {
        if !new_limit.is_finite() || new_limit < 0.0 {
            return Err(ValidationError::single(
                "credit_limit",
                "credit limit must be zero or more",
            ));
        }
        check_balance(self.current_balance, new_limit)?;
        self.credit_limit = new_limit;
        Ok(())
    }
}

fn check_balance(balance: f64, limit: f64) -> Result<(), ValidationError> {
    if !balance.is_finite() || balance < 0.0 {
        return Err(ValidationError::single(
            "current_balance",
            "balance must be zero or more",
        ));
    }
    if balance > limit {
        return Err(ValidationError::single(
            "current_balance",
            format!("balance ${balance:.2} exceeds the credit limit ${limit:.2}"),
        ));
    }
    Ok(())
}

/// Raw card form input. Every field is optional so that validation can report
/// everything that is missing in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardDraft {
    pub card_name: Option<String>,
    pub nickname: Option<String>,
    pub issuer: Option<String>,
    pub card_network: Option<CardNetwork>,
    pub credit_limit: Option<f64>,
    pub current_balance: Option<f64>,
    pub apr: Option<f64>,
    pub amount_to_pay: Option<f64>,
    pub statement_close_day: Option<u32>,
    pub payment_due_day: Option<u32>,
    /// Observed statement close date (YYYY-MM-DD)
    pub statement_close_date: Option<String>,
    /// Observed payment due date (YYYY-MM-DD)
    pub payment_due_date: Option<String>,
    #[serde(default)]
    pub reward_structure: RewardStructure,
}

impl CardDraft {
    /// Validate and build the card. All field errors are reported together.
    pub fn validate(
        self,
        id: impl Into<String>,
        created_seq: u64,
    ) -> Result<Card, ValidationError> {
        let mut errors = Collector::new();

        let card_name = self
            .card_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        if card_name.is_none() {
            errors.push("card_name", "card name is required");
        }
        if self.card_network.is_none() {
            errors.push("card_network", "card network is required");
        }

        match self.credit_limit {
            None => errors.push("credit_limit", "credit limit is required"),
            Some(l) if !l.is_finite() || l < 0.0 => {
                errors.push("credit_limit", "credit limit must be zero or more")
            }
            _ => {}
        }

        match self.apr {
            None => errors.push("apr", "APR is required"),
            Some(a) if !a.is_finite() || !(0.0..=MAX_APR).contains(&a) => {
                errors.push("apr", format!("APR must be between 0 and {MAX_APR}"))
            }
            _ => {}
        }

        let balance = self.current_balance.unwrap_or(0.0);
        if let Some(limit) = self.credit_limit.filter(|l| l.is_finite() && *l >= 0.0) {
            if let Err(e) = check_balance(balance, limit) {
                errors.extend(e);
            }
        } else if !balance.is_finite() || balance < 0.0 {
            errors.push("current_balance", "balance must be zero or more");
        }

        let amount_to_pay = self.amount_to_pay.unwrap_or(0.0);
        if !amount_to_pay.is_finite() || amount_to_pay < 0.0 {
            errors.push("amount_to_pay", "payment amount must be zero or more");
        }

        for (field, day) in [
            ("statement_close_day", self.statement_close_day),
            ("payment_due_day", self.payment_due_day),
        ] {
            if let Some(d) = day {
                if !(1..=31).contains(&d) {
                    errors.push(field, "day of month must be between 1 and 31");
                }
            }
        }

        for (category, multiplier) in self.reward_structure.iter() {
            if !multiplier.is_finite() || multiplier < 1.0 {
                errors.push(
                    format!("reward_structure.{category}"),
                    "reward multiplier must be at least 1",
                );
            }
        }

        // Observed dates win over bare day numbers: they also give the grace period.
        let mut cycle = None;
        if self.statement_close_date.is_some() || self.payment_due_date.is_some() {
            match BillingCycle::from_observed_dates(
                self.statement_close_date.as_deref(),
                self.payment_due_date.as_deref(),
            ) {
                Ok(c) => cycle = Some(c),
                Err(e) => errors.extend(e),
            }
        }

        errors.finish()?;

        let (Some(card_name), Some(card_network), Some(credit_limit), Some(apr)) =
            (card_name, self.card_network, self.credit_limit, self.apr)
        else {
            // Every missing field was reported above.
            return Err(ValidationError::single("card", "incomplete card"));
        };

        let mut card = Card::new(id, card_name, card_network, credit_limit, balance, apr)
            .with_seq(created_seq)
            .with_amount_to_pay(amount_to_pay);
        card.nickname = self.nickname.filter(|n| !n.trim().is_empty());
        card.issuer = self.issuer.filter(|i| !i.trim().is_empty());
        card.reward_structure = self.reward_structure;

        match cycle {
            Some(c) => card = card.with_cycle(c),
            None => {
                card.statement_close_day = self.statement_close_day;
                card.payment_due_day = self.payment_due_day;
            }
        }

        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> CardDraft {
        CardDraft {
            card_name: Some("Sapphire Preferred".into()),
            card_network: Some(CardNetwork::Visa),
            credit_limit: Some(5000.0),
            current_balance: Some(1200.0),
            apr: Some(21.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_multiplier_fallback() {
        let rewards = RewardStructure::new()
            .with(SpendCategory::Dining, 3.0)
            .with(SpendCategory::Default, 1.5);
        assert_eq!(rewards.multiplier_for(SpendCategory::Dining), 3.0);
        assert_eq!(rewards.multiplier_for(SpendCategory::Gas), 1.5);
        assert_eq!(RewardStructure::new().multiplier_for(SpendCategory::Gas), 1.0);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Dining".parse::<SpendCategory>(), Ok(SpendCategory::Dining));
        assert_eq!("general".parse::<SpendCategory>(), Ok(SpendCategory::Default));
        assert!("shoes".parse::<SpendCategory>().is_err());
    }

    #[test]
    fn test_reward_structure_serializes_as_map() {
        let rewards = RewardStructure::new().with(SpendCategory::Groceries, 4.0);
        let json = serde_json::to_string(&rewards).unwrap();
        assert_eq!(json, r#"{"groceries":4.0}"#);
    }

    #[test]
    fn test_available_credit_never_negative() {
        let card = Card::new("c1", "Over", CardNetwork::Visa, 1000.0, 1200.0, 20.0);
        assert_eq!(card.available_credit(), 0.0);
    }

    #[test]
    fn test_display_name_prefers_nickname() {
        let card = Card::new("c1", "Freedom Unlimited", CardNetwork::Visa, 1000.0, 0.0, 20.0);
        assert_eq!(card.display_name(), "Freedom Unlimited");
        assert_eq!(card.with_nickname("Daily").display_name(), "Daily");
    }

    #[test]
    fn test_valid_draft_builds_card() {
        let card = draft().validate("c1", 3).unwrap();
        assert_eq!(card.card_name, "Sapphire Preferred");
        assert_eq!(card.created_seq, 3);
        assert_eq!(card.current_balance, 1200.0);
        assert_eq!(card.grace_period_days, None);
    }

    #[test]
    fn test_missing_required_fields_reported_together() {
        let err = CardDraft::default().validate("c1", 0).unwrap_err();
        assert!(err.has_field("card_name"));
        assert!(err.has_field("card_network"));
        assert!(err.has_field("credit_limit"));
        assert!(err.has_field("apr"));
    }

    #[test]
    fn test_balance_over_limit_rejected() {
        let mut d = draft();
        d.current_balance = Some(6000.0);
        let err = d.validate("c1", 0).unwrap_err();
        assert!(err.has_field("current_balance"));
    }

    #[test]
    fn test_observed_dates_fill_cycle() {
        let mut d = draft();
        d.statement_close_date = Some("2025-01-15".into());
        d.payment_due_date = Some("2025-02-10".into());
        let card = d.validate("c1", 0).unwrap();
        assert_eq!(card.statement_close_day, Some(15));
        assert_eq!(card.payment_due_day, Some(10));
        assert_eq!(card.grace_period_days, Some(26));
    }

    #[test]
    fn test_single_cycle_date_is_an_error() {
        let mut d = draft();
        d.payment_due_date = Some("2025-02-10".into());
        let err = d.validate("c1", 0).unwrap_err();
        assert!(err.has_field("statement_close_date"));
    }

    #[test]
    fn test_bad_multiplier_and_day() {
        let mut d = draft();
        d.payment_due_day = Some(32);
        d.reward_structure.set(SpendCategory::Gas, 0.5);
        let err = d.validate("c1", 0).unwrap_err();
        assert!(err.has_field("payment_due_day"));
        assert!(err.has_field("reward_structure.gas"));
    }

    #[test]
    fn test_apply_balance_and_limit() {
        let mut card = Card::new("c1", "Card", CardNetwork::Amex, 1000.0, 100.0, 20.0);
        assert!(card.apply_balance(1500.0).is_err());
        assert_eq!(card.current_balance, 100.0);
        card.apply_balance(900.0).unwrap();
        assert!(card.apply_limit(800.0).is_err());
        card.apply_limit(2000.0).unwrap();
        assert_eq!(card.credit_limit, 2000.0);
    }
}
