//! Built-in catalog of common cards for catalog-assisted entry.
//!
//! Picking an entry pre-fills the issuer, network, a typical APR and the
//! reward structure; the user still supplies limit, balance and cycle dates.

use crate::card::SpendCategory::{Default as General, Dining, Gas, Groceries, Travel};
use crate::card::{CardDraft, CardNetwork, RewardStructure, SpendCategory};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub issuer: &'static str,
    pub network: CardNetwork,
    pub typical_apr: f64,
    pub rewards: &'static [(SpendCategory, f64)],
}

impl CatalogEntry {
    pub fn reward_structure(&self) -> RewardStructure {
        self.rewards
            .iter()
            .fold(RewardStructure::new(), |acc, (c, m)| acc.with(*c, *m))
    }

    /// A draft with everything the catalog knows filled in.
    pub fn draft(&self) -> CardDraft {
        CardDraft {
            card_name: Some(self.name.to_string()),
            issuer: Some(self.issuer.to_string()),
            card_network: Some(self.network),
            apr: Some(self.typical_apr),
            reward_structure: self.reward_structure(),
            ..Default::default()
        }
    }
}

static CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "Chase Sapphire Preferred",
        issuer: "Chase",
        network: CardNetwork::Visa,
        typical_apr: 21.49,
        rewards: &[(Dining, 3.0), (Travel, 2.0), (General, 1.0)],
    },
    CatalogEntry {
        name: "Chase Freedom Unlimited",
        issuer: "Chase",
        network: CardNetwork::Visa,
        typical_apr: 20.49,
        rewards: &[(Dining, 3.0), (Travel, 5.0), (General, 1.5)],
    },
    CatalogEntry {
        name: "American Express Gold",
        issuer: "American Express",
        network: CardNetwork::Amex,
        typical_apr: 24.49,
        rewards: &[(Dining, 4.0), (Groceries, 4.0), (Travel, 3.0), (General, 1.0)],
    },
    CatalogEntry {
        name: "Blue Cash Preferred",
        issuer: "American Express",
        network: CardNetwork::Amex,
        typical_apr: 19.99,
        rewards: &[(Groceries, 6.0), (Gas, 3.0), (General, 1.0)],
    },
    CatalogEntry {
        name: "Capital One Savor",
        issuer: "Capital One",
        network: CardNetwork::Mastercard,
        typical_apr: 19.74,
        rewards: &[(Dining, 3.0), (Groceries, 3.0), (General, 1.0)],
    },
    CatalogEntry {
        name: "Citi Double Cash",
        issuer: "Citi",
        network: CardNetwork::Mastercard,
        typical_apr: 18.74,
        rewards: &[(General, 2.0)],
    },
    CatalogEntry {
        name: "Discover it Cash Back",
        issuer: "Discover",
        network: CardNetwork::Discover,
        typical_apr: 17.24,
        rewards: &[(Gas, 5.0), (General, 1.0)],
    },
    CatalogEntry {
        name: "Wells Fargo Autograph",
        issuer: "Wells Fargo",
        network: CardNetwork::Visa,
        typical_apr: 20.24,
        rewards: &[(Dining, 3.0), (Travel, 3.0), (Gas, 3.0), (General, 1.0)],
    },
];

pub fn entries() -> &'static [CatalogEntry] {
    CATALOG
}

/// Case-insensitive, whitespace-tolerant lookup by card name.
pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    let wanted = normalize(name);
    CATALOG.iter().find(|e| normalize(e.name) == wanted)
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
