//! Best card to use for a spending category.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::card::{Card, SpendCategory};

/// Multiplier the card earns on `category` (falls back to `default`, then 1).
pub fn effective_multiplier(card: &Card, category: SpendCategory) -> f64 {
    card.reward_structure.multiplier_for(category)
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCard<'a> {
    pub card: &'a Card,
    pub multiplier: f64,
}

/// Cards ordered best-first for `category`.
///
/// Ties on multiplier go to the card with more available credit, then the
/// lower APR, then the older card. The order does not depend on the order of
/// `cards`.
pub fn rank_cards(cards: &[Card], category: SpendCategory) -> Vec<RankedCard<'_>> {
    let mut ranked: Vec<RankedCard<'_>> = cards
        .iter()
        .map(|card| RankedCard {
            card,
            multiplier: effective_multiplier(card, category),
        })
        .collect();
    ranked.sort_by(compare);
    ranked
}

fn compare(a: &RankedCard<'_>, b: &RankedCard<'_>) -> Ordering {
    b.multiplier
        .total_cmp(&a.multiplier)
        .then_with(|| b.card.available_credit().total_cmp(&a.card.available_credit()))
        .then_with(|| a.card.apr.total_cmp(&b.card.apr))
        .then_with(|| a.card.created_seq.cmp(&b.card.created_seq))
        .then_with(|| a.card.id.cmp(&b.card.id))
}

/// `None` when there are no cards.
pub fn select_best_card(cards: &[Card], category: SpendCategory) -> Option<&Card> {
    let best = rank_cards(cards, category).into_iter().next()?;
    tracing::debug!(
        category = %category,
        card = %best.card.id,
        multiplier = best.multiplier,
        "selected best card"
    );
    Some(best.card)
}

/// Recommendation for every category; empty when there are no cards.
pub fn best_card_by_category(cards: &[Card]) -> BTreeMap<SpendCategory, &Card> {
    SpendCategory::ALL
        .iter()
        .filter_map(|c| select_best_card(cards, *c).map(|card| (*c, card)))
        .collect()
}
