//! Collaborator seams: where cards come from and where reminders go.
//!
//! The core never does I/O itself. Callers plug in a source and a store; the
//! in-memory versions here back tests and embedded use.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::card::Card;
use crate::mute::MuteState;
use crate::reminders::{Reminder, ReminderPolicy, generate_baseline_reminder_plan};

pub trait CardSource {
    /// Cards in creation order.
    fn user_cards(&self, user_id: &str) -> Result<Vec<Card>>;
}

pub trait ReminderStore {
    /// Replace the user's reminders with `reminders`, keyed by card + lead
    /// time. Must be all-or-nothing so that a retry after a failure is safe.
    fn upsert_reminders(&mut self, user_id: &str, reminders: &[Reminder]) -> Result<()>;

    fn list_reminders(&self, user_id: &str) -> Result<Vec<Reminder>>;

    fn mute_state(&self, user_id: &str) -> Result<MuteState>;

    fn set_mute_state(&mut self, user_id: &str, state: MuteState) -> Result<()>;
}

/// Fetch cards, rebuild the plan and store it. Regeneration is total, so
/// calling this again after a racing card edit is all that is needed.
pub fn refresh_reminders<S, R>(
    source: &S,
    store: &mut R,
    user_id: &str,
    today: NaiveDate,
    policy: &ReminderPolicy,
) -> Result<Vec<Reminder>>
where
    S: CardSource + ?Sized,
    R: ReminderStore + ?Sized,
{
    let cards = source
        .user_cards(user_id)
        .with_context(|| format!("loading cards for {user_id}"))?;
    let plan = generate_baseline_reminder_plan(&cards, today, policy);
    store
        .upsert_reminders(user_id, &plan)
        .with_context(|| format!("storing reminders for {user_id}"))?;
    Ok(plan)
}

/// `Some(days)` mutes for that many days, `None` mutes until `unmute_reminders`.
pub fn mute_reminders<R: ReminderStore + ?Sized>(
    store: &mut R,
    user_id: &str,
    now: DateTime<Utc>,
    duration_days: Option<i64>,
) -> Result<MuteState> {
    let state = MuteState::mute(now, duration_days)?;
    store.set_mute_state(user_id, state)?;
    Ok(state)
}

pub fn unmute_reminders<R: ReminderStore + ?Sized>(store: &mut R, user_id: &str) -> Result<()> {
    store.set_mute_state(user_id, MuteState::unmute())
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryCardSource {
    cards: HashMap<String, Vec<Card>>,
}

impl InMemoryCardSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(mut self, user_id: impl Into<String>, cards: Vec<Card>) -> Self {
        self.cards.insert(user_id.into(), cards);
        self
    }

    pub fn set_cards(&mut self, user_id: impl Into<String>, cards: Vec<Card>) {
        self.cards.insert(user_id.into(), cards);
    }
}

impl CardSource for InMemoryCardSource {
    fn user_cards(&self, user_id: &str) -> Result<Vec<Card>> {
        Ok(self.cards.get(user_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryReminderStore {
    reminders: HashMap<String, BTreeMap<String, Reminder>>,
    mutes: HashMap<String, MuteState>,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReminderStore for InMemoryReminderStore {
    fn upsert_reminders(&mut self, user_id: &str, reminders: &[Reminder]) -> Result<()> {
        let keyed: BTreeMap<String, Reminder> = reminders
            .iter()
            .map(|r| (r.dedupe_key.clone(), r.clone()))
            .collect();
        self.reminders.insert(user_id.to_string(), keyed);
        Ok(())
    }

    fn list_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let mut out: Vec<Reminder> = self
            .reminders
            .get(user_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        out.sort_by(|a, b| {
            a.target_date
                .cmp(&b.target_date)
                .then_with(|| a.dedupe_key.cmp(&b.dedupe_key))
        });
        Ok(out)
    }

    fn mute_state(&self, user_id: &str) -> Result<MuteState> {
        Ok(self.mutes.get(user_id).copied().unwrap_or_default())
    }

    fn set_mute_state(&mut self, user_id: &str, state: MuteState) -> Result<()> {
        self.mutes.insert(user_id.to_string(), state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardNetwork;
    use chrono::TimeZone;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn cards() -> Vec<Card> {
        vec![
            Card::new("a", "A", CardNetwork::Visa, 1000.0, 100.0, 20.0).with_due_day(10),
            Card::new("b", "B", CardNetwork::Amex, 1000.0, 100.0, 20.0)
                .with_seq(1)
                .with_due_day(20),
        ]
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let source = InMemoryCardSource::new().with_cards("u1", cards());
        let mut store = InMemoryReminderStore::new();
        let policy = ReminderPolicy::default();

        refresh_reminders(&source, &mut store, "u1", today(), &policy).unwrap();
        let first = store.list_reminders("u1").unwrap();
        refresh_reminders(&source, &mut store, "u1", today(), &policy).unwrap();
        let second = store.list_reminders("u1").unwrap();

        assert_eq!(first.len(), 8);
        assert_eq!(first, second);
    }

    #[test]
    fn test_removed_card_drops_its_reminders() {
        let mut source = InMemoryCardSource::new().with_cards("u1", cards());
        let mut store = InMemoryReminderStore::new();
        let policy = ReminderPolicy::default();
        refresh_reminders(&source, &mut store, "u1", today(), &policy).unwrap();

        source.set_cards("u1", cards().into_iter().take(1).collect());
        refresh_reminders(&source, &mut store, "u1", today(), &policy).unwrap();

        let stored = store.list_reminders("u1").unwrap();
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(|r| r.card_id == "a"));
    }

    #[test]
    fn test_unknown_user_is_empty() {
        let store = InMemoryReminderStore::new();
        assert!(store.list_reminders("nobody").unwrap().is_empty());
        assert_eq!(store.mute_state("nobody").unwrap(), MuteState::Active);
    }

    #[test]
    fn test_mute_and_unmute_are_separate_operations() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut store = InMemoryReminderStore::new();

        mute_reminders(&mut store, "u1", now, None).unwrap();
        assert_eq!(store.mute_state("u1").unwrap(), MuteState::MutedIndefinitely);

        unmute_reminders(&mut store, "u1").unwrap();
        assert!(!store.mute_state("u1").unwrap().is_muted(now));

        assert!(mute_reminders(&mut store, "u1", now, Some(0)).is_err());
        assert_eq!(store.mute_state("u1").unwrap(), MuteState::Active);
    }
}
