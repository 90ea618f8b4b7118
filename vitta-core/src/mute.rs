//! Global reminder mute. Muting only suppresses delivery; plans are still
//! computed and stored.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::reminders::Reminder;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MuteState {
    #[default]
    Active,
    MutedUntil {
        until: DateTime<Utc>,
    },
    MutedIndefinitely,
}

impl MuteState {
    /// `Some(days)` mutes until `now + days`; `None` mutes until `unmute`.
    pub fn mute(now: DateTime<Utc>, duration_days: Option<i64>) -> Result<Self, ValidationError> {
        match duration_days {
            None => Ok(MuteState::MutedIndefinitely),
            Some(days) if days > 0 => {
                let until = Duration::try_days(days)
                    .and_then(|d| now.checked_add_signed(d))
                    .ok_or_else(|| {
                        ValidationError::single("duration_days", "mute duration is too long")
                    })?;
                Ok(MuteState::MutedUntil { until })
            }
            Some(_) => Err(ValidationError::single(
                "duration_days",
                "mute duration must be a positive number of days",
            )),
        }
    }

    pub fn unmute() -> Self {
        MuteState::Active
    }

    pub fn is_muted(&self, now: DateTime<Utc>) -> bool {
        match self {
            MuteState::Active => false,
            MuteState::MutedUntil { until } => now < *until,
            MuteState::MutedIndefinitely => true,
        }
    }

    pub fn muted_until(&self) -> Option<DateTime<Utc>> {
        match self {
            MuteState::MutedUntil { until } => Some(*until),
            _ => None,
        }
    }

    /// Reminders that should go out now, worded for `today`. A slot whose day
    /// has come is only sent while its due date (or follow-up day) has not
    /// passed, and a later slot for the same due date supersedes earlier
    /// ones, so a backlog after a missed run or an expired mute collapses to
    /// one message per card. Always empty while muted.
    pub fn deliverable(
        &self,
        reminders: &[Reminder],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Vec<Reminder> {
        if self.is_muted(now) {
            return Vec::new();
        }
        let fired: Vec<&Reminder> = reminders
            .iter()
            .filter(|r| r.target_date <= today && today <= r.due_date.max(r.target_date))
            .collect();

        let mut latest: HashMap<(&str, NaiveDate), NaiveDate> = HashMap::new();
        for r in &fired {
            let slot = latest.entry((r.card_id.as_str(), r.due_date)).or_insert(r.target_date);
            *slot = (*slot).max(r.target_date);
        }

        fired
            .into_iter()
            .filter(|r| latest.get(&(r.card_id.as_str(), r.due_date)) == Some(&r.target_date))
            .map(|r| r.as_of(today))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, CardNetwork};
    use crate::reminders::{ReminderPolicy, Urgency, generate_baseline_reminder_plan};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_timed_mute_expires() {
        let state = MuteState::mute(now(), Some(30)).unwrap();
        assert!(state.is_muted(now()));
        assert!(state.is_muted(now() + Duration::days(29)));
        assert!(!state.is_muted(now() + Duration::days(30)));
        assert_eq!(state.muted_until(), Some(now() + Duration::days(30)));
    }

    #[test]
    fn test_indefinite_until_unmuted() {
        let state = MuteState::mute(now(), None).unwrap();
        assert!(state.is_muted(now() + Duration::days(3650)));
        assert!(!MuteState::unmute().is_muted(now()));
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        assert!(MuteState::mute(now(), Some(0)).is_err());
        assert!(MuteState::mute(now(), Some(-5)).is_err());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&MuteState::MutedIndefinitely).unwrap();
        assert_eq!(json, r#"{"state":"muted_indefinitely"}"#);
        let back: MuteState = serde_json::from_str(r#"{"state":"active"}"#).unwrap();
        assert_eq!(back, MuteState::Active);
    }

    #[test]
    fn test_deliverable_respects_mute() {
        let today = now().date_naive();
        let card = Card::new("c", "Card", CardNetwork::Visa, 1000.0, 100.0, 20.0).with_due_day(4);
        let plan = generate_baseline_reminder_plan(&[card], today, &ReminderPolicy::default());

        // Due Mar 4: the 7-day (Feb 25) and 3-day (Mar 1) slots have come; only
        // the later one goes out.
        let active = MuteState::Active.deliverable(&plan, today, now());
        let leads: Vec<i64> = active.iter().map(|r| r.lead_time_days).collect();
        assert_eq!(leads, vec![-3]);

        let muted = MuteState::mute(now(), Some(7)).unwrap();
        assert!(muted.deliverable(&plan, today, now()).is_empty());
    }

    #[test]
    fn test_late_delivery_is_worded_for_the_delivery_day() {
        // Planned on Feb 20 for a Mar 4 due date; nothing ran until Mar 2.
        let planned = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
        let card = Card::new("c", "Card", CardNetwork::Visa, 1000.0, 100.0, 20.0)
            .with_due_day(4)
            .with_amount_to_pay(35.0);
        let plan = generate_baseline_reminder_plan(&[card], planned, &ReminderPolicy::default());
        let seven_day = plan.iter().find(|r| r.lead_time_days == -7).unwrap();
        assert_eq!(seven_day.body, "Card: $35.00 is due in 7 days (2025-03-04).");

        let today = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
        let out = MuteState::Active.deliverable(&plan, today, at);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].lead_time_days, -3);
        assert_eq!(out[0].days_until_due, 2);
        assert_eq!(out[0].body, "Card: $35.00 is due in 2 days (2025-03-04).");
        assert_eq!(out[0].urgency, Urgency::Soon);
        // Still the planned slot, so dedupe sees the same delivery.
        assert_eq!(out[0].delivery_key(), "c:-3@2025-03-01");
    }

    #[test]
    fn test_backlog_after_mute_expires_collapses() {
        let planned = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let cards = vec![
            Card::new("a", "A", CardNetwork::Visa, 1000.0, 0.0, 20.0).with_due_day(8),
            Card::new("b", "B", CardNetwork::Amex, 1000.0, 0.0, 20.0)
                .with_seq(1)
                .with_due_day(20),
        ];
        let plan = generate_baseline_reminder_plan(&cards, planned, &ReminderPolicy::default());

        let state = MuteState::mute(now(), Some(7)).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();
        assert!(!state.is_muted(at));

        // Card a: 7/3/1/0-day slots all came during the mute; only the due-day one is sent.
        let out = state.deliverable(&plan, today, at);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].card_id, "a");
        assert_eq!(out[0].urgency, Urgency::DueToday);
        assert!(out[0].body.contains("due today"));
    }
}
