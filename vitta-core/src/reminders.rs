//! Reminder policy + projection of card due dates into reminder events.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::money::{from_cents, to_cents};

/// Lead times, in days before the due date, used when none are configured.
pub const DEFAULT_LEAD_TIMES: [i64; 4] = [7, 3, 1, 0];
/// How far ahead `summarize_reminder_plan` counts reminders.
pub const DEFAULT_HORIZON_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderPolicy {
    /// Days before the due date. Negative values schedule follow-ups after it.
    pub lead_times: Vec<i64>,
    pub horizon_days: i64,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            lead_times: DEFAULT_LEAD_TIMES.to_vec(),
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    Calm,
    HeadsUp,
    Soon,
    DueToday,
    Overdue,
}

impl Urgency {
    /// Escalates as the reminder gets closer to the due date.
    pub fn for_days_before_due(days_before: i64) -> Self {
        match days_before {
            d if d >= 7 => Urgency::Calm,
            4..=6 => Urgency::HeadsUp,
            1..=3 => Urgency::Soon,
            0 => Urgency::DueToday,
            _ => Urgency::Overdue,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Urgency::Calm => "🗓️",
            Urgency::HeadsUp => "🔔",
            Urgency::Soon => "⏰",
            Urgency::DueToday => "🚨",
            Urgency::Overdue => "❗",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reminder {
    pub card_id: String,
    pub card_label: String,
    pub due_date: NaiveDate,
    /// Day the reminder fires
    pub target_date: NaiveDate,
    /// Negative = before the due date, 0 = on it, positive = follow-up after
    pub lead_time_days: i64,
    /// Days from the planning date to the due date; see [`Reminder::as_of`]
    pub days_until_due: i64,
    pub urgency: Urgency,
    pub title: String,
    pub body: String,
    /// `card_id:lead_time_days`, stable across regenerations
    pub dedupe_key: String,
    /// Payment amount quoted in the body; 0 when the card has none
    #[serde(default)]
    pub amount_due_cents: i64,
}

impl Reminder {
    pub fn days_before_due(&self) -> i64 {
        -self.lead_time_days
    }

    /// Fires today or later, and no later than `today + horizon_days`.
    pub fn is_upcoming(&self, today: NaiveDate, horizon_days: i64) -> bool {
        let horizon_end =
            Duration::try_days(horizon_days).and_then(|h| today.checked_add_signed(h));
        self.target_date >= today && horizon_end.is_none_or(|end| self.target_date <= end)
    }

    /// The same reminder as it reads on `today`: day count, urgency and
    /// wording follow the actual date rather than the planning date.
    /// Keys and dates are unchanged.
    pub fn as_of(&self, today: NaiveDate) -> Reminder {
        let days_until_due = (self.due_date - today).num_days();
        let (urgency, title, body) =
            render(&self.card_label, self.amount_due_cents, self.due_date, days_until_due);
        Reminder {
            days_until_due,
            urgency,
            title,
            body,
            ..self.clone()
        }
    }

    /// Identifies one concrete delivery: the same slot in next month's cycle
    /// gets a new key.
    pub fn delivery_key(&self) -> String {
        format!("{}@{}", self.dedupe_key, self.target_date)
    }
}

pub fn dedupe_key(card_id: &str, lead_time_days: i64) -> String {
    format!("{card_id}:{lead_time_days}")
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.pred_opt()?.day())
}

fn occurrence_in_month(year: i32, month: u32, due_day: u32) -> Option<NaiveDate> {
    let day = due_day.min(last_day_of_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The cycle's due date as seen from `today`: this month's occurrence unless
/// it has already passed, in which case next month's. Days beyond the end of
/// a short month land on its last day.
pub fn next_due_date(today: NaiveDate, payment_due_day: u32) -> Option<NaiveDate> {
    if !(1..=31).contains(&payment_due_day) {
        return None;
    }
    let this_month = occurrence_in_month(today.year(), today.month(), payment_due_day)?;
    if this_month >= today {
        return Some(this_month);
    }
    let next = today.with_day(1)?.checked_add_months(Months::new(1))?;
    occurrence_in_month(next.year(), next.month(), payment_due_day)
}

fn render(
    label: &str,
    amount_due_cents: i64,
    due_date: NaiveDate,
    days_until_due: i64,
) -> (Urgency, String, String) {
    let urgency = Urgency::for_days_before_due(days_until_due);
    let when = match days_until_due {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        d if d > 1 => format!("in {d} days"),
        d => format!("{} day(s) ago", -d),
    };
    let title = format!("{} {label} payment due {}", urgency.emoji(), due_date.format("%b %-d"));
    let body = if amount_due_cents > 0 {
        let amount = from_cents(amount_due_cents);
        format!("{label}: ${amount:.2} is due {when} ({due_date}).")
    } else {
        format!("{label}: payment is due {when} ({due_date}).")
    };
    (urgency, title, body)
}

fn build_reminder(
    card: &Card,
    due_date: NaiveDate,
    days_before: i64,
    today: NaiveDate,
) -> Option<Reminder> {
    let lead_time_days = days_before.checked_neg()?;
    let target_date = due_date.checked_add_signed(Duration::try_days(lead_time_days)?)?;
    let label = card.display_name().to_string();
    let amount_due_cents = to_cents(card.amount_to_pay.max(0.0));
    // Worded for the day it fires.
    let (urgency, title, body) = render(&label, amount_due_cents, due_date, days_before);

    Some(Reminder {
        card_id: card.id.clone(),
        card_label: label,
        due_date,
        target_date,
        lead_time_days,
        days_until_due: (due_date - today).num_days(),
        urgency,
        title,
        body,
        dedupe_key: dedupe_key(&card.id, lead_time_days),
        amount_due_cents,
    })
}

/// Deterministically expand every card with a due day into one reminder per
/// lead time. The same cards and `today` always yield the same list.
pub fn generate_baseline_reminder_plan(
    cards: &[Card],
    today: NaiveDate,
    policy: &ReminderPolicy,
) -> Vec<Reminder> {
    let lead_times: BTreeSet<i64> = policy.lead_times.iter().copied().collect();

    let mut ordered: Vec<&Card> = cards.iter().collect();
    ordered.sort_by(|a, b| a.created_seq.cmp(&b.created_seq).then_with(|| a.id.cmp(&b.id)));

    let mut out = Vec::new();
    for card in ordered {
        let Some(due_day) = card.payment_due_day else {
            continue;
        };
        let Some(due_date) = next_due_date(today, due_day) else {
            tracing::debug!(card = %card.id, due_day, "skipping card with invalid due day");
            continue;
        };
        // Largest lead first, so each card's reminders read in firing order.
        for days_before in lead_times.iter().rev() {
            match build_reminder(card, due_date, *days_before, today) {
                Some(r) => out.push(r),
                None => {
                    tracing::debug!(card = %card.id, days_before, "lead time out of date range")
                }
            }
        }
    }

    // Stable: ties keep card creation order, then firing order.
    out.sort_by_key(|r| r.target_date);
    tracing::debug!(reminders = out.len(), %today, "generated reminder plan");
    out
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderSummary {
    pub total_upcoming: usize,
    pub next_reminder: Option<Reminder>,
}

/// What is due soonest, and how many reminders fire within the horizon.
pub fn summarize_reminder_plan(
    reminders: &[Reminder],
    today: NaiveDate,
    horizon_days: i64,
) -> ReminderSummary {
    let upcoming: Vec<&Reminder> = reminders
        .iter()
        .filter(|r| r.is_upcoming(today, horizon_days))
        .collect();

    // Day counts are taken from `today`, not from when the plan was built.
    let next_reminder = upcoming
        .iter()
        .map(|r| ((r.due_date - today).num_days(), *r))
        .filter(|(days, _)| *days >= 0)
        .min_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.target_date.cmp(&b.target_date)))
        .map(|(_, r)| r.as_of(today));

    ReminderSummary {
        total_upcoming: upcoming.len(),
        next_reminder,
    }
}
