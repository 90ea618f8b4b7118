//! Statement cycle: turn two observed dates into a recurring monthly pattern.
//!
//! Dates are handled as literal (year, month, day) triples. Nothing here goes
//! through a timestamp, so a date can never shift by a day across a timezone
//! boundary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::{Collector, ValidationError};

/// Shortest grace period accepted.
pub const MIN_GRACE_DAYS: i64 = 15;
/// Longest grace period accepted.
pub const MAX_GRACE_DAYS: i64 = 35;
/// What most issuers use.
pub const TYPICAL_GRACE_DAYS: RangeInclusive<i64> = 21..=27;

/// Literal calendar components of a `YYYY-MM-DD` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateComponents {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateComponents {
    /// Split `YYYY-MM-DD` into its parts. Anything after the date (`T...`,
    /// a space and a time) is ignored, not interpreted.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let date_part = raw.split(['T', 't', ' ']).next()?;

        let mut parts = date_part.split('-');
        let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        if y.len() != 4 || m.is_empty() || m.len() > 2 || d.is_empty() || d.len() > 2 {
            return None;
        }
        if ![y, m, d].iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) {
            return None;
        }

        Some(Self {
            year: y.parse().ok()?,
            month: m.parse().ok()?,
            day: d.parse().ok()?,
        })
    }

    pub fn to_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// Parse a calendar date, reporting problems against `field`.
pub fn parse_calendar_date(field: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
    DateComponents::parse(raw)
        .ok_or_else(|| ValidationError::single(field, format!("'{raw}' is not a YYYY-MM-DD date")))?
        .to_date()
        .ok_or_else(|| {
            ValidationError::single(field, format!("'{raw}' is not a real calendar date"))
        })
}

/// Day of month taken straight from the string.
pub fn day_of_month(field: &str, raw: &str) -> Result<u32, ValidationError> {
    // Parse fully so an impossible date is not silently accepted.
    parse_calendar_date(field, raw)?;
    DateComponents::parse(raw)
        .map(|c| c.day)
        .ok_or_else(|| ValidationError::single(field, format!("'{raw}' is not a YYYY-MM-DD date")))
}

/// Elapsed whole days from statement close to payment due.
pub fn calculate_grace_period(statement_close: NaiveDate, payment_due: NaiveDate) -> i64 {
    payment_due.signed_duration_since(statement_close).num_days()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GracePeriodCheck {
    pub days: i64,
    /// Inside the 21-27 day range most issuers use
    pub typical: bool,
}

/// Accept grace periods in [15, 35]; anything else is most likely a typo.
pub fn validate_grace_period(days: i64) -> Result<GracePeriodCheck, ValidationError> {
    const FIELD: &str = "grace_period_days";

    if days <= 0 {
        return Err(ValidationError::single(
            FIELD,
            "payment due date must come after the statement close date",
        ));
    }
    if days < MIN_GRACE_DAYS {
        return Err(ValidationError::single(
            FIELD,
            format!("grace period of {days} days is too short (minimum {MIN_GRACE_DAYS})"),
        ));
    }
    if days > MAX_GRACE_DAYS {
        return Err(ValidationError::single(
            FIELD,
            format!(
                "grace period of {days} days is too long, re-check the dates \
                 (maximum {MAX_GRACE_DAYS})"
            ),
        ));
    }

    Ok(GracePeriodCheck {
        days,
        typical: TYPICAL_GRACE_DAYS.contains(&days),
    })
}

/// The recurring monthly pattern stored on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCycle {
    pub statement_close_day: u32,
    pub payment_due_day: u32,
    pub grace_period_days: i64,
}

impl BillingCycle {
    /// Both dates are required; supplying only one is a field error.
    pub fn from_observed_dates(
        statement_close_date: Option<&str>,
        payment_due_date: Option<&str>,
    ) -> Result<Self, ValidationError> {
        const CLOSE: &str = "statement_close_date";
        const DUE: &str = "payment_due_date";

        let close_raw = statement_close_date.map(str::trim).filter(|s| !s.is_empty());
        let due_raw = payment_due_date.map(str::trim).filter(|s| !s.is_empty());

        let mut errors = Collector::new();
        if close_raw.is_none() {
            errors.push(CLOSE, "statement close date is required to calculate the cycle");
        }
        if due_raw.is_none() {
            errors.push(DUE, "payment due date is required to calculate the cycle");
        }

        let close = close_raw.map(|raw| parse_calendar_date(CLOSE, raw));
        let due = due_raw.map(|raw| parse_calendar_date(DUE, raw));
        for parsed in [&close, &due] {
            if let Some(Err(e)) = parsed {
                errors.extend(e.clone());
            }
        }
        errors.finish()?;

        let (Some(Ok(close)), Some(Ok(due))) = (close, due) else {
            return Err(ValidationError::single(CLOSE, "cycle dates are incomplete"));
        };

        let check = validate_grace_period(calculate_grace_period(close, due))?;
        if !check.typical {
            tracing::debug!(
                days = check.days,
                "grace period accepted but outside the typical range"
            );
        }

        Ok(Self {
            statement_close_day: day_of_month(CLOSE, close_raw.unwrap_or_default())?,
            payment_due_day: day_of_month(DUE, due_raw.unwrap_or_default())?,
            grace_period_days: check.days,
        })
    }
}

/// "1st", "2nd", "23rd", "11th".
pub fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}
