//! Money helpers. Amounts are dollars as `f64`; arithmetic that has to add up
//! exactly (allocations) happens in whole cents.

/// Dollars to whole cents, rounded half away from zero.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub fn round_cents(amount: f64) -> f64 {
    from_cents(to_cents(amount))
}

/// Round to one decimal place (used for percentages).
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Interest one monthly cycle adds to `amount` at `apr` percent per year.
pub fn monthly_interest(amount: f64, apr: f64) -> f64 {
    amount * apr / 100.0 / 12.0
}
