//! vitta-core: statement cycles, reminders, payment planning and card
//! recommendations for the Vitta wallet assistant.
//!
//! Everything here is pure and synchronous over caller-supplied card
//! snapshots. Storage plugs in through the traits in [`store`].

pub mod card;
pub mod catalog;
pub mod cycle;
pub mod error;
pub mod money;
pub mod mute;
pub mod optimizer;
pub mod reminders;
pub mod rewards;
pub mod store;
pub mod time;
pub mod utilization;

pub use card::{Card, CardDraft, CardNetwork, RewardStructure, SpendCategory};
pub use catalog::CatalogEntry;
pub use cycle::{
    BillingCycle, DateComponents, GracePeriodCheck, calculate_grace_period, parse_calendar_date,
    validate_grace_period,
};
pub use error::{FieldError, ValidationError};
pub use mute::MuteState;
pub use optimizer::{Allocation, OptimizationPlan, optimize};
pub use reminders::{
    Reminder, ReminderPolicy, ReminderSummary, Urgency, generate_baseline_reminder_plan,
    next_due_date, summarize_reminder_plan,
};
pub use rewards::{RankedCard, best_card_by_category, rank_cards, select_best_card};
pub use store::{
    CardSource, InMemoryCardSource, InMemoryReminderStore, ReminderStore, mute_reminders,
    refresh_reminders, unmute_reminders,
};
pub use time::{parse_timezone, today_in};
pub use utilization::{
    PortfolioSummary, Tip, TipKind, UtilizationReport, analyze, analyze_portfolio,
};
