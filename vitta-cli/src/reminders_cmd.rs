use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use std::time::Duration as StdDuration;
use vitta_core::{
    MuteState, Reminder, ReminderStore, mute_reminders, refresh_reminders, summarize_reminder_plan,
    today_in, unmute_reminders,
};

use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum RemindersCommand {
    /// Rebuild the reminder plan from the current cards and store it
    Plan,

    /// List stored reminders
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Only reminders firing today or later
        #[arg(long, default_value_t = false)]
        upcoming: bool,
    },

    /// What's due soonest, how many reminders are upcoming, mute state
    Status,

    /// Mute delivery for N days, or until `unmute` when --days is omitted
    Mute {
        #[arg(long)]
        days: Option<i64>,
    },

    /// Resume delivery immediately
    Unmute,

    /// Deliver reminders whose day has come (once each)
    Dispatch {
        /// Dry-run only; do not mark anything as sent
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Re-plan and dispatch on an interval until Ctrl-C
    Watch {
        /// Override config.reminders.poll_seconds
        #[arg(long)]
        every: Option<u64>,
    },
}

pub async fn run(session: &Session, cmd: RemindersCommand) -> Result<()> {
    match cmd {
        RemindersCommand::Plan => plan(session),
        RemindersCommand::List { limit, upcoming } => list(session, limit, upcoming),
        RemindersCommand::Status => status(session),
        RemindersCommand::Mute { days } => {
            let mut store = session.reminders();
            let state = mute_reminders(&mut store, session.user_id(), session.now(), days)?;
            println!("{}", describe_mute(&state));
            Ok(())
        }
        RemindersCommand::Unmute => {
            let mut store = session.reminders();
            unmute_reminders(&mut store, session.user_id())?;
            println!("Reminders unmuted.");
            Ok(())
        }
        RemindersCommand::Dispatch { dry_run } => {
            dispatch(session, session.now(), dry_run).map(|_| ())
        }
        RemindersCommand::Watch { every } => {
            let secs = every.unwrap_or(session.config.reminders.poll_seconds).max(1);
            watch(session.clone(), StdDuration::from_secs(secs)).await
        }
    }
}

fn describe_mute(state: &MuteState) -> String {
    match state {
        MuteState::Active => "Reminders are active.".to_string(),
        MuteState::MutedUntil { until } => format!("Reminders muted until {}.", until.to_rfc3339()),
        MuteState::MutedIndefinitely => {
            "Reminders muted until you run `vitta reminders unmute`.".to_string()
        }
    }
}

fn plan(session: &Session) -> Result<()> {
    let mut store = session.reminders();
    let today = session.today();
    let policy = session.config.policy();
    let reminders =
        refresh_reminders(&session.cards(), &mut store, session.user_id(), today, &policy)?;
    let summary = summarize_reminder_plan(&reminders, today, policy.horizon_days);

    println!(
        "Planned {} reminders ({} upcoming in the next {} days).",
        reminders.len(),
        summary.total_upcoming,
        policy.horizon_days
    );
    if let Some(next) = summary.next_reminder {
        println!("Next: {} (fires {})", next.title, next.target_date);
    }
    Ok(())
}

fn print_reminder(i: usize, r: &Reminder) {
    println!(
        "{}. {} {} | fires {} ({:+}d) | {}",
        i + 1,
        r.urgency.emoji(),
        r.card_label,
        r.target_date,
        r.lead_time_days,
        r.body
    );
}

fn list(session: &Session, limit: usize, upcoming: bool) -> Result<()> {
    let today = session.today();
    let rows = session.reminders().list_reminders(session.user_id())?;
    if rows.is_empty() {
        println!("No reminders stored. Run: vitta reminders plan");
        return Ok(());
    }
    rows.iter()
        .filter(|r| !upcoming || r.target_date >= today)
        .take(limit)
        .enumerate()
        .for_each(|(i, r)| print_reminder(i, r));
    Ok(())
}

fn status(session: &Session) -> Result<()> {
    let store = session.reminders();
    let today = session.today();
    let horizon = session.config.reminders.horizon_days;
    let rows = store.list_reminders(session.user_id())?;
    let summary = summarize_reminder_plan(&rows, today, horizon);

    println!("Upcoming in the next {horizon} days: {}", summary.total_upcoming);
    match summary.next_reminder {
        Some(next) => println!(
            "Due soonest: {} on {} ({} days), next reminder {}",
            next.card_label, next.due_date, next.days_until_due, next.target_date
        ),
        None => println!("Nothing due."),
    }
    let state = store.mute_state(session.user_id())?;
    let state = if state.is_muted(session.now()) { state } else { MuteState::Active };
    println!("{}", describe_mute(&state));
    Ok(())
}

/// Re-plan as of `now`, then deliver whatever is due and not yet sent.
/// Returns how many reminders went out (or would have, on a dry run).
fn dispatch(session: &Session, now: DateTime<Utc>, dry_run: bool) -> Result<usize> {
    let mut store = session.reminders();
    let user = session.user_id();
    let today = today_in(session.tz, now);
    let policy = session.config.policy();

    let reminders = refresh_reminders(&session.cards(), &mut store, user, today, &policy)
        .context("re-planning before dispatch")?;

    let state = store.mute_state(user)?;
    if state.is_muted(now) {
        tracing::info!(?state, "delivery suppressed while muted");
        println!("{}", describe_mute(&state));
        return Ok(0);
    }

    let sent = store.sent_keys(user)?;
    let mut delivered = 0usize;
    for r in state.deliverable(&reminders, today, now) {
        let key = r.delivery_key();
        if sent.contains(&key) {
            continue;
        }
        delivered += 1;
        if dry_run {
            println!("[DRY RUN] would send: {}", r.title);
            continue;
        }
        println!("{}\n  {}", r.title, r.body);
        store.mark_sent(user, &key)?;
    }

    if delivered == 0 {
        tracing::debug!("no due unsent reminders");
    }
    Ok(delivered)
}

async fn watch(session: Session, every: StdDuration) -> Result<()> {
    println!("Watching reminders every {}s (Ctrl-C to stop)", every.as_secs());
    let mut ticker = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // File I/O stays off the runtime thread.
                let tick = session.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || dispatch(&tick, tick.now(), false)).await;
                // A failed tick is retried on the next one; regeneration is total.
                match outcome {
                    Ok(Ok(n)) if n > 0 => tracing::info!(sent = n, "dispatched reminders"),
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(error = %format!("{e:#}"), "dispatch failed; will retry")
                    }
                    Err(e) => tracing::warn!(error = %e, "dispatch task panicked; will retry"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped.");
                return Ok(());
            }
        }
    }
}
