use anyhow::{Context, Result, bail};
use clap::Subcommand;
use vitta_core::{
    BillingCycle, Card, CardDraft, CardNetwork, CardSource, SpendCategory, ValidationError,
    best_card_by_category, catalog, optimize, rank_cards, utilization,
};

use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum CardsCommand {
    /// List saved cards
    List,

    /// Add a card, manually or pre-filled from the catalog
    Add {
        /// Catalog card name (see `vitta cards catalog`)
        #[arg(long)]
        catalog: Option<String>,

        /// Card id (default: card-<n>)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        nickname: Option<String>,

        #[arg(long)]
        issuer: Option<String>,

        /// visa, mastercard, amex or discover
        #[arg(long)]
        network: Option<CardNetwork>,

        #[arg(long)]
        limit: Option<f64>,

        #[arg(long)]
        balance: Option<f64>,

        /// Percent, e.g. 21.49
        #[arg(long)]
        apr: Option<f64>,

        /// Minimum / next payment amount
        #[arg(long)]
        amount_to_pay: Option<f64>,

        /// Statement close day of month (1-31)
        #[arg(long)]
        close_day: Option<u32>,

        /// Payment due day of month (1-31)
        #[arg(long)]
        due_day: Option<u32>,

        /// Observed statement close date (YYYY-MM-DD); needs --due-date too
        #[arg(long)]
        close_date: Option<String>,

        /// Observed payment due date (YYYY-MM-DD); needs --close-date too
        #[arg(long)]
        due_date: Option<String>,

        /// Reward multiplier as category=multiplier (repeatable)
        #[arg(long = "reward", value_parser = parse_reward)]
        rewards: Vec<(SpendCategory, f64)>,
    },

    /// Remove a card by id
    Remove {
        #[arg(long)]
        id: String,
    },

    /// Update a card's balance and/or limit
    SetBalance {
        #[arg(long)]
        id: String,

        #[arg(long)]
        balance: Option<f64>,

        #[arg(long)]
        limit: Option<f64>,
    },

    /// Show the built-in card catalog
    Catalog,
}

fn parse_reward(s: &str) -> Result<(SpendCategory, f64), String> {
    let (cat, mult) = s
        .split_once('=')
        .ok_or_else(|| format!("expected category=multiplier, got '{s}'"))?;
    let category = cat.parse::<SpendCategory>()?;
    let multiplier = mult
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad multiplier '{mult}': {e}"))?;
    Ok((category, multiplier))
}

pub fn run(session: &Session, cmd: CardsCommand) -> Result<()> {
    match cmd {
        CardsCommand::List => list(session),
        CardsCommand::Add {
            catalog,
            id,
            name,
            nickname,
            issuer,
            network,
            limit,
            balance,
            apr,
            amount_to_pay,
            close_day,
            due_day,
            close_date,
            due_date,
            rewards,
        } => {
            let mut draft = match catalog.as_deref() {
                Some(name) => catalog::lookup(name)
                    .with_context(|| {
                        format!("'{name}' is not in the catalog (see `vitta cards catalog`)")
                    })?
                    .draft(),
                None => CardDraft::default(),
            };
            // Explicit flags override catalog values.
            draft.card_name = name.or(draft.card_name);
            draft.nickname = nickname.or(draft.nickname);
            draft.issuer = issuer.or(draft.issuer);
            draft.card_network = network.or(draft.card_network);
            draft.credit_limit = limit.or(draft.credit_limit);
            draft.current_balance = balance.or(draft.current_balance);
            draft.apr = apr.or(draft.apr);
            draft.amount_to_pay = amount_to_pay.or(draft.amount_to_pay);
            draft.statement_close_day = close_day;
            draft.payment_due_day = due_day;
            draft.statement_close_date = close_date;
            draft.payment_due_date = due_date;
            for (category, multiplier) in rewards {
                draft.reward_structure.set(category, multiplier);
            }
            add(session, id, draft)
        }
        CardsCommand::Remove { id } => {
            if session.cards().remove_card(session.user_id(), &id)? {
                println!("Removed card {id}");
            } else {
                println!("No card found with id {id}");
            }
            Ok(())
        }
        CardsCommand::SetBalance { id, balance, limit } => {
            if balance.is_none() && limit.is_none() {
                bail!("pass --balance and/or --limit");
            }
            let card = session.cards().update_card(session.user_id(), &id, |card| {
                if let Some(l) = limit {
                    card.apply_limit(l)?;
                }
                if let Some(b) = balance {
                    card.apply_balance(b)?;
                }
                Ok(())
            });
            match card {
                Ok(card) => {
                    println!(
                        "{}: balance ${:.2} of ${:.2}",
                        card.display_name(),
                        card.current_balance,
                        card.credit_limit
                    );
                    Ok(())
                }
                Err(e) => match e.downcast_ref::<ValidationError>() {
                    Some(v) => report_validation(v),
                    None => Err(e),
                },
            }
        }
        CardsCommand::Catalog => {
            for e in catalog::entries() {
                let rewards: Vec<String> =
                    e.rewards.iter().map(|(c, m)| format!("{c}={m}")).collect();
                println!(
                    "- {} ({}, {:?}) apr~{:.2}% | {}",
                    e.name,
                    e.issuer,
                    e.network,
                    e.typical_apr,
                    rewards.join(" ")
                );
            }
            Ok(())
        }
    }
}

fn report_validation(err: &ValidationError) -> Result<()> {
    eprintln!("Please fix the following:");
    for f in err.fields() {
        eprintln!("  - {}: {}", f.field, f.message);
    }
    bail!("card input is invalid")
}

fn add(session: &Session, id: Option<String>, draft: CardDraft) -> Result<()> {
    let store = session.cards();
    let seq = store.next_seq(session.user_id())?;
    let id = id.unwrap_or_else(|| format!("card-{seq}"));

    let card = match draft.validate(id, seq) {
        Ok(card) => card,
        Err(e) => return report_validation(&e),
    };
    if let Some(days) = card.grace_period_days {
        println!("Grace period: {days} days");
    }
    store.add_card(session.user_id(), card.clone())?;
    println!("Added {} ({})", card.display_name(), card.id);
    Ok(())
}

fn list(session: &Session) -> Result<()> {
    let cards = session.cards().user_cards(session.user_id())?;
    if cards.is_empty() {
        println!("No cards yet. Add one with: vitta cards add --help");
        return Ok(());
    }
    for c in &cards {
        let due = c
            .payment_due_day
            .map(|d| format!("due day {d}"))
            .unwrap_or_else(|| "no due day".to_string());
        println!(
            "[{}] {} ({:?}) | ${:.2} / ${:.2} | apr {:.2}% | {}",
            c.id,
            c.display_name(),
            c.card_network,
            c.current_balance,
            c.credit_limit,
            c.apr,
            due
        );
    }
    Ok(())
}

pub fn cycle(close: Option<String>, due: Option<String>) -> Result<()> {
    match BillingCycle::from_observed_dates(close.as_deref(), due.as_deref()) {
        Ok(cycle) => {
            println!("Statement closes on day {}", cycle.statement_close_day);
            println!("Payment due on day {}", cycle.payment_due_day);
            println!("Grace period: {} days", cycle.grace_period_days);
            Ok(())
        }
        Err(e) => {
            for f in e.fields() {
                eprintln!("  - {}: {}", f.field, f.message);
            }
            bail!("could not calculate the billing cycle")
        }
    }
}

pub fn best_card(session: &Session, category: Option<SpendCategory>, all: bool) -> Result<()> {
    let cards = session.cards().user_cards(session.user_id())?;
    if cards.is_empty() {
        println!("No cards yet.");
        return Ok(());
    }

    if all || category.is_none() {
        for (category, card) in best_card_by_category(&cards) {
            println!(
                "{category:>10}: {} ({}x)",
                card.display_name(),
                card.reward_structure.multiplier_for(category)
            );
        }
        return Ok(());
    }

    if let Some(category) = category {
        println!("Best cards for {category}:");
        for (i, r) in rank_cards(&cards, category).iter().enumerate() {
            println!(
                "{}. {} ({}x, ${:.2} available)",
                i + 1,
                r.card.display_name(),
                r.multiplier,
                r.card.available_credit()
            );
        }
    }
    Ok(())
}

pub fn analyze(session: &Session) -> Result<()> {
    let cards = session.cards().user_cards(session.user_id())?;
    let portfolio = utilization::analyze_portfolio(&cards);

    println!("# Credit overview\n");
    println!(
        "Total: ${:.2} of ${:.2} used, ${:.2} available ({})\n",
        portfolio.total_balance,
        portfolio.total_limit,
        portfolio.total_available,
        fmt_percent(portfolio.utilization_percent)
    );

    for (card, report) in cards.iter().zip(&portfolio.cards) {
        println!(
            "## {} ({} utilization, ${:.2} available)",
            card.display_name(),
            fmt_percent(report.utilization_percent),
            report.available_credit
        );
        for tip in &report.tips {
            println!("- [{:?}] {}", tip.severity, tip.message);
        }
        println!();
    }
    Ok(())
}

fn fmt_percent(p: Option<f64>) -> String {
    p.map(|v| format!("{v:.1}%"))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn optimize_payments(session: &Session, budget: f64, json: bool) -> Result<()> {
    let cards: Vec<Card> = session.cards().user_cards(session.user_id())?;
    let plan = optimize(&cards, budget);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("# Payment plan for ${budget:.2} (highest APR first)\n");
    for a in &plan.allocations {
        println!(
            "- {}: pay ${:.2} of ${:.2} at {:.2}% | left ${:.2} -> ~${:.2} interest next cycle",
            a.card_label, a.allocated, a.balance, a.apr, a.residual, a.projected_interest
        );
    }
    println!(
        "\nAllocated ${:.2}, avoiding ~${:.2} interest; ~${:.2} still accrues.",
        plan.total_allocated, plan.total_interest_avoided, plan.total_projected_interest
    );
    if plan.surplus > 0.0 {
        println!("Every balance is covered; ${:.2} of the budget is left over.", plan.surplus);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reward() {
        assert_eq!(parse_reward("dining=3"), Ok((SpendCategory::Dining, 3.0)));
        assert_eq!(parse_reward("general=1.5"), Ok((SpendCategory::Default, 1.5)));
        assert!(parse_reward("dining").is_err());
        assert!(parse_reward("pets=2").is_err());
        assert!(parse_reward("gas=lots").is_err());
    }
}
