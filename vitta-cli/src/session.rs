use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::path::PathBuf;
use vitta_core::{parse_timezone, today_in};

use crate::config::{Config, load_config};
use crate::state::ensure_vitta_home;
use crate::store::{FileCardStore, FileReminderStore};

/// Everything a command needs, resolved once per invocation.
#[derive(Debug, Clone)]
pub struct Session {
    pub home: PathBuf,
    pub config: Config,
    pub tz: Tz,
}

impl Session {
    pub fn open() -> Result<Self> {
        let home = ensure_vitta_home()?;
        let config = load_config(&home)?;
        let tz = parse_timezone(&config.timezone).context("config.toml timezone")?;
        Ok(Self { home, config, tz })
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// The user's calendar date right now.
    pub fn today(&self) -> NaiveDate {
        today_in(self.tz, self.now())
    }

    pub fn cards(&self) -> FileCardStore {
        FileCardStore::new(&self.home)
    }

    pub fn reminders(&self) -> FileReminderStore {
        FileReminderStore::new(&self.home)
    }
}
