use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vitta_core::ReminderPolicy;
use vitta_core::reminders::{DEFAULT_HORIZON_DAYS, DEFAULT_LEAD_TIMES};

use crate::state::write_atomic;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub user_id: String,
    /// IANA timezone used to decide what "today" is
    pub timezone: String,
    pub reminders: RemindersSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemindersSection {
    /// Days before the due date to remind; negative values are follow-ups
    pub lead_times: Vec<i64>,
    pub horizon_days: i64,
    /// How often `reminders watch` re-plans and checks for due reminders
    pub poll_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
            timezone: "America/Chicago".to_string(),
            reminders: RemindersSection::default(),
        }
    }
}

impl Default for RemindersSection {
    fn default() -> Self {
        Self {
            lead_times: DEFAULT_LEAD_TIMES.to_vec(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            poll_seconds: 60,
        }
    }
}

impl Config {
    pub fn policy(&self) -> ReminderPolicy {
        ReminderPolicy {
            lead_times: self.reminders.lead_times.clone(),
            horizon_days: self.reminders.horizon_days,
        }
    }
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

pub fn load_config(home: &Path) -> Result<Config> {
    let p = config_path(home);
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(home: &Path, cfg: &Config) -> Result<()> {
    let p = config_path(home);
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    write_atomic(&p, &s)
}

pub fn init_config(home: &Path) -> Result<()> {
    let p = config_path(home);
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(home, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.policy().lead_times, vec![7, 3, 1, 0]);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            config_path(dir.path()),
            "timezone = \"Asia/Kathmandu\"\n\n[reminders]\nlead_times = [5, 0]\n",
        )
        .unwrap();
        let cfg = load_config(dir.path()).unwrap();
        assert_eq!(cfg.timezone, "Asia/Kathmandu");
        assert_eq!(cfg.user_id, "local");
        assert_eq!(cfg.reminders.lead_times, vec![5, 0]);
        assert_eq!(cfg.reminders.horizon_days, 30);
    }

    #[test]
    fn test_save_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.reminders.lead_times = vec![10, 5, 2, 0, -1];
        cfg.timezone = "Europe/Berlin".to_string();
        save_config(dir.path(), &cfg).unwrap();

        cfg.reminders.lead_times = vec![1];
        save_config(dir.path(), &cfg).unwrap();

        assert_eq!(load_config(dir.path()).unwrap(), cfg);
        assert!(!dir.path().join("config.toml.tmp").exists());
    }

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        init_config(dir.path()).unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), Config::default());
    }
}
