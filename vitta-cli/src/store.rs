//! File-backed card source and reminder store under the vitta home directory.

use anyhow::{Context, Result, bail};
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use vitta_core::{Card, CardSource, MuteState, Reminder, ReminderStore};

use crate::state::{cards_path, read_json_or_default, reminders_dir, write_json_atomic};

/// `cards.json`: user id -> cards in creation order.
pub struct FileCardStore {
    path: PathBuf,
}

impl FileCardStore {
    pub fn new(home: &Path) -> Self {
        Self {
            path: cards_path(home),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, Vec<Card>>> {
        read_json_or_default(&self.path)
    }

    /// Next creation sequence number for `user_id`.
    pub fn next_seq(&self, user_id: &str) -> Result<u64> {
        let all = self.load()?;
        Ok(all
            .get(user_id)
            .and_then(|cards| cards.iter().map(|c| c.created_seq).max())
            .map_or(0, |m| m + 1))
    }

    pub fn add_card(&self, user_id: &str, card: Card) -> Result<()> {
        let mut all = self.load()?;
        let cards = all.entry(user_id.to_string()).or_default();
        if cards.iter().any(|c| c.id == card.id) {
            bail!("a card with id '{}' already exists", card.id);
        }
        cards.push(card);
        write_json_atomic(&self.path, &all)
    }

    /// Returns false when no card had that id.
    pub fn remove_card(&self, user_id: &str, card_id: &str) -> Result<bool> {
        let mut all = self.load()?;
        let Some(cards) = all.get_mut(user_id) else {
            return Ok(false);
        };
        let before = cards.len();
        cards.retain(|c| c.id != card_id);
        if cards.len() == before {
            return Ok(false);
        }
        write_json_atomic(&self.path, &all)?;
        Ok(true)
    }

    /// Apply `edit` to one card and save, unless the edit fails.
    pub fn update_card<F>(&self, user_id: &str, card_id: &str, edit: F) -> Result<Card>
    where
        F: FnOnce(&mut Card) -> Result<()>,
    {
        let mut all = self.load()?;
        let card = all
            .get_mut(user_id)
            .and_then(|cards| cards.iter_mut().find(|c| c.id == card_id))
            .with_context(|| format!("no card with id '{card_id}'"))?;
        edit(card)?;
        let updated = card.clone();
        write_json_atomic(&self.path, &all)?;
        Ok(updated)
    }
}

impl CardSource for FileCardStore {
    fn user_cards(&self, user_id: &str) -> Result<Vec<Card>> {
        let mut cards = self.load()?.remove(user_id).unwrap_or_default();
        cards.sort_by_key(|c| c.created_seq);
        Ok(cards)
    }
}

/// One JSON file per user for the plan, one for mute state, plus an
/// append-only log of delivery keys already sent.
pub struct FileReminderStore {
    dir: PathBuf,
}

fn file_stem(user_id: &str) -> String {
    user_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl FileReminderStore {
    pub fn new(home: &Path) -> Self {
        Self {
            dir: reminders_dir(home),
        }
    }

    fn plan_path(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(user_id)))
    }

    fn mute_path(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.mute.json", file_stem(user_id)))
    }

    fn sent_path(&self, user_id: &str) -> PathBuf {
        self.dir.join(format!("{}.sent.txt", file_stem(user_id)))
    }

    pub fn sent_keys(&self, user_id: &str) -> Result<HashSet<String>> {
        let p = self.sent_path(user_id);
        if !p.exists() {
            return Ok(HashSet::new());
        }
        let f = fs::File::open(&p).with_context(|| format!("open {}", p.display()))?;
        Ok(BufReader::new(f)
            .lines()
            .map_while(|l| l.ok())
            .filter(|l| !l.trim().is_empty())
            .collect())
    }

    pub fn mark_sent(&self, user_id: &str, delivery_key: &str) -> Result<()> {
        let p = self.sent_path(user_id);
        fs::create_dir_all(&self.dir).with_context(|| format!("create {}", self.dir.display()))?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&p)
            .with_context(|| format!("open {}", p.display()))?;
        writeln!(f, "{delivery_key}")?;
        Ok(())
    }
}

impl ReminderStore for FileReminderStore {
    fn upsert_reminders(&mut self, user_id: &str, reminders: &[Reminder]) -> Result<()> {
        // Keyed by card + lead time; the new plan replaces the old one whole.
        let keyed: BTreeMap<&str, &Reminder> =
            reminders.iter().map(|r| (r.dedupe_key.as_str(), r)).collect();
        let rows: Vec<&Reminder> = keyed.into_values().collect();
        let p = self.plan_path(user_id);
        write_json_atomic(&p, &rows)?;
        tracing::info!(
            user = user_id,
            count = rows.len(),
            path = %p.display(),
            "stored reminder plan"
        );
        Ok(())
    }

    fn list_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let mut rows: Vec<Reminder> = read_json_or_default(&self.plan_path(user_id))?;
        rows.sort_by(|a, b| {
            a.target_date
                .cmp(&b.target_date)
                .then_with(|| a.dedupe_key.cmp(&b.dedupe_key))
        });
        Ok(rows)
    }

    fn mute_state(&self, user_id: &str) -> Result<MuteState> {
        read_json_or_default(&self.mute_path(user_id))
    }

    fn set_mute_state(&mut self, user_id: &str, state: MuteState) -> Result<()> {
        write_json_atomic(&self.mute_path(user_id), &state)
    }
}
