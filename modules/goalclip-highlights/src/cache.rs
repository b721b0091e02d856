use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{GoalKey, GoalLink, ResolutionOutcome};

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    match_id: u64,
    minute: u32,
    outcome: ResolutionOutcome,
}

/// Durable goal-link store with explicit negative markers. Lookups are
/// exact-key. A `Found` entry is never overwritten by a later search; a
/// `NotFound` marker suppresses re-searching. Only the explicit clear
/// operations remove entries. Every mutation persists to disk.
pub struct GoalLinkCache {
    path: PathBuf,
    entries: RwLock<HashMap<GoalKey, ResolutionOutcome>>,
}

impl GoalLinkCache {
    /// Open (or create) the cache file. An unreadable or corrupt file is
    /// logged and treated as empty; the cache is best-effort by contract.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create cache dir {}", parent.display()))?;
            }
        }

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<StoredEntry>>(&raw) {
                Ok(stored) => stored
                    .into_iter()
                    .map(|entry| {
                        (GoalKey { match_id: entry.match_id, minute: entry.minute }, entry.outcome)
                    })
                    .collect(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cache file unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("read cache file {}", path.display()))
            }
        };

        Ok(Self { path, entries: RwLock::new(entries) })
    }

    pub fn get(&self, key: &GoalKey) -> Option<ResolutionOutcome> {
        self.read().get(key).cloned()
    }

    /// Record a positive resolution. Write-once: an existing `Found` entry
    /// is kept untouched, so re-writing the same key is a harmless no-op.
    pub fn set_found(&self, link: GoalLink) -> Result<()> {
        let key = link.key();
        let snapshot = {
            let mut entries = self.write();
            if matches!(entries.get(&key), Some(ResolutionOutcome::Found(_))) {
                return Ok(());
            }
            entries.insert(key, ResolutionOutcome::Found(link));
            Self::snapshot(&entries)
        };
        self.persist(&snapshot)
    }

    /// Record that a completed search matched nothing. Never downgrades an
    /// existing entry of either kind.
    pub fn set_not_found(&self, key: GoalKey) -> Result<()> {
        let snapshot = {
            let mut entries = self.write();
            if entries.contains_key(&key) {
                return Ok(());
            }
            entries.insert(key, ResolutionOutcome::NotFound);
            Self::snapshot(&entries)
        };
        self.persist(&snapshot)
    }

    /// Remove one entry (the only mutation path for a `Found` result).
    pub fn clear(&self, key: &GoalKey) -> Result<()> {
        let snapshot = {
            let mut entries = self.write();
            if entries.remove(key).is_none() {
                return Ok(());
            }
            Self::snapshot(&entries)
        };
        self.persist(&snapshot)
    }

    pub fn clear_all(&self) -> Result<()> {
        self.write().clear();
        self.persist(&[])
    }

    /// All cached keys, sorted. Used by operator tooling.
    pub fn keys(&self) -> Vec<GoalKey> {
        let mut keys: Vec<GoalKey> = self.read().keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn snapshot(entries: &HashMap<GoalKey, ResolutionOutcome>) -> Vec<StoredEntry> {
        let mut stored: Vec<StoredEntry> = entries
            .iter()
            .map(|(key, outcome)| StoredEntry {
                match_id: key.match_id,
                minute: key.minute,
                outcome: outcome.clone(),
            })
            .collect();
        stored.sort_by_key(|entry| (entry.match_id, entry.minute));
        stored
    }

    fn persist(&self, entries: &[StoredEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
            .with_context(|| format!("write cache file {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<GoalKey, ResolutionOutcome>> {
        self.entries.read().expect("cache lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<GoalKey, ResolutionOutcome>> {
        self.entries.write().expect("cache lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn link(match_id: u64, minute: u32, url: &str) -> GoalLink {
        GoalLink {
            match_id,
            minute,
            url: url.into(),
            title: "Arsenal 1-0 Chelsea - Saka 23'".into(),
            post_url: "https://www.reddit.com/r/soccer/comments/x1/".into(),
            fetched_at: Utc::now(),
        }
    }

    fn open(dir: &TempDir) -> GoalLinkCache {
        GoalLinkCache::open(dir.path().join("goal_links.json")).unwrap()
    }

    #[test]
    fn round_trips_found_and_not_found() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir);

        cache.set_found(link(555, 23, "https://streamable.com/abc")).unwrap();
        cache.set_not_found(GoalKey { match_id: 555, minute: 67 }).unwrap();

        let found = cache.get(&GoalKey { match_id: 555, minute: 23 }).unwrap();
        assert_eq!(found.link().unwrap().url, "https://streamable.com/abc");

        let negative = cache.get(&GoalKey { match_id: 555, minute: 67 }).unwrap();
        assert_eq!(negative, ResolutionOutcome::NotFound);

        assert!(cache.get(&GoalKey { match_id: 555, minute: 90 }).is_none());
    }

    #[test]
    fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let cache = open(&dir);
            cache.set_found(link(555, 23, "https://streamable.com/abc")).unwrap();
            cache.set_not_found(GoalKey { match_id: 7, minute: 1 }).unwrap();
        }

        let cache = open(&dir);
        assert_eq!(cache.len(), 2);
        let found = cache.get(&GoalKey { match_id: 555, minute: 23 }).unwrap();
        assert_eq!(found.link().unwrap().url, "https://streamable.com/abc");
    }

    #[test]
    fn found_is_never_silently_overwritten() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir);
        let key = GoalKey { match_id: 555, minute: 23 };

        cache.set_found(link(555, 23, "https://streamable.com/first")).unwrap();
        cache.set_found(link(555, 23, "https://streamable.com/second")).unwrap();
        cache.set_not_found(key).unwrap();

        let outcome = cache.get(&key).unwrap();
        assert_eq!(outcome.link().unwrap().url, "https://streamable.com/first");
    }

    #[test]
    fn not_found_does_not_upgrade_or_duplicate() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir);
        let key = GoalKey { match_id: 9, minute: 45 };

        cache.set_not_found(key).unwrap();
        cache.set_not_found(key).unwrap();
        assert_eq!(cache.len(), 1);

        // A later positive may replace the negative marker.
        cache.set_found(link(9, 45, "https://streamable.com/late")).unwrap();
        assert!(cache.get(&key).unwrap().link().is_some());
    }

    #[test]
    fn clear_one_and_clear_all() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir);

        cache.set_found(link(1, 10, "https://streamable.com/a")).unwrap();
        cache.set_found(link(2, 20, "https://streamable.com/b")).unwrap();

        cache.clear(&GoalKey { match_id: 1, minute: 10 }).unwrap();
        assert!(cache.get(&GoalKey { match_id: 1, minute: 10 }).is_none());
        assert_eq!(cache.len(), 1);

        cache.clear_all().unwrap();
        assert!(cache.is_empty());

        // Both removals reached disk.
        let reopened = open(&dir);
        assert!(reopened.is_empty());
    }

    #[test]
    fn keys_are_sorted() {
        let dir = TempDir::new().unwrap();
        let cache = open(&dir);

        cache.set_not_found(GoalKey { match_id: 2, minute: 5 }).unwrap();
        cache.set_not_found(GoalKey { match_id: 1, minute: 90 }).unwrap();
        cache.set_not_found(GoalKey { match_id: 1, minute: 9 }).unwrap();

        assert_eq!(
            cache.keys(),
            vec![
                GoalKey { match_id: 1, minute: 9 },
                GoalKey { match_id: 1, minute: 90 },
                GoalKey { match_id: 2, minute: 5 },
            ]
        );
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("goal_links.json");
        fs::write(&path, "not json at all").unwrap();

        let cache = GoalLinkCache::open(&path).unwrap();
        assert!(cache.is_empty());
    }
}
