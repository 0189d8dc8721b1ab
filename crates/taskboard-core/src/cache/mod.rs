//! TTL cache of remote reads, persisted in a local SQLite file.
//!
//! Entries are JSON payloads stored with the time they were fetched. A read
//! is a hit only while `now - fetched_at < ttl`; the TTL depends on what the
//! key holds (see [`CacheTtl`]). Payloads that no longer decode are dropped
//! and reported as misses.
//!
//! The same file also keeps a small table of user preferences, which never
//! expire.

use std::{fmt, path::Path, time::Duration};

use jiff::Timestamp;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{CacheResultExt, Result},
    models::ProjectId,
};

const SELECT_ENTRY_SQL: &str = "SELECT payload, fetched_at FROM cache_entries WHERE key = ?1";
const UPSERT_ENTRY_SQL: &str = "INSERT INTO cache_entries (key, payload, fetched_at) VALUES (?1, ?2, ?3) \
     ON CONFLICT(key) DO UPDATE SET payload = excluded.payload, fetched_at = excluded.fetched_at";
const DELETE_ENTRY_SQL: &str = "DELETE FROM cache_entries WHERE key = ?1";
const SELECT_PREFERENCE_SQL: &str = "SELECT value FROM preferences WHERE name = ?1";
const UPSERT_PREFERENCE_SQL: &str = "INSERT INTO preferences (name, value) VALUES (?1, ?2) \
     ON CONFLICT(name) DO UPDATE SET value = excluded.value";

/// Time-to-live per kind of cached payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    /// Project list of an owner
    pub projects: Duration,
    /// Task list of a project
    pub tasks: Duration,
    /// Metadata of a single project
    pub project: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            projects: Duration::from_secs(60),
            tasks: Duration::from_secs(5 * 60),
            project: Duration::from_secs(30),
        }
    }
}

/// What a cache entry holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Projects { owner: String },
    Tasks { project: ProjectId },
    Project { project: ProjectId },
}

impl CacheKey {
    pub fn projects(owner: impl Into<String>) -> Self {
        CacheKey::Projects {
            owner: owner.into(),
        }
    }

    pub fn tasks(project: &ProjectId) -> Self {
        CacheKey::Tasks {
            project: project.clone(),
        }
    }

    pub fn project(project: &ProjectId) -> Self {
        CacheKey::Project {
            project: project.clone(),
        }
    }

    pub fn ttl(&self, ttl: &CacheTtl) -> Duration {
        match self {
            CacheKey::Projects { .. } => ttl.projects,
            CacheKey::Tasks { .. } => ttl.tasks,
            CacheKey::Project { .. } => ttl.project,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Projects { owner } => write!(f, "projects:{owner}"),
            CacheKey::Tasks { project } => write!(f, "tasks:{project}"),
            CacheKey::Project { project } => write!(f, "project:{project}"),
        }
    }
}

/// SQLite-backed cache handle.
pub struct Cache {
    connection: Connection,
    ttl: CacheTtl,
}

impl Cache {
    /// Opens (or creates) the cache file and initializes its schema.
    pub fn open<P: AsRef<Path>>(path: P, ttl: CacheTtl) -> Result<Self> {
        let connection = Connection::open(path).cache_context("Failed to open cache file")?;
        Self::with_connection(connection, ttl)
    }

    /// A cache that lives only as long as the handle.
    pub fn in_memory(ttl: CacheTtl) -> Result<Self> {
        let connection =
            Connection::open_in_memory().cache_context("Failed to open in-memory cache")?;
        Self::with_connection(connection, ttl)
    }

    fn with_connection(connection: Connection, ttl: CacheTtl) -> Result<Self> {
        let schema_sql = include_str!("../../assets/schema.sql");
        connection
            .execute_batch(schema_sql)
            .cache_context("Failed to initialize cache schema")?;
        Ok(Self { connection, ttl })
    }

    pub fn ttl(&self) -> &CacheTtl {
        &self.ttl
    }

    /// Returns the payload under `key` if it is still fresh.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        self.get_at(key, Timestamp::now())
    }

    /// [`Cache::get`] evaluated at `now`.
    pub fn get_at<T: DeserializeOwned>(&self, key: &CacheKey, now: Timestamp) -> Result<Option<T>> {
        let name = key.to_string();
        let row: Option<(String, String)> = self
            .connection
            .query_row(SELECT_ENTRY_SQL, params![name], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .cache_context("Failed to read cache entry")?;

        let Some((payload, fetched_at)) = row else {
            debug!("Cache miss for {name}");
            return Ok(None);
        };

        let Ok(fetched_at) = fetched_at.parse::<Timestamp>() else {
            warn!("Dropping cache entry {name}: unreadable timestamp '{fetched_at}'");
            self.invalidate(key)?;
            return Ok(None);
        };

        let age_ms = now.as_millisecond() - fetched_at.as_millisecond();
        let ttl_ms = i64::try_from(key.ttl(&self.ttl).as_millis()).unwrap_or(i64::MAX);
        if age_ms >= ttl_ms {
            debug!("Cache entry {name} expired ({age_ms}ms old)");
            return Ok(None);
        }

        match serde_json::from_str(&payload) {
            Ok(value) => {
                debug!("Cache hit for {name}");
                Ok(Some(value))
            }
            Err(e) => {
                warn!("Dropping corrupt cache entry {name}: {e}");
                self.invalidate(key)?;
                Ok(None)
            }
        }
    }

    /// Stores `payload` under `key`, fetched now.
    pub fn set<T: Serialize + ?Sized>(&self, key: &CacheKey, payload: &T) -> Result<()> {
        self.set_at(key, payload, Timestamp::now())
    }

    /// [`Cache::set`] with an explicit fetch time.
    pub fn set_at<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        payload: &T,
        fetched_at: Timestamp,
    ) -> Result<()> {
        let payload = serde_json::to_string(payload)?;
        self.connection
            .execute(
                UPSERT_ENTRY_SQL,
                params![key.to_string(), payload, fetched_at.to_string()],
            )
            .cache_context("Failed to write cache entry")?;
        Ok(())
    }

    /// Removes the entry; returns whether one existed.
    pub fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        let removed = self
            .connection
            .execute(DELETE_ENTRY_SQL, params![key.to_string()])
            .cache_context("Failed to invalidate cache entry")?;
        Ok(removed > 0)
    }

    /// Drops everything cached about `project`, plus the owner's project list.
    pub fn invalidate_project(&self, owner: Option<&str>, project: &ProjectId) -> Result<()> {
        self.invalidate(&CacheKey::tasks(project))?;
        self.invalidate(&CacheKey::project(project))?;
        if let Some(owner) = owner {
            self.invalidate(&CacheKey::projects(owner))?;
        }
        Ok(())
    }

    pub fn preference(&self, name: &str) -> Result<Option<String>> {
        self.connection
            .query_row(SELECT_PREFERENCE_SQL, params![name], |row| row.get(0))
            .optional()
            .cache_context("Failed to read preference")
    }

    pub fn set_preference(&self, name: &str, value: &str) -> Result<()> {
        self.connection
            .execute(UPSERT_PREFERENCE_SQL, params![name, value])
            .cache_context("Failed to write preference")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{Task, TaskId};

    fn cache() -> Cache {
        Cache::in_memory(CacheTtl::default()).unwrap()
    }

    fn tasks() -> Vec<Task> {
        vec![Task::new(1, "One"), Task::new(2, "Two")]
    }

    #[test]
    fn test_hit_within_ttl_and_miss_after() {
        let cache = cache();
        let key = CacheKey::tasks(&ProjectId::new("p1"));
        let fetched = Timestamp::now();
        cache.set_at(&key, &tasks(), fetched).unwrap();

        let fresh = fetched + jiff::SignedDuration::from_secs(299);
        let cached: Option<Vec<Task>> = cache.get_at(&key, fresh).unwrap();
        assert_eq!(cached.map(|t| t.len()), Some(2));

        let stale = fetched + jiff::SignedDuration::from_secs(300);
        let cached: Option<Vec<Task>> = cache.get_at(&key, stale).unwrap();
        assert!(cached.is_none());
    }

    #[test]
    fn test_ttl_depends_on_key_kind() {
        let cache = cache();
        let fetched = Timestamp::now();
        let later = fetched + jiff::SignedDuration::from_secs(45);

        let projects = CacheKey::projects("u1");
        let project = CacheKey::project(&ProjectId::new("p1"));
        cache.set_at(&projects, &Vec::<String>::new(), fetched).unwrap();
        cache.set_at(&project, "meta", fetched).unwrap();

        assert!(cache.get_at::<Vec<String>>(&projects, later).unwrap().is_some());
        assert!(cache.get_at::<String>(&project, later).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_payload_is_a_miss_and_is_dropped() {
        let cache = cache();
        let key = CacheKey::tasks(&ProjectId::new("p1"));
        cache.set(&key, "not a task list").unwrap();

        assert!(cache.get::<Vec<Task>>(&key).unwrap().is_none());
        assert!(!cache.invalidate(&key).unwrap());
    }

    #[test]
    fn test_invalidate_project_clears_related_keys() {
        let cache = cache();
        let project = ProjectId::new("p1");
        cache.set(&CacheKey::tasks(&project), &tasks()).unwrap();
        cache.set(&CacheKey::project(&project), "meta").unwrap();
        cache.set(&CacheKey::projects("u1"), "list").unwrap();
        cache.set(&CacheKey::projects("u2"), "list").unwrap();

        cache.invalidate_project(Some("u1"), &project).unwrap();

        assert!(cache.get::<Vec<Task>>(&CacheKey::tasks(&project)).unwrap().is_none());
        assert!(cache.get::<String>(&CacheKey::project(&project)).unwrap().is_none());
        assert!(cache.get::<String>(&CacheKey::projects("u1")).unwrap().is_none());
        assert!(cache.get::<String>(&CacheKey::projects("u2")).unwrap().is_some());
    }

    #[test]
    fn test_entries_and_preferences_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.db");
        let key = CacheKey::tasks(&ProjectId::new("p1"));
        {
            let cache = Cache::open(&path, CacheTtl::default()).unwrap();
            cache.set(&key, &tasks()).unwrap();
            cache.set_preference("view_mode", "status").unwrap();
        }

        let cache = Cache::open(&path, CacheTtl::default()).unwrap();
        let cached: Vec<Task> = cache.get(&key).unwrap().expect("entry persisted");
        assert_eq!(cached[1].id, TaskId::from(2));
        assert_eq!(cache.preference("view_mode").unwrap().as_deref(), Some("status"));
        assert_eq!(cache.preference("missing").unwrap(), None);
    }

    #[test]
    fn test_key_strings() {
        let project = ProjectId::new("42");
        assert_eq!(CacheKey::projects("u1").to_string(), "projects:u1");
        assert_eq!(CacheKey::tasks(&project).to_string(), "tasks:42");
        assert_eq!(CacheKey::project(&project).to_string(), "project:42");
    }
}
