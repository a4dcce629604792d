//! SQLite persistence for creature snapshots.
//!
//! Each [`CreatureSnapshot`] is stored as a JSON blob keyed by creature id:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS creature_snapshots (
//!     creature_id TEXT PRIMARY KEY,
//!     name        TEXT NOT NULL,
//!     data        BLOB NOT NULL,
//!     updated_at  TEXT NOT NULL,
//!     checksum    TEXT
//! );
//! ```
//!
//! - WAL mode for concurrent reads while the simulation runs
//! - JSON in a BLOB column keeps the schema stable as snapshots evolve
//! - Optional CRC-32 checksum flags corrupted saves
//! - Backups via SQLite's online-backup API

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::Result;
use crate::snapshot::CreatureSnapshot;
use crate::types::CreatureId;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS creature_snapshots (
    creature_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    data        BLOB NOT NULL,
    updated_at  TEXT NOT NULL,
    checksum    TEXT
);";

/// CRC-32 (ISO 3309) of `data` as lowercase hex.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

/// Handle to an open snapshot database.
///
/// ```no_run
/// # use minipoll_core::persistence::SnapshotStore;
/// # use minipoll_core::config::PersistenceConfig;
/// let store = SnapshotStore::open("colony.db", &PersistenceConfig::default())?;
/// println!("{} creatures saved", store.count()?);
/// # Ok::<(), minipoll_core::error::MinipollError>(())
/// ```
pub struct SnapshotStore {
    conn: Connection,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SnapshotStore {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    /// Returns [`MinipollError::Database`](crate::MinipollError::Database) on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), wal = config.wal_mode, "Snapshot store opened");
        Ok(Self {
            conn,
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns [`MinipollError::Database`](crate::MinipollError::Database) on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn,
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Save (upsert) one snapshot.
    ///
    /// # Errors
    /// Returns a serialization or database error.
    pub fn save(&self, snapshot: &CreatureSnapshot) -> Result<()> {
        let start = Instant::now();
        let bytes = self.upsert(snapshot)?;
        debug!(
            creature = %snapshot.id,
            memories = snapshot.memories.len(),
            bytes,
            elapsed_us = start.elapsed().as_micros(),
            "Saved creature snapshot"
        );
        Ok(())
    }

    /// Save many snapshots in one transaction.
    ///
    /// # Errors
    /// Returns a serialization or database error; nothing is written then.
    pub fn save_batch<'a, I>(&self, snapshots: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a CreatureSnapshot>,
    {
        let start = Instant::now();
        let tx = self.conn.unchecked_transaction()?;
        let mut saved = 0;
        for snapshot in snapshots {
            self.upsert(snapshot)?;
            saved += 1;
        }
        tx.commit()?;
        info!(saved, elapsed_ms = start.elapsed().as_millis(), "Saved snapshot batch");
        Ok(saved)
    }

    /// Load one snapshot, or `None` if the creature was never saved.
    ///
    /// A checksum mismatch is logged but the data is still returned.
    ///
    /// # Errors
    /// Returns a serialization or database error.
    pub fn load(&self, id: CreatureId) -> Result<Option<CreatureSnapshot>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT data, checksum FROM creature_snapshots WHERE creature_id = ?1")?;
        let row: Option<(Vec<u8>, Option<String>)> = stmt
            .query_row(params![id.0.to_string()], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;

        let Some((data, stored_checksum)) = row else {
            return Ok(None);
        };
        self.verify(id, &data, stored_checksum.as_deref());
        CreatureSnapshot::from_json(&data).map(Some)
    }

    /// Load every stored snapshot, ordered by creature id.
    ///
    /// # Errors
    /// Returns a serialization or database error.
    pub fn load_all(&self) -> Result<Vec<CreatureSnapshot>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT creature_id, data, checksum FROM creature_snapshots ORDER BY creature_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut snapshots = Vec::new();
        for row in rows {
            let (id_str, data, checksum) = row?;
            if let Ok(uuid) = uuid::Uuid::parse_str(&id_str) {
                self.verify(CreatureId(uuid), &data, checksum.as_deref());
            }
            snapshots.push(CreatureSnapshot::from_json(&data)?);
        }
        Ok(snapshots)
    }

    /// Delete a snapshot. Returns `true` if a row was removed.
    ///
    /// # Errors
    /// Returns a database error.
    pub fn delete(&self, id: CreatureId) -> Result<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM creature_snapshots WHERE creature_id = ?1",
            params![id.0.to_string()],
        )?;
        Ok(deleted > 0)
    }

    /// Ids of every saved creature.
    ///
    /// # Errors
    /// Returns a database error.
    pub fn list(&self) -> Result<Vec<CreatureId>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT creature_id FROM creature_snapshots ORDER BY creature_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            let id_str = row?;
            match uuid::Uuid::parse_str(&id_str) {
                Ok(uuid) => ids.push(CreatureId(uuid)),
                Err(_) => warn!(id = %id_str, "Skipping row with invalid UUID"),
            }
        }
        Ok(ids)
    }

    /// Number of saved creatures.
    ///
    /// # Errors
    /// Returns a database error.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM creature_snapshots", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Copy the database to `dest_path` with the online-backup API.
    ///
    /// # Errors
    /// Returns a database error.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&self.conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;
        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Snapshot backup completed"
        );
        Ok(())
    }

    /// Run `PRAGMA integrity_check`.
    ///
    /// # Errors
    /// Returns a database error if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Path of the database (`:memory:` for in-memory stores).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn upsert(&self, snapshot: &CreatureSnapshot) -> Result<usize> {
        let json = snapshot.to_json()?;
        let checksum = self.config.checksum_enabled.then(|| crc32_hex(&json));
        self.conn.execute(
            "INSERT INTO creature_snapshots (creature_id, name, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(creature_id) DO UPDATE SET
                name = excluded.name,
                data = excluded.data,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![
                snapshot.id.0.to_string(),
                snapshot.name,
                json,
                Utc::now().to_rfc3339(),
                checksum
            ],
        )?;
        Ok(json.len())
    }

    fn verify(&self, id: CreatureId, data: &[u8], stored: Option<&str>) {
        if !self.config.checksum_enabled {
            return;
        }
        if let Some(expected) = stored {
            let actual = crc32_hex(data);
            if expected != actual {
                warn!(creature = %id, %expected, %actual, "Checksum mismatch, save may be corrupt");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{HealthSnapshot, NeedValue, SNAPSHOT_VERSION};
    use crate::types::Position;

    fn sample(name: &str) -> CreatureSnapshot {
        CreatureSnapshot {
            version: SNAPSHOT_VERSION,
            id: CreatureId::new(),
            name: name.to_string(),
            position: Position::default(),
            saved_at: Utc::now(),
            stats: Vec::new(),
            needs: vec![NeedValue {
                name: "thirst".to_string(),
                value: 33.0,
            }],
            emotions: Vec::new(),
            memories: Vec::new(),
            memory_clock: 0.0,
            health: HealthSnapshot {
                current: 55.0,
                max: 100.0,
                critical: false,
                dead: false,
            },
            current_goal: None,
            profile: None,
        }
    }

    fn store() -> SnapshotStore {
        SnapshotStore::open_in_memory(&PersistenceConfig::default()).expect("open")
    }

    #[test]
    fn round_trip_save_load() {
        let store = store();
        let snapshot = sample("Pip");
        store.save(&snapshot).expect("save");
        let loaded = store.load(snapshot.id).expect("load").expect("Some");
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn load_missing_returns_none() {
        assert!(store().load(CreatureId::new()).expect("load").is_none());
    }

    #[test]
    fn upsert_overwrites() {
        let store = store();
        let mut snapshot = sample("Pip");
        store.save(&snapshot).expect("save");
        snapshot.health.current = 12.0;
        store.save(&snapshot).expect("save again");
        let loaded = store.load(snapshot.id).expect("load").expect("Some");
        assert!((loaded.health.current - 12.0).abs() < f32::EPSILON);
        assert_eq!(store.count().expect("count"), 1);
    }

    #[test]
    fn batch_list_and_delete() {
        let store = store();
        let snapshots = vec![sample("a"), sample("b"), sample("c")];
        assert_eq!(store.save_batch(&snapshots).expect("batch"), 3);
        assert_eq!(store.list().expect("list").len(), 3);
        assert_eq!(store.load_all().expect("all").len(), 3);

        assert!(store.delete(snapshots[0].id).expect("delete"));
        assert!(!store.delete(snapshots[0].id).expect("delete again"));
        assert_eq!(store.count().expect("count"), 2);
    }

    #[test]
    fn corrupt_checksum_still_loads() {
        let store = store();
        let snapshot = sample("Pip");
        store.save(&snapshot).expect("save");
        store
            .conn
            .execute(
                "UPDATE creature_snapshots SET checksum = 'deadbeef' WHERE creature_id = ?1",
                params![snapshot.id.0.to_string()],
            )
            .expect("corrupt checksum");
        assert!(store.load(snapshot.id).expect("load").is_some());
    }

    #[test]
    fn integrity_check_passes() {
        assert!(store().integrity_check().expect("check"));
    }

    #[test]
    fn crc32_known_vector() {
        assert_eq!(crc32_compute(b"123456789"), 0xCBF4_3926);
    }
}
