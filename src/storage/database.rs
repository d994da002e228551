//! SQLite-backed persistence for users, vitals and alerts
//!
//! A single connection sits behind a `std::sync::Mutex`. Every method takes
//! the lock for one statement or one transaction and never holds it across
//! an `.await`, so handlers can call these methods directly.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{Alert, NewAlert, NewUser, NewVital, Role, Severity, User, Vital};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL,
        full_name TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS vitals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        timestamp INTEGER NOT NULL,
        type TEXT NOT NULL,
        value REAL NOT NULL,
        unit TEXT NOT NULL,
        is_abnormal INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_vitals_user_time ON vitals(user_id, timestamp);

    CREATE TABLE IF NOT EXISTS alerts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        created_at INTEGER NOT NULL,
        severity TEXT NOT NULL,
        message TEXT NOT NULL,
        resolved INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_alerts_user_time ON alerts(user_id, created_at);
";

/// Companion database handle
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) a database file and apply the schema
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Self {
            conn: Mutex::new(conn),
            path: Some(path),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Open a private in-memory database (tests, demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> StorageResult<()> {
        self.lock()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Cheap connectivity check used by readiness probes
    pub fn ping(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    // ============================================
    // Users
    // ============================================

    /// Insert a new user. Fails with `Conflict` when the username is taken.
    pub fn create_user(&self, new_user: NewUser) -> StorageResult<User> {
        let created_at = Utc::now();
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO users (username, password_hash, role, full_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new_user.username,
                new_user.password_hash,
                new_user.role.as_str(),
                new_user.full_name,
                created_at.timestamp_millis(),
            ],
        )?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: new_user.username,
            password_hash: new_user.password_hash,
            role: new_user.role,
            full_name: new_user.full_name,
            created_at: millis_to_datetime(created_at.timestamp_millis())?,
        })
    }

    /// Look up a user by username
    pub fn find_user(&self, username: &str) -> StorageResult<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, username, password_hash, role, full_name, created_at
                 FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Number of registered users
    pub fn user_count(&self) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ============================================
    // Vitals and alerts
    // ============================================

    /// Store one reading, plus its alert when one was raised, atomically
    pub fn record_vital(
        &self,
        user_id: i64,
        vital: NewVital,
        alert: Option<NewAlert>,
    ) -> StorageResult<Vital> {
        let mut stored = self.record_vitals(user_id, vec![(vital, alert)])?;
        stored
            .pop()
            .ok_or_else(|| StorageError::Corruption("insert returned no vital".to_string()))
    }

    /// Store many readings in a single transaction: either all land or none do
    pub fn record_vitals(
        &self,
        user_id: i64,
        readings: Vec<(NewVital, Option<NewAlert>)>,
    ) -> StorageResult<Vec<Vital>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut stored = Vec::with_capacity(readings.len());

        {
            let mut vital_stmt = tx.prepare_cached(
                "INSERT INTO vitals (user_id, timestamp, type, value, unit, is_abnormal)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut alert_stmt = tx.prepare_cached(
                "INSERT INTO alerts (user_id, created_at, severity, message, resolved)
                 VALUES (?1, ?2, ?3, ?4, 0)",
            )?;

            for (vital, alert) in readings {
                let ts = vital.timestamp.timestamp_millis();

                if let Some(alert) = alert {
                    alert_stmt.execute(params![
                        user_id,
                        ts,
                        alert.severity.as_str(),
                        alert.message
                    ])?;
                }

                vital_stmt.execute(params![
                    user_id,
                    ts,
                    vital.vital_type,
                    vital.value,
                    vital.unit,
                    vital.is_abnormal
                ])?;

                stored.push(Vital {
                    id: tx.last_insert_rowid(),
                    user_id,
                    timestamp: millis_to_datetime(ts)?,
                    vital_type: vital.vital_type,
                    value: vital.value,
                    unit: vital.unit,
                    is_abnormal: vital.is_abnormal,
                });
            }
        }

        tx.commit()?;
        Ok(stored)
    }

    /// Most recent readings for a user, newest first
    pub fn recent_vitals(&self, user_id: i64, limit: usize) -> StorageResult<Vec<Vital>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, user_id, timestamp, type, value, unit, is_abnormal
             FROM vitals WHERE user_id = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id, limit as i64], row_to_vital)?;
        let vitals = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(vitals)
    }

    /// Most recent alerts for a user, newest first
    pub fn recent_alerts(&self, user_id: i64, limit: usize) -> StorageResult<Vec<Alert>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, user_id, created_at, severity, message, resolved
             FROM alerts WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id, limit as i64], row_to_alert)?;
        let alerts = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(alerts)
    }

    /// Mark an alert resolved. The alert must belong to `user_id`.
    pub fn resolve_alert(&self, user_id: i64, alert_id: i64) -> StorageResult<Alert> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE alerts SET resolved = 1 WHERE id = ?1 AND user_id = ?2",
            params![alert_id, user_id],
        )?;

        if changed == 0 {
            return Err(StorageError::NotFound(format!("alert {}", alert_id)));
        }

        let alert = conn.query_row(
            "SELECT id, user_id, created_at, severity, message, resolved
             FROM alerts WHERE id = ?1",
            params![alert_id],
            row_to_alert,
        )?;
        Ok(alert)
    }
}

fn millis_to_datetime(ms: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StorageError::Corruption(format!("timestamp out of range: {}", ms)))
}

/// Decode helper so row mappers can report bad column values through rusqlite
fn decode_err(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(StorageError::Corruption(msg)),
    )
}

fn column_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| decode_err(idx, format!("timestamp out of range: {}", ms)))
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: role.parse::<Role>().map_err(|e| decode_err(3, e))?,
        full_name: row.get(4)?,
        created_at: column_datetime(row, 5)?,
    })
}

fn row_to_vital(row: &Row<'_>) -> rusqlite::Result<Vital> {
    Ok(Vital {
        id: row.get(0)?,
        user_id: row.get(1)?,
        timestamp: column_datetime(row, 2)?,
        vital_type: row.get(3)?,
        value: row.get(4)?,
        unit: row.get(5)?,
        is_abnormal: row.get(6)?,
    })
}

fn row_to_alert(row: &Row<'_>) -> rusqlite::Result<Alert> {
    let severity: String = row.get(3)?;
    Ok(Alert {
        id: row.get(0)?,
        user_id: row.get(1)?,
        created_at: column_datetime(row, 2)?,
        severity: severity.parse::<Severity>().map_err(|e| decode_err(3, e))?,
        message: row.get(4)?,
        resolved: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn sample_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            role: Role::Elderly,
            full_name: "Joe Smith".to_string(),
        }
    }

    #[test]
    fn test_create_and_find_user() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(sample_user("grandpa_joe")).unwrap();

        let found = db.find_user("grandpa_joe").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.full_name, "Joe Smith");
        assert_eq!(found.role, Role::Elderly);
        assert!(db.find_user("nobody").unwrap().is_none());
        assert_eq!(db.user_count().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_username_is_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(sample_user("grandpa_joe")).unwrap();

        let err = db.create_user(sample_user("grandpa_joe")).unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[test]
    fn test_record_vital_with_alert() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(sample_user("grandpa_joe")).unwrap();

        let vital = NewVital::new("heart_rate", 120.0, "bpm").abnormal(true);
        let alert = NewAlert::new(Severity::Medium, "Abnormal HR detected (120.0 bpm)");
        let stored = db.record_vital(user.id, vital, Some(alert)).unwrap();
        assert!(stored.is_abnormal);

        let alerts = db.recent_alerts(user.id, 5).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Medium);
        assert!(!alerts[0].resolved);
    }

    #[test]
    fn test_recent_vitals_newest_first_and_limited() {
        let db = Database::open_in_memory().unwrap();
        let user = db.create_user(sample_user("grandpa_joe")).unwrap();
        let base = Utc::now();

        for i in 0..10 {
            let vital = NewVital::new("heart_rate", 60.0 + i as f64, "bpm")
                .at(base + Duration::minutes(i));
            db.record_vital(user.id, vital, None).unwrap();
        }

        let recent = db.recent_vitals(user.id, 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].value, 69.0);
        assert_eq!(recent[2].value, 67.0);
    }

    #[test]
    fn test_batch_rolls_back_on_failure() {
        let db = Database::open_in_memory().unwrap();

        // user 999 does not exist, so the foreign key rejects the first insert
        let readings = vec![
            (NewVital::new("spo2", 98.0, "%"), None),
            (NewVital::new("glucose", 100.0, "mg/dL"), None),
        ];
        assert!(db.record_vitals(999, readings).is_err());

        let user = db.create_user(sample_user("grandpa_joe")).unwrap();
        assert!(db.recent_vitals(user.id, 50).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_alert_requires_owner() {
        let db = Database::open_in_memory().unwrap();
        let joe = db.create_user(sample_user("grandpa_joe")).unwrap();
        let sarah = db.create_user(sample_user("nurse_sarah")).unwrap();

        let vital = NewVital::new("spo2", 90.0, "%").abnormal(true);
        db.record_vital(joe.id, vital, Some(NewAlert::new(Severity::Medium, "Low SpO2")))
            .unwrap();
        let alert_id = db.recent_alerts(joe.id, 1).unwrap()[0].id;

        assert!(matches!(
            db.resolve_alert(sarah.id, alert_id),
            Err(StorageError::NotFound(_))
        ));

        let resolved = db.resolve_alert(joe.id, alert_id).unwrap();
        assert!(resolved.resolved);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("companion.db");

        {
            let db = Database::open(&path).unwrap();
            db.create_user(sample_user("grandpa_joe")).unwrap();
            db.ping().unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
        assert!(db.find_user("grandpa_joe").unwrap().is_some());
    }
}
