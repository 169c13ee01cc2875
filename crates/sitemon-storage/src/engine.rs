use crate::error::{Result, StorageError};
use crate::{AlertQuery, AlertStore, MuteStore};
use rusqlite::{params, Connection};
use sitemon_common::clock::Clock;
use sitemon_common::types::{Alert, AlertMetadata, Mute, NewAlert, Severity};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const ALERTS_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    target_id TEXT NOT NULL,
    severity TEXT NOT NULL,
    reason TEXT NOT NULL,
    metadata TEXT,
    raised_at INTEGER NOT NULL,
    acknowledged INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_alerts_target_time ON alerts(target_id, raised_at);
CREATE INDEX IF NOT EXISTS idx_alerts_time ON alerts(raised_at);
";

const MUTES_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS mutes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    target_id TEXT NOT NULL,
    until INTEGER NOT NULL,
    reason TEXT,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_mutes_target_until ON mutes(target_id, until);
";

const ALERT_COLUMNS: &str = "id, target_id, severity, reason, metadata, raised_at, acknowledged";

/// Raw alert columns as read from SQLite, before domain conversion.
type AlertRecord = (i64, String, String, String, Option<String>, i64, bool);

/// Alert and mute store backed by a single SQLite connection.
///
/// Identifiers come from `AUTOINCREMENT`, so they grow monotonically and are
/// never reused even after rows are removed by an external retention job.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path`, creating parent
    /// directories as needed.
    pub fn open(path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self::init(conn, clock)?;
        tracing::info!(path = %path.display(), "Initialized alert store");
        Ok(store)
    }

    pub fn open_in_memory(clock: Arc<dyn Clock>) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, clock)
    }

    fn init(conn: Connection, clock: Arc<dyn Clock>) -> Result<Self> {
        conn.execute_batch(ALERTS_SCHEMA)?;
        conn.execute_batch(MUTES_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    /// Lock the connection, recovering from a poisoned Mutex if necessary.
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn alert_from_record(record: AlertRecord) -> Result<Alert> {
    let (id, target_id, severity, reason, metadata, raised_at, acknowledged) = record;
    let severity = severity
        .parse::<Severity>()
        .map_err(|_| StorageError::UnexpectedColumnValue {
            column: "severity",
            value: severity,
        })?;
    let metadata = metadata
        .map(|raw| serde_json::from_str::<AlertMetadata>(&raw))
        .transpose()?;
    Ok(Alert {
        id,
        target_id,
        severity,
        reason,
        metadata,
        raised_at,
        acknowledged,
    })
}

fn read_alert_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AlertRecord> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn read_mute(row: &rusqlite::Row<'_>) -> rusqlite::Result<Mute> {
    Ok(Mute {
        id: row.get(0)?,
        target_id: row.get(1)?,
        until: row.get(2)?,
        reason: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl AlertStore for SqliteStore {
    fn add_alert(&self, alert: &NewAlert) -> Result<Alert> {
        let raised_at = self.clock.now_millis();
        let metadata_json = alert
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO alerts (target_id, severity, reason, metadata, raised_at, acknowledged)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![
                &alert.target_id,
                alert.severity.as_str(),
                &alert.reason,
                metadata_json,
                raised_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        tracing::debug!(
            alert_id = id,
            target_id = %alert.target_id,
            severity = %alert.severity,
            "Alert recorded"
        );

        Ok(Alert {
            id,
            target_id: alert.target_id.clone(),
            severity: alert.severity,
            reason: alert.reason.clone(),
            metadata: alert.metadata.clone(),
            raised_at,
            acknowledged: false,
        })
    }

    fn list_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>> {
        let mut sql = format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE 1 = 1");
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(since) = query.since_time {
            params.push(Box::new(since));
            sql.push_str(&format!(" AND raised_at >= ?{}", params.len()));
        }
        if let Some(ref target_id) = query.target_id {
            params.push(Box::new(target_id.clone()));
            sql.push_str(&format!(" AND target_id = ?{}", params.len()));
        }

        // usize beyond i64::MAX is effectively unbounded
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        params.push(Box::new(limit));
        sql.push_str(&format!(
            " ORDER BY raised_at DESC, id DESC LIMIT ?{}",
            params.len()
        ));

        let records = {
            let conn = self.lock_conn();
            let mut stmt = conn.prepare(&sql)?;
            let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                params.iter().map(|p| p.as_ref()).collect();
            let rows = stmt.query_map(param_refs.as_slice(), read_alert_record)?;
            let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            records
        };

        records.into_iter().map(alert_from_record).collect()
    }

    fn get_alert(&self, id: i64) -> Result<Option<Alert>> {
        let record = {
            let conn = self.lock_conn();
            let mut stmt =
                conn.prepare_cached(&format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"))?;
            let mut rows = stmt.query_map(params![id], read_alert_record)?;
            let first = rows.next().transpose()?;
            first
        };
        record.map(alert_from_record).transpose()
    }

    fn acknowledge_alert(&self, id: i64) -> Result<bool> {
        let conn = self.lock_conn();
        let updated = conn.execute(
            "UPDATE alerts SET acknowledged = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(updated > 0)
    }

    fn ping(&self) -> Result<()> {
        let conn = self.lock_conn();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

impl MuteStore for SqliteStore {
    fn mute(&self, target_id: &str, until: i64, reason: Option<&str>) -> Result<Mute> {
        let created_at = self.clock.now_millis();
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO mutes (target_id, until, reason, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![target_id, until, reason, created_at],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        tracing::info!(mute_id = id, target_id, until, "Target muted");

        Ok(Mute {
            id,
            target_id: target_id.to_string(),
            until,
            reason: reason.map(str::to_string),
            created_at,
        })
    }

    fn is_muted(&self, target_id: &str, at: i64) -> Result<bool> {
        let conn = self.lock_conn();
        let muted: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM mutes WHERE target_id = ?1 AND until > ?2)",
            params![target_id, at],
            |row| row.get(0),
        )?;
        Ok(muted)
    }

    fn active_mutes(&self, target_id: &str, at: i64) -> Result<Vec<Mute>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(
            "SELECT id, target_id, until, reason, created_at FROM mutes
             WHERE target_id = ?1 AND until > ?2
             ORDER BY until DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![target_id, at], read_mute)?;
        let mutes = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(mutes)
    }
}
