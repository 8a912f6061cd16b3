//! Creates the `users` table and migrates the older layouts into it.
//!
//! The bot has shipped three layouts of `users` over time:
//!
//! | layout | key | cooldown |
//! |---|---|---|
//! | [`LegacyShape::IntegerKeyed`] | `discord_id INTEGER` | none |
//! | [`LegacyShape::TextKeyed`] | `discord_id TEXT` | none |
//! | [`LegacyShape::IntegerKeyedWithCooldown`] | `discord_id INTEGER` | `event_time TIMESTAMP` |
//!
//! All of them hold the balance in `currency`. The current layout is
//! `users(identity, balance, cooldown_until)` with the cooldown stored as UTC
//! epoch seconds. [`ensure_schema`] brings any of the above to it inside a
//! single transaction, so a failed migration leaves the old table untouched.

use super::error::LedgerError;
use super::init::DbPool;
use super::models::Identity;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{error, info, instrument};

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        identity       INTEGER PRIMARY KEY NOT NULL,
        balance        INTEGER NOT NULL,
        cooldown_until INTEGER
    )
"#;

const LEGACY_TABLE: &str = "users_legacy_migration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyShape {
    IntegerKeyed,
    TextKeyed,
    IntegerKeyedWithCooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    /// No `users` table existed; it was created empty.
    Created,
    /// Already in the current layout. Nothing was written.
    Current,
    /// A legacy table was rewritten; `rows` accounts were carried over.
    Migrated { from: LegacyShape, rows: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Missing,
    Current,
    Legacy(LegacyShape),
}

/// Idempotent: safe to call on every startup.
#[instrument(level = "debug", skip(pool))]
pub async fn ensure_schema(pool: &DbPool) -> Result<SchemaStatus, LedgerError> {
    let status = ensure_schema_inner(pool).await.map_err(|e| {
        let err = match e {
            LedgerError::Schema(_) => e,
            other => LedgerError::Schema(other.to_string()),
        };
        error!(target = "ledger.schema", error = %err, "could not prepare users table");
        err
    })?;
    match status {
        SchemaStatus::Created => info!(target = "ledger.schema", "created users table"),
        SchemaStatus::Current => info!(target = "ledger.schema", "users table up to date"),
        SchemaStatus::Migrated { from, rows } => {
            info!(target = "ledger.schema", ?from, rows, "migrated legacy users table")
        }
    }
    Ok(status)
}

async fn ensure_schema_inner(pool: &DbPool) -> Result<SchemaStatus, LedgerError> {
    let mut tx = pool.begin().await?;
    let status = match detect_shape(&mut tx).await? {
        Shape::Missing => {
            sqlx::query(CREATE_USERS).execute(&mut *tx).await?;
            SchemaStatus::Created
        }
        Shape::Current => SchemaStatus::Current,
        Shape::Legacy(from) => {
            let rows = migrate_legacy(&mut tx, from).await?;
            SchemaStatus::Migrated { from, rows }
        }
    };
    tx.commit().await?;
    Ok(status)
}

async fn detect_shape(conn: &mut SqliteConnection) -> Result<Shape, LedgerError> {
    let columns: Vec<(String, String)> =
        sqlx::query_as("SELECT name, type FROM pragma_table_info('users')")
            .fetch_all(&mut *conn)
            .await?;
    classify(&columns)
}

/// Decides the layout from `(column name, declared type)` pairs.
fn classify(columns: &[(String, String)]) -> Result<Shape, LedgerError> {
    if columns.is_empty() {
        return Ok(Shape::Missing);
    }
    let declared = |name: &str| {
        columns
            .iter()
            .find(|(col, _)| col.eq_ignore_ascii_case(name))
            .map(|(_, ty)| ty.to_ascii_uppercase())
    };

    if declared("identity").is_some()
        && declared("balance").is_some()
        && declared("cooldown_until").is_some()
    {
        return Ok(Shape::Current);
    }

    match (declared("discord_id"), declared("currency")) {
        (Some(key_type), Some(_)) => {
            // SQLite affinity rules: anything mentioning INT is an integer column.
            let text_key = !key_type.contains("INT");
            let shape = match (text_key, declared("event_time").is_some()) {
                (true, _) => LegacyShape::TextKeyed,
                (false, true) => LegacyShape::IntegerKeyedWithCooldown,
                (false, false) => LegacyShape::IntegerKeyed,
            };
            Ok(Shape::Legacy(shape))
        }
        _ => {
            let names: Vec<&str> = columns.iter().map(|(name, _)| name.as_str()).collect();
            Err(LedgerError::Schema(format!(
                "unrecognised users table columns: {}",
                names.join(", ")
            )))
        }
    }
}

/// Row of the legacy table, with each value's storage class kept so integer and
/// text encodings of the same value can be told apart.
#[derive(sqlx::FromRow)]
struct LegacyRow {
    key_text: String,
    currency: i64,
    event_kind: String,
    event_text: Option<String>,
}

async fn migrate_legacy(
    conn: &mut SqliteConnection,
    from: LegacyShape,
) -> Result<u64, LedgerError> {
    sqlx::query(&format!("ALTER TABLE users RENAME TO {LEGACY_TABLE}"))
        .execute(&mut *conn)
        .await?;
    sqlx::query(CREATE_USERS).execute(&mut *conn).await?;

    let has_event_time: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM pragma_table_info('{LEGACY_TABLE}') WHERE name = 'event_time'"
    ))
    .fetch_one(&mut *conn)
    .await?;
    let event_columns = if has_event_time > 0 {
        "typeof(event_time) AS event_kind, CAST(event_time AS TEXT) AS event_text"
    } else {
        "'null' AS event_kind, NULL AS event_text"
    };
    let rows: Vec<LegacyRow> = sqlx::query_as(&format!(
        "SELECT CAST(discord_id AS TEXT) AS key_text, currency, {event_columns} FROM {LEGACY_TABLE}"
    ))
    .fetch_all(&mut *conn)
    .await?;

    let mut carried = 0u64;
    for row in rows {
        let identity = parse_legacy_identity(&row.key_text)?;
        let cooldown_until = parse_legacy_cooldown(&row.event_kind, row.event_text.as_deref())?;
        let inserted = sqlx::query(
            "INSERT INTO users (identity, balance, cooldown_until) VALUES (?1, ?2, ?3) \
             ON CONFLICT(identity) DO NOTHING",
        )
        .bind(identity.to_db())
        .bind(row.currency)
        .bind(cooldown_until)
        .execute(&mut *conn)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(LedgerError::Schema(format!(
                "legacy rows collide on identity {identity} (from '{}')",
                row.key_text
            )));
        }
        carried += 1;
    }

    sqlx::query(&format!("DROP TABLE {LEGACY_TABLE}"))
        .execute(&mut *conn)
        .await?;
    info!(target = "ledger.schema", ?from, rows = carried, "legacy rows copied");
    Ok(carried)
}

fn parse_legacy_identity(raw: &str) -> Result<Identity, LedgerError> {
    raw.trim()
        .parse::<u64>()
        .map(Identity)
        .map_err(|_| LedgerError::Schema(format!("legacy discord_id '{raw}' is not a u64")))
}

/// Returns epoch seconds. Sub-second values round up so a cooldown never ends early.
fn parse_legacy_cooldown(kind: &str, raw: Option<&str>) -> Result<Option<i64>, LedgerError> {
    let invalid = || {
        LedgerError::Schema(format!(
            "legacy event_time '{}' is not a timestamp",
            raw.unwrap_or_default()
        ))
    };
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    match kind {
        "null" => Ok(None),
        "integer" => raw.parse::<i64>().map(Some).map_err(|_| invalid()),
        "real" => raw
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite())
            .map(|secs| Some(secs.ceil() as i64))
            .ok_or_else(invalid),
        _ => parse_timestamp_text(raw)
            .map(|at| {
                let secs = at.timestamp();
                Some(if at.timestamp_subsec_nanos() > 0 { secs + 1 } else { secs })
            })
            .ok_or_else(invalid),
    }
}

fn parse_timestamp_text(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(at) = DateTime::parse_from_str(raw, fmt) {
            return Some(at.with_timezone(&Utc));
        }
    }
    // No offset: the bot always wrote UTC.
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn classifies_every_known_layout() {
        assert_eq!(classify(&[]).unwrap(), Shape::Missing);
        assert_eq!(
            classify(&cols(&[
                ("identity", "INTEGER"),
                ("balance", "INTEGER"),
                ("cooldown_until", "INTEGER")
            ]))
            .unwrap(),
            Shape::Current
        );
        assert_eq!(
            classify(&cols(&[("discord_id", "INTEGER"), ("currency", "INTEGER")])).unwrap(),
            Shape::Legacy(LegacyShape::IntegerKeyed)
        );
        assert_eq!(
            classify(&cols(&[("discord_id", "TEXT"), ("currency", "INTEGER")])).unwrap(),
            Shape::Legacy(LegacyShape::TextKeyed)
        );
        assert_eq!(
            classify(&cols(&[
                ("discord_id", "INTEGER"),
                ("currency", "INTEGER"),
                ("event_time", "timestamp")
            ]))
            .unwrap(),
            Shape::Legacy(LegacyShape::IntegerKeyedWithCooldown)
        );
    }

    #[test]
    fn unknown_layout_is_a_schema_error() {
        let err = classify(&cols(&[("id", "INTEGER"), ("coins", "INTEGER")])).unwrap_err();
        assert!(matches!(err, LedgerError::Schema(msg) if msg.contains("coins")));
    }

    #[test]
    fn legacy_identity_parsing() {
        assert_eq!(parse_legacy_identity(" 42 ").unwrap(), Identity(42));
        assert_eq!(
            parse_legacy_identity("18446744073709551615").unwrap(),
            Identity(u64::MAX)
        );
        assert!(parse_legacy_identity("abc").is_err());
        assert!(parse_legacy_identity("-1").is_err());
    }

    #[test]
    fn legacy_cooldown_formats() {
        assert_eq!(parse_legacy_cooldown("null", None).unwrap(), None);
        assert_eq!(
            parse_legacy_cooldown("integer", Some("1700000000")).unwrap(),
            Some(1_700_000_000)
        );
        assert_eq!(
            parse_legacy_cooldown("real", Some("1700000000.25")).unwrap(),
            Some(1_700_000_001)
        );
        assert_eq!(
            parse_legacy_cooldown("text", Some("2023-11-14 22:13:20+00:00")).unwrap(),
            Some(1_700_000_000)
        );
        assert_eq!(
            parse_legacy_cooldown("text", Some("2023-11-14T22:13:20.500000+00:00")).unwrap(),
            Some(1_700_000_001)
        );
        assert_eq!(
            parse_legacy_cooldown("text", Some("2023-11-15 00:13:20+02:00")).unwrap(),
            Some(1_700_000_000)
        );
        assert_eq!(
            parse_legacy_cooldown("text", Some("2023-11-14 22:13:20")).unwrap(),
            Some(1_700_000_000)
        );
        assert!(parse_legacy_cooldown("text", Some("tomorrow")).is_err());
    }
}
