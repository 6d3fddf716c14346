/**
 * Idempotent schema migration for the Mimosa store.
 *
 * Runs in three strata, same shape every release: base tables, then
 * additive column evolutions (tolerating "duplicate column name" from
 * a table that already has them), then indexes. Safe to call on every
 * startup.
 */
use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

const BASE_TABLES: &[(&str, &str)] = &[
    ("TABLE_OFFENSES", r#"
        CREATE TABLE IF NOT EXISTS offenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_ip TEXT NOT NULL,
            description TEXT NOT NULL,
            description_clean TEXT NOT NULL,
            plugin TEXT,
            severity TEXT,
            host TEXT,
            path TEXT,
            context_json TEXT NOT NULL DEFAULT '{}',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_BLOCKS", r#"
        CREATE TABLE IF NOT EXISTS blocks (
            ip TEXT PRIMARY KEY,
            reason TEXT NOT NULL,
            reason_text TEXT,
            reason_plugin TEXT,
            reason_severity TEXT,
            source TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            expires_at DATETIME,
            active INTEGER NOT NULL DEFAULT 1,
            sync_with_firewall INTEGER NOT NULL DEFAULT 1
        );
    "#),
    ("TABLE_BLOCK_HISTORY", r#"
        CREATE TABLE IF NOT EXISTS block_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ip TEXT NOT NULL,
            reason TEXT NOT NULL,
            action TEXT NOT NULL,
            source TEXT,
            at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_IP_PROFILES", r#"
        CREATE TABLE IF NOT EXISTS ip_profiles (
            ip TEXT PRIMARY KEY,
            geo_json TEXT,
            reverse_dns TEXT,
            classification TEXT NOT NULL DEFAULT 'unknown',
            is_proxy INTEGER NOT NULL DEFAULT 0,
            is_mobile INTEGER NOT NULL DEFAULT 0,
            is_hosting INTEGER NOT NULL DEFAULT 0,
            first_seen DATETIME DEFAULT CURRENT_TIMESTAMP,
            last_seen DATETIME DEFAULT CURRENT_TIMESTAMP,
            enriched_at DATETIME,
            offenses_total INTEGER NOT NULL DEFAULT 0,
            blocks_total INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("TABLE_WHITELIST", r#"
        CREATE TABLE IF NOT EXISTS whitelist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cidr TEXT NOT NULL UNIQUE,
            note TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_RULES", r#"
        CREATE TABLE IF NOT EXISTS rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            plugin TEXT NOT NULL,
            event_id TEXT NOT NULL,
            severity TEXT,
            description TEXT NOT NULL,
            min_last_hour INTEGER NOT NULL DEFAULT 0,
            min_total INTEGER NOT NULL DEFAULT 0,
            min_blocks_total INTEGER NOT NULL DEFAULT 0,
            block_minutes INTEGER,
            enabled INTEGER NOT NULL DEFAULT 1
        );
    "#),
    ("TABLE_FIREWALLS", r#"
        CREATE TABLE IF NOT EXISTS firewalls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            base_url TEXT NOT NULL,
            username TEXT NOT NULL,
            password TEXT NOT NULL,
            alias_name TEXT NOT NULL,
            verify_tls INTEGER NOT NULL DEFAULT 1,
            enabled INTEGER NOT NULL DEFAULT 1
        );
    "#),
    ("TABLE_USERS", r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_SESSIONS", r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            expires_at DATETIME NOT NULL
        );
    "#),
    ("TABLE_SYSTEM_SETTINGS", r#"
        CREATE TABLE IF NOT EXISTS system_settings (
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
];

const EVOLUTIONS: &[(&str, &str)] = &[
    ("OFFENSE_HOST", "ALTER TABLE offenses ADD COLUMN host TEXT"),
    ("OFFENSE_PATH", "ALTER TABLE offenses ADD COLUMN path TEXT"),
    ("BLOCK_REASON_TEXT", "ALTER TABLE blocks ADD COLUMN reason_text TEXT"),
    ("BLOCK_REASON_PLUGIN", "ALTER TABLE blocks ADD COLUMN reason_plugin TEXT"),
    ("FIREWALL_VERIFY_TLS", "ALTER TABLE firewalls ADD COLUMN verify_tls INTEGER NOT NULL DEFAULT 1"),
    ("FIREWALL_APPLY_CHANGES", "ALTER TABLE firewalls ADD COLUMN apply_changes INTEGER NOT NULL DEFAULT 1"),
];

const INDEXES: &[(&str, &str)] = &[
    ("IDX_OFFENSES_SOURCE_IP", "CREATE INDEX IF NOT EXISTS idx_offenses_source_ip ON offenses(source_ip);"),
    ("IDX_OFFENSES_CREATED_AT", "CREATE INDEX IF NOT EXISTS idx_offenses_created_at ON offenses(created_at);"),
    ("IDX_BLOCK_HISTORY_IP", "CREATE INDEX IF NOT EXISTS idx_block_history_ip ON block_history(ip);"),
    ("IDX_BLOCKS_ACTIVE", "CREATE INDEX IF NOT EXISTS idx_blocks_active ON blocks(active, expires_at);"),
    ("IDX_SESSIONS_EXPIRES", "CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);"),
    ("IDX_RULES_ENABLED", "CREATE INDEX IF NOT EXISTS idx_rules_enabled ON rules(enabled);"),
    ("IDX_OFFENSES_SEVERITY", "CREATE INDEX IF NOT EXISTS idx_offenses_severity ON offenses(severity);"),
];

#[instrument(skip(connection))]
pub async fn apply_mimosa_schema(connection: &Connection) -> Result<()> {
    info!("applying store schema");

    create_base_tables(connection).await?;
    apply_evolutions(connection).await?;
    create_indexes(connection).await?;

    info!("store schema up to date");
    Ok(())
}

async fn create_base_tables(db: &Connection) -> Result<()> {
    for (label, sql) in BASE_TABLES {
        debug!("creating table: {}", label);
        db.execute(*sql, ()).await.with_context(|| format!("failed to create {}", label))?;
    }
    Ok(())
}

async fn apply_evolutions(db: &Connection) -> Result<()> {
    for (label, sql) in EVOLUTIONS {
        match db.execute(*sql, ()).await {
            Ok(_) => info!("applied column evolution: {}", label),
            Err(e) => {
                let message = e.to_string();
                if message.contains("duplicate column name") {
                    debug!("{} already applied", label);
                } else {
                    warn!("{} did not apply cleanly: {}", label, message);
                }
            }
        }
    }
    Ok(())
}

async fn create_indexes(db: &Connection) -> Result<()> {
    for (label, sql) in INDEXES {
        debug!("creating index: {}", label);
        db.execute(*sql, ()).await.with_context(|| format!("failed to create {}", label))?;
    }
    Ok(())
}
