use crate::error::Result;
use crate::models::UserProfile;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;

const MIGRATION_PROFILE_SQL: &str = include_str!("../migrations/0000_profile.sql");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProfile {
    pub profile: UserProfile,
    pub signed_in_at: DateTime<Utc>,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            id TEXT PRIMARY KEY NOT NULL,
            applied_at INTEGER NOT NULL
        );",
    )?;
    apply_migration(conn, "0000_profile", MIGRATION_PROFILE_SQL)?;
    Ok(())
}

fn apply_migration(conn: &Connection, id: &str, sql: &str) -> Result<()> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT id FROM schema_migrations WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Ok(());
    }
    conn.execute_batch(sql)?;
    conn.execute(
        "INSERT INTO schema_migrations (id, applied_at) VALUES (?1, ?2)",
        params![id, Utc::now().timestamp_millis()],
    )?;
    log::debug!("applied migration {}", id);
    Ok(())
}

pub fn save_profile(conn: &Connection, profile: &UserProfile) -> Result<StoredProfile> {
    let now = Utc::now();
    let millis = now.timestamp_millis();
    conn.execute(
        "INSERT INTO profile (slot, user_id, name, email, picture, signed_in_at)
         VALUES (1, ?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(slot) DO UPDATE SET
            user_id = excluded.user_id,
            name = excluded.name,
            email = excluded.email,
            picture = excluded.picture,
            signed_in_at = excluded.signed_in_at",
        params![
            profile.id,
            profile.name,
            profile.email,
            profile.picture,
            millis
        ],
    )?;
    Ok(StoredProfile {
        profile: profile.clone(),
        signed_in_at: Utc.timestamp_millis_opt(millis).single().unwrap_or(now),
    })
}

/// Loads the signed-in profile. A row missing its id or email is removed and
/// treated as signed out.
pub fn load_profile(conn: &Connection) -> Result<Option<StoredProfile>> {
    let row = conn
        .query_row(
            "SELECT user_id, name, email, picture, signed_in_at FROM profile WHERE slot = 1",
            [],
            |row| {
                Ok((
                    UserProfile {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        picture: row.get(3)?,
                    },
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((profile, signed_in_at)) = row else {
        return Ok(None);
    };
    if profile.id.trim().is_empty() || profile.email.trim().is_empty() {
        log::warn!("discarding incomplete stored profile");
        clear_profile(conn)?;
        return Ok(None);
    }
    let signed_in_at = Utc
        .timestamp_millis_opt(signed_in_at)
        .single()
        .unwrap_or_else(Utc::now);
    Ok(Some(StoredProfile {
        profile,
        signed_in_at,
    }))
}

pub fn clear_profile(conn: &Connection) -> Result<bool> {
    let removed = conn.execute("DELETE FROM profile WHERE slot = 1", [])?;
    Ok(removed > 0)
}
