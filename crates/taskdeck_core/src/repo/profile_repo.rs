//! Profile repository contract and SQLite implementation.
//!
//! # Invariants
//! - Deleting a profile relies on `ON DELETE CASCADE` to remove its tasks
//!   and notifications in the same statement.

use super::{ensure_tables, parse_required_enum, parse_uuid, Entity, RepoError, RepoResult};
use crate::model::profile::{Profile, ProfileId, Theme};
use rusqlite::{params, Connection, Row};

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    name,
    avatar,
    theme,
    password_hash,
    created_at,
    updated_at
FROM profiles";

pub trait ProfileRepository {
    fn create_profile(&self, profile: &Profile) -> RepoResult<ProfileId>;
    fn update_profile(&self, profile: &Profile) -> RepoResult<()>;
    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    /// Lists all profiles ordered by `created_at ASC, id ASC`.
    fn list_profiles(&self) -> RepoResult<Vec<Profile>>;
    fn delete_profile(&self, id: ProfileId) -> RepoResult<()>;
}

pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["profiles"])?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn create_profile(&self, profile: &Profile) -> RepoResult<ProfileId> {
        profile.validate()?;

        self.conn.execute(
            "INSERT INTO profiles (
                id,
                name,
                avatar,
                theme,
                password_hash,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                profile.id.to_string(),
                profile.name.as_str(),
                profile.avatar.as_deref(),
                profile.theme.as_str(),
                profile.password_hash.as_deref(),
                profile.created_at,
                profile.updated_at,
            ],
        )?;

        Ok(profile.id)
    }

    fn update_profile(&self, profile: &Profile) -> RepoResult<()> {
        profile.validate()?;

        let changed = self.conn.execute(
            "UPDATE profiles
             SET
                name = ?1,
                avatar = ?2,
                theme = ?3,
                password_hash = ?4,
                updated_at = ?5
             WHERE id = ?6;",
            params![
                profile.name.as_str(),
                profile.avatar.as_deref(),
                profile.theme.as_str(),
                profile.password_hash.as_deref(),
                profile.updated_at,
                profile.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Profile,
                id: profile.id,
            });
        }
        Ok(())
    }

    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }

    fn list_profiles(&self) -> RepoResult<Vec<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} ORDER BY created_at ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }
        Ok(profiles)
    }

    fn delete_profile(&self, id: ProfileId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM profiles WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Profile,
                id,
            });
        }
        Ok(())
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    let profile = Profile {
        id: parse_uuid(&id_text, "profiles.id")?,
        name: row.get("name")?,
        avatar: row.get("avatar")?,
        theme: parse_required_enum(row.get("theme")?, "profiles.theme", Theme::parse)?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    profile.validate()?;
    Ok(profile)
}
