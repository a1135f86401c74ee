use anyhow::{Context, Result, bail};
use chrono::Local;
use rusqlite::params;
use uuid::Uuid;

use super::Database;
use crate::models::{NewUserToken, User, validate_email, validate_full_name};
use crate::token::{generate_token, hash_token};

const USER_COLUMNS: &str = "id, uuid, email, full_name, created_at";

impl Database {
    fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            uuid: row.get(1)?,
            email: row.get(2)?,
            full_name: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    /// Creates a user and returns its API token. Only the token's hash is stored.
    pub fn create_user(&self, email: &str, full_name: &str) -> Result<NewUserToken> {
        let email = validate_email(email)?;
        let full_name = validate_full_name(full_name)?;
        if self.get_user_by_email(&email)?.is_some() {
            bail!("A user with email '{email}' already exists");
        }

        let token = generate_token();
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO users (uuid, email, full_name, token_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Uuid::new_v4().to_string(),
                email,
                full_name,
                hash_token(&token),
                now
            ],
        )?;
        let user = self.get_user(self.conn.last_insert_rowid())?;
        tracing::info!(user_id = user.id, email = %user.email, "created user");
        Ok(NewUserToken { user, token })
    }

    pub fn get_user(&self, id: i64) -> Result<User> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                Self::user_from_row,
            )
            .context("User not found")
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;
        let mut rows = stmt.query(params![email.trim().to_lowercase()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::user_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Resolves a plaintext bearer token to its user.
    pub fn find_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE token_hash = ?1"
        ))?;
        let mut rows = stmt.query(params![hash_token(token)])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::user_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let users = stmt
            .query_map([], Self::user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Replaces a user's token, invalidating the old one.
    pub fn rotate_token(&self, email: &str) -> Result<NewUserToken> {
        let user = self
            .get_user_by_email(email)?
            .with_context(|| format!("No user with email '{}'", email.trim()))?;
        let token = generate_token();
        self.conn.execute(
            "UPDATE users SET token_hash = ?1 WHERE id = ?2",
            params![hash_token(&token), user.id],
        )?;
        tracing::info!(user_id = user.id, "rotated API token");
        Ok(NewUserToken { user, token })
    }

    /// Returns the user for `--no-auth` mode, creating it on first use.
    pub fn get_or_create_local_user(&self) -> Result<User> {
        const LOCAL_EMAIL: &str = "local@mealwise.local";
        if let Some(user) = self.get_user_by_email(LOCAL_EMAIL)? {
            return Ok(user);
        }
        Ok(self.create_user(LOCAL_EMAIL, "Local User")?.user)
    }
}
