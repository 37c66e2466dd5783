use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// A signed-in (or guest) player identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub uid: String,
    pub display_name: String,
}

impl Operator {
    /// The anonymous bypass, always available even with no database.
    pub fn guest() -> Self {
        Self {
            uid: "guest".to_string(),
            display_name: "GUEST".to_string(),
        }
    }

    pub fn is_guest(&self) -> bool {
        self.uid == "guest"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    DuplicateOperator,
    InvalidHandle,
    Unavailable,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "invalid handle or access code"),
            AuthError::DuplicateOperator => write!(f, "handle already registered"),
            AuthError::InvalidHandle => write!(f, "handle must be 3-16 word characters"),
            AuthError::Unavailable => write!(f, "account store unavailable"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Identity provider contract. Failures degrade to guest play; they
/// never abort a mission.
pub trait AuthProvider {
    fn login(&self, handle: &str, access_code: &str) -> Result<Operator, AuthError>;
    fn register(&self, handle: &str, access_code: &str) -> Result<Operator, AuthError>;
}

/// Local arcade accounts in the same sqlite file as the leaderboard.
#[derive(Debug)]
pub struct SqliteAuth {
    conn: Connection,
}

impl SqliteAuth {
    pub fn new() -> Result<Self, AuthError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("sysoverride_arcade.db"));
        Self::with_path(db_path)
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self, AuthError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|_| AuthError::Unavailable)?;
        }
        let conn = Connection::open(path).map_err(|_| AuthError::Unavailable)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS operators (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                handle TEXT NOT NULL UNIQUE,
                access_code TEXT NOT NULL
            )
            "#,
            [],
        )
        .map_err(|_| AuthError::Unavailable)?;

        Ok(Self { conn })
    }
}

fn valid_handle(handle: &str) -> bool {
    let len = handle.chars().count();
    (3..=16).contains(&len) && handle.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl AuthProvider for SqliteAuth {
    fn login(&self, handle: &str, access_code: &str) -> Result<Operator, AuthError> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT id, handle FROM operators WHERE handle = ?1 AND access_code = ?2",
                params![handle, access_code],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|_| AuthError::Unavailable)?;

        match row {
            Some((id, handle)) => Ok(Operator {
                uid: format!("op-{id}"),
                display_name: handle,
            }),
            None => Err(AuthError::InvalidCredentials),
        }
    }

    fn register(&self, handle: &str, access_code: &str) -> Result<Operator, AuthError> {
        if !valid_handle(handle) || access_code.is_empty() {
            return Err(AuthError::InvalidHandle);
        }

        let taken: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM operators WHERE handle = ?1",
                params![handle],
                |row| row.get(0),
            )
            .optional()
            .map_err(|_| AuthError::Unavailable)?;
        if taken.is_some() {
            return Err(AuthError::DuplicateOperator);
        }

        self.conn
            .execute(
                "INSERT INTO operators (handle, access_code) VALUES (?1, ?2)",
                params![handle, access_code],
            )
            .map_err(|_| AuthError::Unavailable)?;

        let id = self.conn.last_insert_rowid();
        Ok(Operator {
            uid: format!("op-{id}"),
            display_name: handle.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn auth() -> (tempfile::TempDir, SqliteAuth) {
        let dir = tempdir().unwrap();
        let auth = SqliteAuth::with_path(dir.path().join("arcade.db")).unwrap();
        (dir, auth)
    }

    #[test]
    fn register_then_login() {
        let (_dir, auth) = auth();
        let registered = auth.register("ghost", "s3cret").unwrap();
        let logged_in = auth.login("ghost", "s3cret").unwrap();

        assert_eq!(registered, logged_in);
        assert_eq!(logged_in.display_name, "ghost");
        assert!(!logged_in.is_guest());
    }

    #[test]
    fn wrong_code_is_invalid_credentials() {
        let (_dir, auth) = auth();
        auth.register("ghost", "s3cret").unwrap();

        assert_eq!(
            auth.login("ghost", "nope").unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            auth.login("nobody", "s3cret").unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[test]
    fn duplicate_handle_is_rejected() {
        let (_dir, auth) = auth();
        auth.register("ghost", "one").unwrap();
        assert_eq!(
            auth.register("ghost", "two").unwrap_err(),
            AuthError::DuplicateOperator
        );
    }

    #[test]
    fn handle_validation() {
        let (_dir, auth) = auth();
        assert_eq!(auth.register("ab", "x").unwrap_err(), AuthError::InvalidHandle);
        assert_eq!(
            auth.register("has space", "x").unwrap_err(),
            AuthError::InvalidHandle
        );
        assert_eq!(auth.register("ok_1", "").unwrap_err(), AuthError::InvalidHandle);
        assert!(auth.register("ok_1", "pw").is_ok());
    }

    #[test]
    fn guest_bypass_needs_no_store() {
        let guest = Operator::guest();
        assert!(guest.is_guest());
        assert_eq!(guest.display_name, "GUEST");
    }
}
