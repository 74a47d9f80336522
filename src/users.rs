//! Account records. Credential checks and token issuing live with the auth
//! layer; this only persists what it decides.

use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use tracing::info;

use crate::db::{millis_column, Store};
use crate::error::{BoardError, BoardResult};
use crate::models::{User, UserId};

const USER_COLUMNS: &str =
    "id, email, name, provider, provider_id, password_hash, is_verified, created_at";

#[derive(Clone)]
pub struct UserRepository {
    store: Store,
}

impl UserRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Finds the user for an identity-provider login, creating a verified
    /// account the first time.
    pub fn get_or_create_user(
        &self,
        email: &str,
        name: &str,
        provider: &str,
        provider_id: &str,
    ) -> BoardResult<User> {
        self.store.with_conn(|conn| {
            let existing = conn
                .query_row(
                    &format!(
                        "SELECT {USER_COLUMNS} FROM users WHERE provider = ?1 AND provider_id = ?2"
                    ),
                    params![provider, provider_id],
                    user_from_row,
                )
                .optional()?;
            if let Some(user) = existing {
                return Ok(user);
            }

            let id = UserId::generate();
            conn.execute(
                "INSERT INTO users (id, email, name, provider, provider_id, is_verified, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
                params![id, email, name, provider, provider_id, Utc::now().timestamp_millis()],
            )?;
            info!(user = %id, provider, "created user from provider login");
            Ok(conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )?)
        })
    }

    /// Registers an unverified email/password account. The password must
    /// already be hashed.
    pub fn create_email_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        token: &str,
        expires: DateTime<Utc>,
    ) -> BoardResult<User> {
        let id = UserId::generate();
        self.store.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, email, name, password_hash, is_verified,
                                    verification_token, verification_token_expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7)",
                params![
                    id,
                    email,
                    name,
                    password_hash,
                    token,
                    expires.timestamp_millis(),
                    Utc::now().timestamp_millis()
                ],
            );
            match inserted {
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    return Err(BoardError::validation(format!(
                        "email {email} is already registered"
                    )));
                }
                other => {
                    other?;
                }
            }
            Ok(conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )?)
        })
    }

    /// Looks up an email/password account.
    pub fn get_user_by_email(&self, email: &str) -> BoardResult<User> {
        self.store.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE email = ?1 AND password_hash IS NOT NULL"
                ),
                params![email],
                user_from_row,
            )
            .optional()?
            .ok_or(BoardError::NotFound("user"))
        })
    }

    /// Marks the account holding `token` as verified if the token has not
    /// expired at `now`. The token is single use.
    pub fn verify_user_email(&self, token: &str, now: DateTime<Utc>) -> BoardResult<User> {
        self.store.with_conn(|conn| {
            let tx = conn.transaction()?;
            let id: Option<UserId> = tx
                .query_row(
                    "SELECT id FROM users
                     WHERE verification_token = ?1 AND verification_token_expires_at > ?2",
                    params![token, now.timestamp_millis()],
                    |row| row.get(0),
                )
                .optional()?;
            let id = id.ok_or(BoardError::NotFound("verification token"))?;

            tx.execute(
                "UPDATE users SET is_verified = 1, verification_token = NULL,
                                  verification_token_expires_at = NULL
                 WHERE id = ?1",
                params![id],
            )?;
            let user = tx.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )?;
            tx.commit()?;
            info!(user = %id, "email verified");
            Ok(user)
        })
    }

    pub fn get_user_by_id(&self, id: UserId) -> BoardResult<User> {
        self.store.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?
            .ok_or(BoardError::NotFound("user"))
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        provider: row.get(3)?,
        provider_id: row.get(4)?,
        password_hash: row.get(5)?,
        is_verified: row.get(6)?,
        created_at: millis_column(row, 7)?,
    })
}
