use chrono::{DateTime, Utc};

use crate::commands::{AppContext, CommandError};
use crate::models::{User, UserId};

/// Profile of the authenticated user.
pub fn me(ctx: &AppContext, user: UserId) -> Result<User, CommandError> {
    Ok(ctx.users.get_user_by_id(user)?)
}

/// Account for an identity-provider login, created on first use.
pub fn login_with_provider(
    ctx: &AppContext,
    email: &str,
    name: &str,
    provider: &str,
    provider_id: &str,
) -> Result<User, CommandError> {
    if provider.trim().is_empty() || provider_id.trim().is_empty() {
        return Err(CommandError::invalid("provider and provider id are required"));
    }
    Ok(ctx
        .users
        .get_or_create_user(email.trim(), name.trim(), provider.trim(), provider_id.trim())?)
}

/// Email/password sign-up. The caller hashes the password and issues the
/// verification token; the account stays unverified until the token is used.
pub fn register(
    ctx: &AppContext,
    email: &str,
    password_hash: &str,
    name: &str,
    token: &str,
    expires: DateTime<Utc>,
) -> Result<User, CommandError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(CommandError::invalid("a valid email is required"));
    }
    if password_hash.is_empty() || token.trim().is_empty() {
        return Err(CommandError::invalid("password hash and token are required"));
    }
    Ok(ctx
        .users
        .create_email_user(email, password_hash, name.trim(), token.trim(), expires)?)
}

/// Consumes a verification token issued by [`register`].
pub fn verify_email(
    ctx: &AppContext,
    token: &str,
    now: DateTime<Utc>,
) -> Result<User, CommandError> {
    if token.trim().is_empty() {
        return Err(CommandError::invalid("token is required"));
    }
    Ok(ctx.users.verify_user_email(token.trim(), now)?)
}
