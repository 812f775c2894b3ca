use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use sha256::digest;

use super::session::{self, Identity};
use super::{Credentials, Error, Role};
use crate::RequireAuthContext;
use crate::ResError;

use messbuddy_shared::account::handle::*;

static NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Za-z ]+$").unwrap());
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static DIVISION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-G]$").unwrap());
static PRN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new("^[0-9]{14}$").unwrap());

/// Register the local student record.
///
/// Fails if a record with the same email already exists; any other
/// existing record is replaced, since the cell holds one identity at a
/// time.
pub async fn signup(
    Json(descriptor): Json<SignupDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    validate_signup(&descriptor).map_err(ResError)?;

    if let Some(existing) = super::CREDENTIALS.get() {
        if existing.email.eq_ignore_ascii_case(descriptor.email.trim()) {
            return Err(ResError(Error::AlreadyRegistered).into());
        }
    }

    let email = descriptor.email.trim().to_lowercase();
    let record = Credentials {
        name: descriptor.name.trim().to_string(),
        email: email.clone(),
        password: digest(descriptor.password.as_str()),
        division: descriptor.division.trim().to_uppercase(),
        roll: Some(descriptor.roll),
        prn: descriptor.prn,
        batch: Some(descriptor.batch),
    };

    super::CREDENTIALS.save(record).await.map_err(ResError)?;

    let token = session::INSTANCE.new_session(Identity::Student(email));
    Ok(Json(json!({ "token": token, "role": Role::Student })))
}

fn validate_signup(descriptor: &SignupDescriptor) -> Result<(), Error> {
    if !NAME_REGEX.is_match(descriptor.name.trim()) {
        return Err(Error::InvalidName);
    }
    if !EMAIL_REGEX.is_match(descriptor.email.trim()) {
        return Err(Error::InvalidEmail);
    }
    if descriptor.password.len() < 6 {
        return Err(Error::WeakPassword);
    }
    if !DIVISION_REGEX.is_match(&descriptor.division.trim().to_uppercase()) {
        return Err(Error::InvalidDivision);
    }
    if !(1..=100).contains(&descriptor.roll) {
        return Err(Error::InvalidRoll);
    }
    if !PRN_REGEX.is_match(&descriptor.prn) {
        return Err(Error::InvalidPrn);
    }
    if !(2000..=2100).contains(&descriptor.batch) {
        return Err(Error::InvalidBatch);
    }
    Ok(())
}

/// Log into the student record by email, or a mess account by
/// username, and return a session token together with the role the
/// client should route to.
pub async fn login(
    Json(descriptor): Json<LoginDescriptor>,
) -> axum::response::Result<Json<serde_json::Value>> {
    let account = descriptor.account.trim().to_lowercase();

    if account.contains('@') && !EMAIL_REGEX.is_match(&account) {
        return Err(ResError(Error::InvalidEmail).into());
    }
    if descriptor.password.len() < 6 {
        return Err(ResError(Error::WeakPassword).into());
    }

    // the student record first, then the mess accounts
    if let Some(creds) = super::CREDENTIALS.get() {
        if creds.email.to_lowercase() == account
            && creds.password == digest(descriptor.password.as_str())
        {
            let token = session::INSTANCE.new_session(Identity::Student(creds.email));
            return Ok(Json(json!({ "token": token, "role": Role::Student })));
        }
    }

    if let Some(found) = super::INSTANCE.find(&account) {
        if found.password == digest(descriptor.password.as_str()) {
            let token = session::INSTANCE.new_session(Identity::Mess(found.username));
            return Ok(Json(json!({ "token": token, "role": found.role })));
        }
    }

    Err(ResError(Error::CredentialsIncorrect).into())
}

/// Close the session behind the request's token.
pub async fn logout(ctx: RequireAuthContext) -> axum::response::Result<()> {
    session::INSTANCE.remove(&ctx.token);
    Ok(())
}

/// View the profile of the registered student. The password digest
/// stays server-side.
pub async fn view_profile(
    ctx: RequireAuthContext,
) -> axum::response::Result<Json<serde_json::Value>> {
    let email = ctx.require_student().map_err(ResError)?;
    let creds = super::CREDENTIALS.get().ok_or(ResError(Error::NoAccount))?;

    // a stale session can outlive a signout followed by a re-signup
    if !creds.email.eq_ignore_ascii_case(email) {
        return Err(ResError(Error::NoAccount).into());
    }

    Ok(Json(json!({
        "name": creds.name,
        "email": creds.email,
        "division": creds.division,
        "roll": creds.roll,
        "prn": creds.prn,
        "batch": creds.batch,
    })))
}

/// Change the password of the registered student, verifying the
/// current one first.
pub async fn change_password(
    ctx: RequireAuthContext,
    Json(descriptor): Json<ChangePasswordDescriptor>,
) -> axum::response::Result<()> {
    ctx.require_student().map_err(ResError)?;

    let creds = super::CREDENTIALS.get().ok_or(ResError(Error::NoAccount))?;
    if creds.password != digest(descriptor.current_password.as_str()) {
        return Err(ResError(Error::PasswordIncorrect).into());
    }
    if descriptor.new_password.len() < 6 {
        return Err(ResError(Error::WeakPassword).into());
    }

    super::CREDENTIALS
        .update_password(digest(descriptor.new_password.as_str()))
        .await
        .map_err(ResError)?;
    Ok(())
}

/// The local forgot-password flow: no current password, but the email
/// must match the registered record.
pub async fn reset_password(
    Json(descriptor): Json<ResetPasswordDescriptor>,
) -> axum::response::Result<()> {
    let creds = super::CREDENTIALS.get().ok_or(ResError(Error::NoAccount))?;
    if !creds.email.eq_ignore_ascii_case(descriptor.email.trim()) {
        return Err(ResError(Error::EmailMismatch).into());
    }
    if descriptor.new_password.len() < 6 {
        return Err(ResError(Error::WeakPassword).into());
    }

    super::CREDENTIALS
        .update_password(digest(descriptor.new_password.as_str()))
        .await
        .map_err(ResError)?;

    // sessions opened with the old password die with it
    session::INSTANCE.remove_identity(&Identity::Student(creds.email));
    Ok(())
}

/// Remove the student record entirely.
pub async fn sign_out(ctx: RequireAuthContext) -> axum::response::Result<()> {
    let email = ctx.require_student().map_err(ResError)?.to_string();

    super::CREDENTIALS.clear().await.map_err(ResError)?;
    session::INSTANCE.remove_identity(&Identity::Student(email));
    Ok(())
}
