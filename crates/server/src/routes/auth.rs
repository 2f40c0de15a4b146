//! Signup, login, logout, and onboarding routes.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use chrono::{NaiveDate, Utc};
use rand::Rng;
use serde::Deserialize;
use tracing::info;

use database::user::{NewUser, Onboarding};
use database::validation;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::routes::users::UserEnvelope;
use crate::state::AppState;

/// Minimum age to create an account.
const MIN_SIGNUP_AGE: u32 = 18;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub native_language: Option<String>,
    pub learning_language: Option<String>,
    pub location: Option<String>,
}

fn required(field: Option<String>) -> Result<String> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ApiError::bad_request("All fields are required")),
    }
}

/// Random stock avatar assigned at signup.
fn random_avatar() -> String {
    let idx = rand::thread_rng().gen_range(1..=100);
    format!("https://avatar.iran.liara.run/public/{idx}.png")
}

/// Create an account and start a session.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    let email = required(body.email)?.to_lowercase();
    let password = required(body.password)?;
    let full_name = required(body.full_name)?;
    let date_of_birth = body
        .date_of_birth
        .ok_or_else(|| ApiError::bad_request("All fields are required"))?;

    // a future date of birth yields no age and fails the gate too
    let today = Utc::now().date_naive();
    let age = today.years_since(date_of_birth).unwrap_or(0);
    if age < MIN_SIGNUP_AGE {
        return Err(ApiError::bad_request(
            "You must be at least 18 years old to sign up",
        ));
    }
    validation::validate_password(&password)?;
    validation::validate_email(&email)?;
    validation::validate_full_name(&full_name)?;

    if database::user::find_user_by_email(state.db.pool(), &email)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Email already exists"));
    }

    let new_user = NewUser {
        id: uuid::Uuid::new_v4().to_string(),
        full_name,
        email,
        password_hash: bcrypt::hash(&password, bcrypt::DEFAULT_COST)?,
        date_of_birth,
        profile_pic: random_avatar(),
        created_at: Utc::now(),
    };
    let user = database::user::create_user(state.db.pool(), &new_user).await?;
    info!(user_id = %user.id, "New signup");

    let token = state.auth.issue_token(&user.id)?;
    let cookie = state.auth.session_cookie(&token);

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(UserEnvelope::new(user)),
    ))
}

/// Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let email = required(body.email)?.to_lowercase();
    let password = required(body.password)?;

    // same response for a missing account and a wrong password
    let user = database::user::find_user_by_email(state.db.pool(), &email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;
    if !bcrypt::verify(&password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = state.auth.issue_token(&user.id)?;
    let cookie = state.auth.session_cookie(&token);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(UserEnvelope::new(user)),
    ))
}

/// End the session by clearing the cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(header::SET_COOKIE, state.auth.clear_cookie())]),
        Json(serde_json::json!({ "success": true, "message": "Logout successful" })),
    )
}

/// The authenticated user's own account.
pub async fn me(AuthUser(user): AuthUser) -> Json<UserEnvelope> {
    Json(UserEnvelope::new(user))
}

/// Complete the profile after signup. All fields are required.
pub async fn onboarding(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<OnboardingRequest>,
) -> Result<Json<UserEnvelope>> {
    let onboarding = Onboarding {
        full_name: required(body.full_name)?,
        bio: required(body.bio)?,
        native_language: required(body.native_language)?,
        learning_language: required(body.learning_language)?,
        location: required(body.location)?,
    };
    validation::validate_full_name(&onboarding.full_name)?;

    let user = database::user::onboard(state.db.pool(), &me.id, &onboarding, Utc::now()).await?;
    info!(user_id = %user.id, "Onboarding completed");

    Ok(Json(UserEnvelope::new(user)))
}
