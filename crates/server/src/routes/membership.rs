//! Premium membership routes. Activation is a stand-in until a payment
//! gateway is integrated.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipStatus {
    pub is_member: bool,
    pub member_since: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    pub success: bool,
    pub message: String,
    pub is_member: bool,
    pub member_since: DateTime<Utc>,
}

/// The caller's membership state.
pub async fn status(AuthUser(me): AuthUser) -> Json<MembershipStatus> {
    Json(MembershipStatus {
        is_member: me.is_member,
        member_since: me.member_since,
    })
}

/// Activate a membership.
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<SubscribeResponse>> {
    if me.is_member {
        return Err(ApiError::bad_request("You are already a member"));
    }

    let now = Utc::now();
    database::user::set_membership(state.db.pool(), &me.id, true, Some(now), now).await?;
    info!(user_id = %me.id, "Membership activated");

    Ok(Json(SubscribeResponse {
        success: true,
        message: "Welcome to freeChat Premium!".to_string(),
        is_member: true,
        member_since: now,
    }))
}

/// Cancel the membership.
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<serde_json::Value>> {
    if !me.is_member {
        return Err(ApiError::bad_request("You are not a member"));
    }

    database::user::set_membership(state.db.pool(), &me.id, false, None, Utc::now()).await?;
    info!(user_id = %me.id, "Membership cancelled");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Membership cancelled"
    })))
}
