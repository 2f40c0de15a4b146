//! Couple pairing routes.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use database::couple::{self, CoupleStatusView, PartnerSummary};
use database::CoupleStatus;

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Compact partner profile embedded in the status payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerEntry {
    pub id: String,
    pub full_name: String,
    pub profile_pic: String,
    pub bio: String,
}

impl From<PartnerSummary> for PartnerEntry {
    fn from(partner: PartnerSummary) -> Self {
        Self {
            id: partner.id,
            full_name: partner.full_name,
            profile_pic: partner.profile_pic,
            bio: partner.bio,
        }
    }
}

/// Everything the couple page needs in one response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupleStatusResponse {
    pub couple_status: CoupleStatus,
    pub partner: Option<PartnerEntry>,
    pub anniversary: Option<DateTime<Utc>>,
    pub couple_request_sender_id: Option<String>,
    pub romantic_note: String,
    pub romantic_note_last_updated: Option<DateTime<Utc>>,
    pub is_both_adult: bool,
}

impl From<CoupleStatusView> for CoupleStatusResponse {
    fn from(view: CoupleStatusView) -> Self {
        Self {
            couple_status: view.couple_status,
            partner: view.partner.map(PartnerEntry::from),
            anniversary: view.anniversary,
            couple_request_sender_id: view.couple_request_sender_id,
            romantic_note: view.romantic_note,
            romantic_note_last_updated: view.romantic_note_updated_at,
            is_both_adult: view.is_both_adult,
        }
    }
}

#[derive(Deserialize)]
pub struct NoteRequest {
    pub note: Option<String>,
}

/// `{message, note, lastUpdated}` returned after a note update.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub message: String,
    pub note: String,
    pub last_updated: DateTime<Utc>,
}

/// The caller's pairing state and partner.
pub async fn status(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<CoupleStatusResponse>> {
    let today = Utc::now().date_naive();
    let view = couple::status(state.db.pool(), &me, today).await?;
    Ok(Json(CoupleStatusResponse::from(view)))
}

/// Send a couple request to a friend.
pub async fn request(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(partner_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let today = Utc::now().date_naive();
    couple::request(state.db.pool(), &me.id, &partner_id, today, Utc::now()).await?;
    Ok(Json(serde_json::json!({ "message": "Couple request sent!" })))
}

/// Accept a pending couple request from the user in the path.
pub async fn accept(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(sender_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let today = Utc::now().date_naive();
    couple::accept(state.db.pool(), &me.id, &sender_id, today, Utc::now()).await?;
    Ok(Json(serde_json::json!({ "message": "You are now a couple!" })))
}

/// Leave the couple, or cancel a pending request.
pub async fn unlink(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<serde_json::Value>> {
    couple::unlink(state.db.pool(), &me.id, Utc::now()).await?;
    Ok(Json(serde_json::json!({ "message": "Couple unlinked" })))
}

/// Replace the shared note on both sides of the couple.
pub async fn update_note(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<NoteRequest>,
) -> Result<Json<NoteResponse>> {
    let note = body
        .note
        .ok_or_else(|| ApiError::bad_request("Note is required"))?;

    let now = Utc::now();
    couple::update_note(state.db.pool(), &me.id, &note, now).await?;

    Ok(Json(NoteResponse {
        message: "Note updated".to_string(),
        note,
        last_updated: now,
    }))
}
