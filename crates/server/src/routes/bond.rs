//! Daily bond check-in routes: mood sharing and the question of the day.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use database::bond::{self, PartnerCheckIn};

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::routes::users::UserEnvelope;
use crate::state::AppState;

/// Served when the question pool is empty.
const FALLBACK_QUESTION: &str = "What is one thing you appreciate about your partner today?";

#[derive(Deserialize)]
pub struct MoodRequest {
    pub mood: Option<String>,
}

#[derive(Serialize)]
pub struct QuestionEntry {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Partner's side of the check-in.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerEntry {
    pub full_name: String,
    pub profile_pic: String,
    pub mood: Option<String>,
    pub last_mood_update: Option<DateTime<Utc>>,
}

impl From<PartnerCheckIn> for PartnerEntry {
    fn from(partner: PartnerCheckIn) -> Self {
        Self {
            full_name: partner.full_name,
            profile_pic: partner.profile_pic,
            mood: partner.mood,
            last_mood_update: partner.last_mood_update,
        }
    }
}

/// The daily question plus both partners' moods.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyInsightResponse {
    pub question: QuestionEntry,
    pub my_mood: Option<String>,
    pub partner: Option<PartnerEntry>,
}

/// Record the caller's mood for today.
pub async fn update_mood(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<MoodRequest>,
) -> Result<Json<UserEnvelope>> {
    let mood = body
        .mood
        .ok_or_else(|| ApiError::bad_request("Mood is required"))?;

    let user = bond::set_mood(state.db.pool(), &me.id, &mood, Utc::now()).await?;
    Ok(Json(UserEnvelope::new(user)))
}

/// The question of the day and the couple's check-in state.
pub async fn daily_insight(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<DailyInsightResponse>> {
    let today = Utc::now().date_naive();

    let question = match bond::daily_question(state.db.pool(), today).await? {
        Some(question) => QuestionEntry {
            text: question.text,
            category: Some(question.category),
        },
        None => QuestionEntry {
            text: FALLBACK_QUESTION.to_string(),
            category: None,
        },
    };

    let partner = bond::partner_check_in(state.db.pool(), &me)
        .await?
        .map(PartnerEntry::from);

    Ok(Json(DailyInsightResponse {
        question,
        my_mood: me.mood,
        partner,
    }))
}
