//! Couple game routes. Every endpoint is premium-gated.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use database::{couple, game};
use database::{CoupleStatus, GameError, GameQuestion, GameSession, GameStatus, QuizAnswer, User};

use crate::auth::AuthUser;
use crate::catalog::GameTemplate;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// A game session as the client sees it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub participants: [String; 2],
    pub game_type: String,
    pub questions: Vec<GameQuestion>,
    pub answers: BTreeMap<String, Vec<QuizAnswer>>,
    pub status: GameStatus,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GameSession> for SessionResponse {
    fn from(session: GameSession) -> Self {
        Self {
            id: session.id,
            participants: [session.participant_one, session.participant_two],
            game_type: session.game_type,
            questions: session.questions,
            answers: session.answers,
            status: session.status,
            score: session.score,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// `{success, session}` envelope returned by session mutations.
#[derive(Serialize)]
pub struct SessionEnvelope {
    pub success: bool,
    pub session: SessionResponse,
}

impl SessionEnvelope {
    fn new(session: GameSession) -> Self {
        Self {
            success: true,
            session: SessionResponse::from(session),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub game_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub session_id: Option<String>,
    pub quiz_answers: Option<Vec<QuizAnswer>>,
}

fn require_premium(user: &User) -> Result<()> {
    if !user.is_premium() {
        return Err(ApiError::forbidden(
            "Premium membership required to play games",
        ));
    }
    Ok(())
}

/// Templates the caller's couple may play.
pub async fn templates(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<BTreeMap<String, GameTemplate>>> {
    require_premium(&me)?;

    let today = Utc::now().date_naive();
    let include_adult = couple::are_both_adult(state.db.pool(), &me, today).await?;
    let visible: BTreeMap<String, GameTemplate> = state
        .catalog
        .visible(include_adult)
        .map(|(game_type, template)| (game_type.clone(), template.clone()))
        .collect();

    Ok(Json(visible))
}

/// Start a session, or rejoin the one already open for this pair and game
/// type.
pub async fn start(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<StartRequest>,
) -> Result<(StatusCode, Json<SessionEnvelope>)> {
    require_premium(&me)?;
    if me.couple_status != CoupleStatus::Coupled {
        return Err(GameError::NotCoupled.into());
    }

    let game_type = body.game_type.unwrap_or_default();
    let template = state
        .catalog
        .get(&game_type)
        .ok_or_else(|| ApiError::bad_request("Invalid game type"))?;

    if template.adult_only {
        let today = Utc::now().date_naive();
        if !couple::are_both_adult(state.db.pool(), &me, today).await? {
            return Err(ApiError::forbidden("This game is for adult couples only"));
        }
    }

    let (session, created) = game::start(
        state.db.pool(),
        &me,
        &game_type,
        &template.questions,
        Utc::now(),
    )
    .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(SessionEnvelope::new(session))))
}

/// Fetch one session the caller participates in.
pub async fn session(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>> {
    require_premium(&me)?;
    let session = game::get_session_for(state.db.pool(), &session_id, &me.id).await?;
    Ok(Json(SessionResponse::from(session)))
}

/// All open sessions the caller participates in.
pub async fn active(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<Vec<SessionResponse>>> {
    require_premium(&me)?;
    let sessions = game::active_sessions_for(state.db.pool(), &me.id).await?;
    Ok(Json(sessions.into_iter().map(SessionResponse::from).collect()))
}

/// Submit the caller's answers. The session completes once both
/// participants have submitted.
pub async fn submit(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<SessionEnvelope>> {
    require_premium(&me)?;

    let session_id = body
        .session_id
        .ok_or_else(|| ApiError::bad_request("Session ID is required"))?;
    let answers = body.quiz_answers.unwrap_or_default();

    let session = game::submit(state.db.pool(), &session_id, &me.id, answers, Utc::now()).await?;
    Ok(Json(SessionEnvelope::new(session)))
}
