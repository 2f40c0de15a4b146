//! Couple quiz sessions: start, answer submission, scoring.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use thiserror::Error;

use crate::error::{DatabaseError, Result};
use crate::models::{CoupleStatus, GameQuestion, GameSession, GameStatus, QuizAnswer, User};

/// Errors for game operations, worded for direct API use.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("You need to be in a couple to play games")]
    NotCoupled,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Access denied")]
    NotParticipant,

    #[error("Game already completed")]
    AlreadyCompleted,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for GameError {
    fn from(e: sqlx::Error) -> Self {
        GameError::Database(DatabaseError::Sqlx(e))
    }
}

const SESSION_COLUMNS: &str = "id, participant_one, participant_two, game_type, questions, \
     answers, status, score, created_at, updated_at";

#[derive(FromRow)]
struct SessionRow {
    id: String,
    participant_one: String,
    participant_two: String,
    game_type: String,
    questions: String,
    answers: String,
    status: GameStatus,
    score: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Result<GameSession> {
        let questions: Vec<GameQuestion> =
            serde_json::from_str(&self.questions).map_err(|source| DatabaseError::Corrupt {
                entity: "GameSession",
                source,
            })?;
        let answers: BTreeMap<String, Vec<QuizAnswer>> =
            serde_json::from_str(&self.answers).map_err(|source| DatabaseError::Corrupt {
                entity: "GameSession",
                source,
            })?;

        Ok(GameSession {
            id: self.id,
            participant_one: self.participant_one,
            participant_two: self.participant_two,
            game_type: self.game_type,
            questions,
            answers,
            status: self.status,
            score: self.score,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Percentage of questions both participants answered identically, rounded
/// to the nearest whole number. Answers pair up by question index.
pub fn compatibility_score(first: &[QuizAnswer], second: &[QuizAnswer], total_questions: usize) -> i64 {
    if total_questions == 0 {
        return 0;
    }

    let matches = first
        .iter()
        .filter(|a| {
            second
                .iter()
                .any(|b| b.question_index == a.question_index && b.answer == a.answer)
        })
        .count();

    ((matches as f64 / total_questions as f64) * 100.0).round() as i64
}

async fn find_open_session<'e, E>(
    executor: E,
    user_id: &str,
    partner_id: &str,
    game_type: &str,
) -> Result<Option<GameSession>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM game_sessions
        WHERE ((participant_one = ? AND participant_two = ?)
            OR (participant_one = ? AND participant_two = ?))
          AND game_type = ? AND status = ?
        "#
    );

    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(partner_id)
        .bind(partner_id)
        .bind(user_id)
        .bind(game_type)
        .bind(GameStatus::Pending)
        .fetch_optional(executor)
        .await?;

    row.map(SessionRow::into_session).transpose()
}

/// Start a session for the caller's couple, or return the one already open
/// for this pair and game type. The bool is true when a new session was
/// created.
pub async fn start(
    pool: &SqlitePool,
    user: &User,
    game_type: &str,
    questions: &[GameQuestion],
    now: DateTime<Utc>,
) -> Result<(GameSession, bool), GameError> {
    if user.couple_status != CoupleStatus::Coupled {
        return Err(GameError::NotCoupled);
    }
    let partner_id = user.partner_id.as_deref().ok_or(GameError::NotCoupled)?;

    if let Some(session) = find_open_session(pool, &user.id, partner_id, game_type).await? {
        return Ok((session, false));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let questions_json = serde_json::to_string(questions).map_err(|source| {
        DatabaseError::Corrupt {
            entity: "GameSession",
            source,
        }
    })?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO game_sessions (id, participant_one, participant_two, game_type,
                                   questions, answers, status, score, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, '{}', ?, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(partner_id)
    .bind(game_type)
    .bind(&questions_json)
    .bind(GameStatus::Pending)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    match inserted {
        Ok(_) => {
            let session = get_session(pool, &id).await?;
            Ok((session, true))
        }
        // lost the race against the partner starting the same game; the
        // open-pair index kept it to one session
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            let session = find_open_session(pool, &user.id, partner_id, game_type)
                .await?
                .ok_or(GameError::SessionNotFound)?;
            Ok((session, false))
        }
        Err(e) => Err(GameError::Database(DatabaseError::Sqlx(e))),
    }
}

async fn get_session(pool: &SqlitePool, session_id: &str) -> Result<GameSession, GameError> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM game_sessions WHERE id = ?");
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(session_id)
        .fetch_optional(pool)
        .await?;

    let row = row.ok_or(GameError::SessionNotFound)?;
    Ok(row.into_session()?)
}

/// Fetch a session on behalf of `user_id`. Non-participants get an access
/// error, not a peek.
pub async fn get_session_for(
    pool: &SqlitePool,
    session_id: &str,
    user_id: &str,
) -> Result<GameSession, GameError> {
    let session = get_session(pool, session_id).await?;
    if !session.is_participant(user_id) {
        return Err(GameError::NotParticipant);
    }

    Ok(session)
}

/// All open sessions `user_id` participates in, newest first.
pub async fn active_sessions_for(pool: &SqlitePool, user_id: &str) -> Result<Vec<GameSession>> {
    let sql = format!(
        r#"
        SELECT {SESSION_COLUMNS}
        FROM game_sessions
        WHERE (participant_one = ? OR participant_two = ?) AND status = ?
        ORDER BY created_at DESC
        "#
    );

    let rows: Vec<SessionRow> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(user_id)
        .bind(GameStatus::Pending)
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(SessionRow::into_session).collect()
}

/// Record `user_id`'s answers. A resubmission before completion replaces
/// the earlier one. Once both participants have answered, the session
/// completes and the score is computed off the participant columns, so the
/// result does not depend on who submitted first.
pub async fn submit(
    pool: &SqlitePool,
    session_id: &str,
    user_id: &str,
    answers: Vec<QuizAnswer>,
    now: DateTime<Utc>,
) -> Result<GameSession, GameError> {
    let mut tx = pool.begin().await?;

    let sql = format!("SELECT {SESSION_COLUMNS} FROM game_sessions WHERE id = ?");
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;
    let row = row.ok_or(GameError::SessionNotFound)?;

    let mut session = row.into_session()?;
    if !session.is_participant(user_id) {
        return Err(GameError::NotParticipant);
    }
    if session.status == GameStatus::Completed {
        return Err(GameError::AlreadyCompleted);
    }

    session.answers.insert(user_id.to_string(), answers);

    if session.answers.len() == 2 {
        let first = session
            .answers
            .get(&session.participant_one)
            .map(|a| a.as_slice())
            .unwrap_or(&[]);
        let second = session
            .answers
            .get(&session.participant_two)
            .map(|a| a.as_slice())
            .unwrap_or(&[]);
        session.score = compatibility_score(first, second, session.questions.len());
        session.status = GameStatus::Completed;
    }
    session.updated_at = now;

    let answers_json =
        serde_json::to_string(&session.answers).map_err(|source| DatabaseError::Corrupt {
            entity: "GameSession",
            source,
        })?;

    sqlx::query(
        r#"
        UPDATE game_sessions
        SET answers = ?, status = ?, score = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&answers_json)
    .bind(session.status)
    .bind(session.score)
    .bind(now)
    .bind(session_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(session)
}
