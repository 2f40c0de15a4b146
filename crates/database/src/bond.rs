//! Daily bond features: mood check-ins and the question of the day.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{Question, User};
use crate::user::get_user;

/// Stock questions inserted on first start so the daily prompt never comes
/// up empty.
const SEED_QUESTIONS: [(&str, &str); 5] = [
    (
        "What’s one small challenge you faced today that I can support you with?",
        "future",
    ),
    (
        "What is your favorite memory of us from the last month?",
        "love",
    ),
    (
        "If we could escape to anywhere for a weekend, where would we go?",
        "fun",
    ),
    (
        "What is one thing I do that makes you feel most loved?",
        "deep",
    ),
    (
        "How can we make our communication even better this week?",
        "conflict",
    ),
];

/// Partner's side of the daily check-in.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PartnerCheckIn {
    pub full_name: String,
    pub profile_pic: String,
    pub mood: Option<String>,
    pub last_mood_update: Option<DateTime<Utc>>,
}

/// Record the user's mood for today and return the fresh row.
pub async fn set_mood(
    pool: &SqlitePool,
    user_id: &str,
    mood: &str,
    now: DateTime<Utc>,
) -> Result<User> {
    let result = sqlx::query(
        "UPDATE users SET mood = ?, last_mood_update = ?, updated_at = ? WHERE id = ?",
    )
    .bind(mood)
    .bind(now)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: user_id.to_string(),
        });
    }

    get_user(pool, user_id).await
}

/// The question for `today`: a question pinned to that date if one exists,
/// otherwise a random one from the pool. `None` only when the pool is
/// empty.
pub async fn daily_question(pool: &SqlitePool, today: NaiveDate) -> Result<Option<Question>> {
    let pinned = sqlx::query_as::<_, Question>(
        "SELECT id, text, category, active_date FROM questions WHERE active_date = ?",
    )
    .bind(today)
    .fetch_optional(pool)
    .await?;
    if pinned.is_some() {
        return Ok(pinned);
    }

    let random = sqlx::query_as::<_, Question>(
        "SELECT id, text, category, active_date FROM questions ORDER BY RANDOM() LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(random)
}

/// The partner's check-in state, or `None` when the user has no partner or
/// the partner row is gone.
pub async fn partner_check_in(pool: &SqlitePool, user: &User) -> Result<Option<PartnerCheckIn>> {
    let Some(partner_id) = user.partner_id.as_deref() else {
        return Ok(None);
    };

    let partner = sqlx::query_as::<_, PartnerCheckIn>(
        "SELECT full_name, profile_pic, mood, last_mood_update FROM users WHERE id = ?",
    )
    .bind(partner_id)
    .fetch_optional(pool)
    .await?;

    Ok(partner)
}

/// Insert the stock questions when the pool is empty. Returns how many were
/// inserted.
pub async fn seed_questions(pool: &SqlitePool) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(0);
    }

    for (text, category) in SEED_QUESTIONS {
        sqlx::query("INSERT INTO questions (id, text, category) VALUES (?, ?, ?)")
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(text)
            .bind(category)
            .execute(pool)
            .await?;
    }

    tracing::info!(count = SEED_QUESTIONS.len(), "Seeded daily questions");
    Ok(SEED_QUESTIONS.len())
}
