//! Database models.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Minimum age to use any couple feature.
pub const MIN_COUPLE_AGE: i32 = 14;

/// Age at which a user counts as an adult for gated content.
pub const ADULT_AGE: i32 = 18;

/// Couple pairing state, always mirrored on both members of a pair.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CoupleStatus {
    /// Not paired and no request in flight.
    #[default]
    None,
    /// A request is in flight; `partner_id` points at the other member.
    Pending,
    /// Paired.
    Coupled,
}

/// Lifecycle of a friend request row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
}

/// Lifecycle of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum GameStatus {
    /// Waiting for one or both participants to submit answers.
    Pending,
    /// Both participants submitted; the score is final.
    Completed,
}

/// Account role. Admins bypass the premium membership gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A registered user account.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    /// UUID assigned at signup.
    pub id: String,
    /// Display name.
    pub full_name: String,
    /// Login email, unique across accounts.
    pub email: String,
    /// Bcrypt hash of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Date of birth, used for age gating.
    pub date_of_birth: NaiveDate,
    /// Free-form profile text.
    pub bio: String,
    /// Avatar URL.
    pub profile_pic: String,
    /// Language the user speaks.
    pub native_language: String,
    /// Language the user is learning.
    pub learning_language: String,
    /// Free-form location text.
    pub location: String,
    /// Whether the user completed onboarding.
    pub is_onboarded: bool,
    /// Whether the profile shows up in recommendations.
    pub is_public: bool,
    /// The other member of the couple while pending or coupled.
    pub partner_id: Option<String>,
    /// Couple pairing state.
    pub couple_status: CoupleStatus,
    /// Who initiated the in-flight couple request.
    pub couple_request_sender_id: Option<String>,
    /// When the couple was formed.
    pub anniversary: Option<DateTime<Utc>>,
    /// Shared note visible to both members of the couple.
    pub romantic_note: String,
    /// When the shared note last changed.
    pub romantic_note_updated_at: Option<DateTime<Utc>>,
    /// Whether the user holds a premium membership.
    pub is_member: bool,
    /// When the membership started.
    pub member_since: Option<DateTime<Utc>>,
    /// Account role.
    pub role: Role,
    /// Spendable gem balance.
    pub gems: i64,
    /// Lifetime earnings from received gifts, in gems.
    pub earnings: f64,
    /// Premium: disguise the app while browsing.
    pub is_stealth_mode: bool,
    /// Premium: key that triggers the disguise.
    pub panic_shortcut: String,
    /// Current mood shared with the partner.
    pub mood: Option<String>,
    /// When the mood last changed.
    pub last_mood_update: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Age in whole years on `today`.
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        let dob = self.date_of_birth;
        let mut age = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        age
    }

    /// Whether the user counts as an adult on `today`.
    pub fn is_adult_on(&self, today: NaiveDate) -> bool {
        self.age_on(today) >= ADULT_AGE
    }

    /// Whether premium-gated features are available to this user.
    pub fn is_premium(&self) -> bool {
        self.is_member || self.role == Role::Admin
    }
}

/// A friend request between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FriendRequest {
    /// UUID assigned when the request is sent.
    pub id: String,
    /// User who sent the request.
    pub sender: String,
    /// User who received the request.
    pub recipient: String,
    /// Current state.
    pub status: RequestStatus,
    /// When the request was sent.
    pub created_at: DateTime<Utc>,
}

/// One question of a game template, stored verbatim on the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameQuestion {
    pub question: String,
    pub options: Vec<String>,
}

/// One submitted answer, tied to a question by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question_index: i64,
    pub answer: String,
}

/// A quiz session between the two members of a couple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    /// UUID assigned when the session is created.
    pub id: String,
    /// Participant that started the session.
    pub participant_one: String,
    /// The other participant.
    pub participant_two: String,
    /// Which template the session was started from.
    pub game_type: String,
    /// Questions copied from the template at start time.
    pub questions: Vec<GameQuestion>,
    /// Submitted answers keyed by participant id.
    pub answers: BTreeMap<String, Vec<QuizAnswer>>,
    /// Lifecycle state.
    pub status: GameStatus,
    /// Compatibility score in percent, 0 until completed.
    pub score: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl GameSession {
    /// Whether `user_id` is one of the two participants.
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participant_one == user_id || self.participant_two == user_id
    }
}

/// A bond question served as the daily prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Question {
    /// UUID assigned when the question is stored.
    pub id: String,
    /// Prompt text.
    pub text: String,
    /// Topic bucket (future, love, fun, deep, conflict).
    pub category: String,
    /// Pin the question to a specific day, if set.
    pub active_date: Option<NaiveDate>,
}
