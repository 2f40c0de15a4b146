//! User discovery, friend graph, and profile routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use database::friend::{FriendRequestView, FriendSummary};
use database::user::ProfileUpdate;
use database::{CoupleStatus, RequestStatus, Role, User};

use crate::auth::AuthUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// User payload returned to the client. Everything but the password hash
/// and the couple note, which stays on the couple endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub bio: String,
    pub profile_pic: String,
    pub native_language: String,
    pub learning_language: String,
    pub location: String,
    pub is_onboarded: bool,
    pub is_public: bool,
    pub partner_id: Option<String>,
    pub couple_status: CoupleStatus,
    pub anniversary: Option<DateTime<Utc>>,
    pub is_member: bool,
    pub member_since: Option<DateTime<Utc>>,
    pub role: Role,
    pub gems: i64,
    pub earnings: f64,
    pub is_stealth_mode: bool,
    pub panic_shortcut: String,
    pub mood: Option<String>,
    pub last_mood_update: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            date_of_birth: user.date_of_birth,
            bio: user.bio,
            profile_pic: user.profile_pic,
            native_language: user.native_language,
            learning_language: user.learning_language,
            location: user.location,
            is_onboarded: user.is_onboarded,
            is_public: user.is_public,
            partner_id: user.partner_id,
            couple_status: user.couple_status,
            anniversary: user.anniversary,
            is_member: user.is_member,
            member_since: user.member_since,
            role: user.role,
            gems: user.gems,
            earnings: user.earnings,
            is_stealth_mode: user.is_stealth_mode,
            panic_shortcut: user.panic_shortcut,
            mood: user.mood,
            last_mood_update: user.last_mood_update,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// `{success, user}` envelope returned by account mutations.
#[derive(Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: UserResponse,
}

impl UserEnvelope {
    pub fn new(user: User) -> Self {
        Self {
            success: true,
            user: UserResponse::from(user),
        }
    }
}

/// A recommendation candidate with its language-tandem score.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedUser {
    #[serde(flatten)]
    pub user: UserResponse,
    pub match_score: i64,
    pub is_tandem_match: bool,
}

/// Compact profile used in friend lists and request views.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    pub id: String,
    pub full_name: String,
    pub profile_pic: String,
    pub native_language: String,
    pub learning_language: String,
}

impl From<FriendSummary> for FriendEntry {
    fn from(friend: FriendSummary) -> Self {
        Self {
            id: friend.id,
            full_name: friend.full_name,
            profile_pic: friend.profile_pic,
            native_language: friend.native_language,
            learning_language: friend.learning_language,
        }
    }
}

/// A friend request joined with the user on the other side of it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEntry {
    pub id: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    /// Sender for incoming requests, recipient for outgoing ones.
    pub counterpart: FriendEntry,
}

impl From<FriendRequestView> for RequestEntry {
    fn from(view: FriendRequestView) -> Self {
        Self {
            id: view.id,
            status: view.status,
            created_at: view.created_at,
            counterpart: FriendEntry::from(view.counterpart),
        }
    }
}

/// A freshly created friend request.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestResponse {
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Incoming and accepted requests in one payload, as the notifications
/// page consumes them.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestsResponse {
    pub incoming_reqs: Vec<RequestEntry>,
    pub accepted_reqs: Vec<RequestEntry>,
}

/// Query parameters for the recommendations list.
#[derive(Deserialize)]
pub struct RecommendedQuery {
    /// Name filter.
    pub q: Option<String>,
}

/// Partial profile update. Absent fields keep their stored values.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub native_language: Option<String>,
    pub learning_language: Option<String>,
    pub location: Option<String>,
    pub profile_pic: Option<String>,
    pub is_public: Option<bool>,
    pub is_stealth_mode: Option<bool>,
    pub panic_shortcut: Option<String>,
}

/// Language-tandem score between the caller and a candidate.
///
/// 100 when each natively speaks what the other is learning, 50 when the
/// candidate speaks what the caller learns, 25 when the candidate learns
/// what the caller speaks, 0 otherwise.
pub fn match_score(me: &User, candidate: &User) -> i64 {
    let speaks_what_i_learn = candidate.native_language == me.learning_language;
    let learns_what_i_speak = candidate.learning_language == me.native_language;

    if speaks_what_i_learn && learns_what_i_speak {
        100
    } else if speaks_what_i_learn {
        50
    } else if learns_what_i_speak {
        25
    } else {
        0
    }
}

/// Onboarded public profiles ranked by language tandem fit.
pub async fn recommended(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Query(query): Query<RecommendedQuery>,
) -> Result<Json<Vec<RecommendedUser>>> {
    let candidates =
        database::user::recommended_users(state.db.pool(), &me.id, query.q.as_deref()).await?;

    let mut recommended: Vec<RecommendedUser> = candidates
        .into_iter()
        .map(|candidate| {
            let match_score = match_score(&me, &candidate);
            RecommendedUser {
                match_score,
                is_tandem_match: match_score == 100,
                user: UserResponse::from(candidate),
            }
        })
        .collect();
    // candidates arrive newest first; the stable sort keeps that order
    // within equal scores
    recommended.sort_by_key(|r| std::cmp::Reverse(r.match_score));

    Ok(Json(recommended))
}

/// The caller's friends.
pub async fn friends(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<Vec<FriendEntry>>> {
    let friends = database::friend::list_friends(state.db.pool(), &me.id).await?;
    Ok(Json(friends.into_iter().map(FriendEntry::from).collect()))
}

/// Send a friend request.
pub async fn send_friend_request(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(recipient_id): Path<String>,
) -> Result<(StatusCode, Json<FriendRequestResponse>)> {
    let request =
        database::friend::send_request(state.db.pool(), &me.id, &recipient_id, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(FriendRequestResponse {
            id: request.id,
            sender: request.sender,
            recipient: request.recipient,
            status: request.status,
            created_at: request.created_at,
        }),
    ))
}

/// Accept a friend request addressed to the caller.
pub async fn accept_friend_request(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    database::friend::accept_request(state.db.pool(), &request_id, &me.id, Utc::now()).await?;
    Ok(Json(serde_json::json!({ "message": "Friend request accepted" })))
}

/// Decline a friend request addressed to the caller.
pub async fn decline_friend_request(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    database::friend::decline_request(state.db.pool(), &request_id, &me.id).await?;
    Ok(Json(serde_json::json!({ "message": "Friend request declined" })))
}

/// Pending requests addressed to the caller plus their own requests that
/// were accepted.
pub async fn friend_requests(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<FriendRequestsResponse>> {
    let incoming = database::friend::incoming_requests(state.db.pool(), &me.id).await?;
    let accepted = database::friend::accepted_requests(state.db.pool(), &me.id).await?;

    Ok(Json(FriendRequestsResponse {
        incoming_reqs: incoming.into_iter().map(RequestEntry::from).collect(),
        accepted_reqs: accepted.into_iter().map(RequestEntry::from).collect(),
    }))
}

/// Pending requests the caller has sent.
pub async fn outgoing_friend_requests(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> Result<Json<Vec<RequestEntry>>> {
    let outgoing = database::friend::outgoing_requests(state.db.pool(), &me.id).await?;
    Ok(Json(outgoing.into_iter().map(RequestEntry::from).collect()))
}

/// Remove a friend.
pub async fn unfriend(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(friend_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    database::friend::remove_friend(state.db.pool(), &me.id, &friend_id).await?;
    Ok(Json(serde_json::json!({ "message": "Friend removed" })))
}

/// Update the caller's profile. Stealth mode and custom panic shortcuts
/// are premium features.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UserEnvelope>> {
    if body.is_stealth_mode == Some(true) && !me.is_premium() {
        return Err(ApiError::forbidden(
            "Stealth Mode is a premium feature. Please upgrade to use it.",
        ));
    }
    if let Some(shortcut) = &body.panic_shortcut {
        if shortcut != "Escape" && !me.is_premium() {
            return Err(ApiError::forbidden(
                "Custom Panic Shortcuts are a premium feature.",
            ));
        }
    }

    let update = ProfileUpdate {
        full_name: body.full_name,
        bio: body.bio,
        location: body.location,
        native_language: body.native_language,
        learning_language: body.learning_language,
        profile_pic: body.profile_pic,
        is_public: body.is_public,
        is_stealth_mode: body.is_stealth_mode,
        panic_shortcut: body.panic_shortcut,
    };
    let user = database::user::update_profile(state.db.pool(), &me.id, &update, Utc::now()).await?;

    Ok(Json(UserEnvelope::new(user)))
}
