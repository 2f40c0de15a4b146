//! Friend graph operations: requests, acceptance, listing, removal.

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use thiserror::Error;

use crate::error::{DatabaseError, Result};
use crate::models::{FriendRequest, RequestStatus};
use crate::user::fetch_user;

/// Errors for friend graph operations, worded for direct API use.
#[derive(Debug, Error)]
pub enum FriendError {
    #[error("You can't send a friend request to yourself")]
    SelfRequest,

    #[error("Recipient not found")]
    UserNotFound,

    #[error("You are already friends with this user")]
    AlreadyFriends,

    #[error("A friend request already exists between you and this user")]
    RequestExists,

    #[error("Friend request not found")]
    RequestNotFound,

    #[error("You are not authorized to act on this request")]
    NotRecipient,

    #[error("You are not friends with this user")]
    NotFriends,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for FriendError {
    fn from(e: sqlx::Error) -> Self {
        FriendError::Database(DatabaseError::Sqlx(e))
    }
}

/// Compact profile used when a request or friend row is joined with the
/// other user's account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FriendSummary {
    pub id: String,
    pub full_name: String,
    pub profile_pic: String,
    pub native_language: String,
    pub learning_language: String,
}

/// A friend request joined with the user on the other side of it.
#[derive(Debug, Clone)]
pub struct FriendRequestView {
    pub id: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    /// Sender for incoming requests, recipient for outgoing ones.
    pub counterpart: FriendSummary,
}

#[derive(FromRow)]
struct RequestRow {
    id: String,
    status: RequestStatus,
    created_at: DateTime<Utc>,
    user_id: String,
    user_full_name: String,
    user_profile_pic: String,
    user_native_language: String,
    user_learning_language: String,
}

impl From<RequestRow> for FriendRequestView {
    fn from(row: RequestRow) -> Self {
        FriendRequestView {
            id: row.id,
            status: row.status,
            created_at: row.created_at,
            counterpart: FriendSummary {
                id: row.user_id,
                full_name: row.user_full_name,
                profile_pic: row.user_profile_pic,
                native_language: row.user_native_language,
                learning_language: row.user_learning_language,
            },
        }
    }
}

/// Whether two users are friends. The graph is symmetric, so one directed
/// row answers it.
pub async fn are_friends<'e, E>(executor: E, user_id: &str, other_id: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM friends WHERE user_id = ? AND friend_id = ?")
            .bind(user_id)
            .bind(other_id)
            .fetch_optional(executor)
            .await?;

    Ok(row.is_some())
}

/// Send a friend request.
pub async fn send_request(
    pool: &SqlitePool,
    sender_id: &str,
    recipient_id: &str,
    now: DateTime<Utc>,
) -> Result<FriendRequest, FriendError> {
    if sender_id == recipient_id {
        return Err(FriendError::SelfRequest);
    }

    if fetch_user(pool, recipient_id).await?.is_none() {
        return Err(FriendError::UserNotFound);
    }

    if are_friends(pool, sender_id, recipient_id).await? {
        return Err(FriendError::AlreadyFriends);
    }

    let existing: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT 1 FROM friend_requests
        WHERE (sender = ? AND recipient = ?) OR (sender = ? AND recipient = ?)
        "#,
    )
    .bind(sender_id)
    .bind(recipient_id)
    .bind(recipient_id)
    .bind(sender_id)
    .fetch_optional(pool)
    .await?;
    if existing.is_some() {
        return Err(FriendError::RequestExists);
    }

    let request = FriendRequest {
        id: uuid::Uuid::new_v4().to_string(),
        sender: sender_id.to_string(),
        recipient: recipient_id.to_string(),
        status: RequestStatus::Pending,
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO friend_requests (id, sender, recipient, status, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&request.id)
    .bind(&request.sender)
    .bind(&request.recipient)
    .bind(request.status)
    .bind(request.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            // the pair index catches a concurrent request in the other direction
            if db_err.is_unique_violation() {
                return FriendError::RequestExists;
            }
        }
        FriendError::Database(DatabaseError::Sqlx(e))
    })?;

    Ok(request)
}

/// Accept a friend request addressed to `user_id`. Marks the request
/// accepted and inserts both directed friend rows in one transaction.
pub async fn accept_request(
    pool: &SqlitePool,
    request_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<(), FriendError> {
    let mut tx = pool.begin().await?;

    let request: Option<FriendRequest> = sqlx::query_as(
        "SELECT id, sender, recipient, status, created_at FROM friend_requests WHERE id = ?",
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await?;
    let request = request.ok_or(FriendError::RequestNotFound)?;

    if request.recipient != user_id {
        return Err(FriendError::NotRecipient);
    }

    sqlx::query("UPDATE friend_requests SET status = ? WHERE id = ?")
        .bind(RequestStatus::Accepted)
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

    for (a, b) in [
        (&request.sender, &request.recipient),
        (&request.recipient, &request.sender),
    ] {
        sqlx::query(
            "INSERT OR IGNORE INTO friends (user_id, friend_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(a)
        .bind(b)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Decline a friend request addressed to `user_id` by deleting it.
pub async fn decline_request(
    pool: &SqlitePool,
    request_id: &str,
    user_id: &str,
) -> Result<(), FriendError> {
    let request: Option<FriendRequest> = sqlx::query_as(
        "SELECT id, sender, recipient, status, created_at FROM friend_requests WHERE id = ?",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;
    let request = request.ok_or(FriendError::RequestNotFound)?;

    if request.recipient != user_id {
        return Err(FriendError::NotRecipient);
    }

    sqlx::query("DELETE FROM friend_requests WHERE id = ?")
        .bind(request_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Pending requests addressed to `user_id`, joined with the sender.
pub async fn incoming_requests(pool: &SqlitePool, user_id: &str) -> Result<Vec<FriendRequestView>> {
    let rows: Vec<RequestRow> = sqlx::query_as(
        r#"
        SELECT fr.id, fr.status, fr.created_at,
               u.id AS user_id, u.full_name AS user_full_name,
               u.profile_pic AS user_profile_pic,
               u.native_language AS user_native_language,
               u.learning_language AS user_learning_language
        FROM friend_requests fr
        JOIN users u ON u.id = fr.sender
        WHERE fr.recipient = ? AND fr.status = 'pending'
        ORDER BY fr.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(FriendRequestView::from).collect())
}

/// Requests sent by `user_id` that were accepted, joined with the
/// recipient. Feeds the "X accepted your request" notification list.
pub async fn accepted_requests(pool: &SqlitePool, user_id: &str) -> Result<Vec<FriendRequestView>> {
    let rows: Vec<RequestRow> = sqlx::query_as(
        r#"
        SELECT fr.id, fr.status, fr.created_at,
               u.id AS user_id, u.full_name AS user_full_name,
               u.profile_pic AS user_profile_pic,
               u.native_language AS user_native_language,
               u.learning_language AS user_learning_language
        FROM friend_requests fr
        JOIN users u ON u.id = fr.recipient
        WHERE fr.sender = ? AND fr.status = 'accepted'
        ORDER BY fr.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(FriendRequestView::from).collect())
}

/// Pending requests sent by `user_id`, joined with the recipient.
pub async fn outgoing_requests(pool: &SqlitePool, user_id: &str) -> Result<Vec<FriendRequestView>> {
    let rows: Vec<RequestRow> = sqlx::query_as(
        r#"
        SELECT fr.id, fr.status, fr.created_at,
               u.id AS user_id, u.full_name AS user_full_name,
               u.profile_pic AS user_profile_pic,
               u.native_language AS user_native_language,
               u.learning_language AS user_learning_language
        FROM friend_requests fr
        JOIN users u ON u.id = fr.recipient
        WHERE fr.sender = ? AND fr.status = 'pending'
        ORDER BY fr.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(FriendRequestView::from).collect())
}

/// All friends of `user_id`.
pub async fn list_friends(pool: &SqlitePool, user_id: &str) -> Result<Vec<FriendSummary>> {
    let friends = sqlx::query_as::<_, FriendSummary>(
        r#"
        SELECT u.id, u.full_name, u.profile_pic, u.native_language, u.learning_language
        FROM friends f
        JOIN users u ON u.id = f.friend_id
        WHERE f.user_id = ?
        ORDER BY u.full_name
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(friends)
}

/// Remove a friendship. Deletes both directed rows and the request row so
/// the pair can go through the request flow again later.
pub async fn remove_friend(
    pool: &SqlitePool,
    user_id: &str,
    friend_id: &str,
) -> Result<(), FriendError> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        DELETE FROM friends
        WHERE (user_id = ? AND friend_id = ?) OR (user_id = ? AND friend_id = ?)
        "#,
    )
    .bind(user_id)
    .bind(friend_id)
    .bind(friend_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(FriendError::NotFriends);
    }

    sqlx::query(
        r#"
        DELETE FROM friend_requests
        WHERE (sender = ? AND recipient = ?) OR (sender = ? AND recipient = ?)
        "#,
    )
    .bind(user_id)
    .bind(friend_id)
    .bind(friend_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
