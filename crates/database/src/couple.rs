//! Couple pairing: request, accept, unlink, and the shared note.
//!
//! Pairing state lives on both user rows and must stay mirrored: while a
//! request is pending or a couple exists, each member's `partner_id` points
//! at the other. Every transition updates both rows in one transaction so a
//! crash between the two writes cannot leave a half-paired state.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;

use crate::error::{DatabaseError, Result};
use crate::friend::are_friends;
use crate::models::{CoupleStatus, User, MIN_COUPLE_AGE};
use crate::user::fetch_user;

/// Errors for couple operations, worded for direct API use.
#[derive(Debug, Error)]
pub enum CoupleError {
    #[error("You can't send a couple request to yourself")]
    SelfRequest,

    #[error("User not found")]
    UserNotFound,

    #[error("Both of you must be at least {} years old to use couple features", MIN_COUPLE_AGE)]
    AgeRestricted,

    #[error("You are already in a couple")]
    AlreadyCoupled,

    #[error("This user is already in a couple")]
    TargetAlreadyCoupled,

    #[error("You already have a pending couple request")]
    RequestPending,

    #[error("This user already has a pending couple request")]
    TargetRequestPending,

    #[error("You can only send couple requests to friends")]
    NotFriends,

    #[error("No pending couple request found")]
    NoPendingRequest,

    #[error("You can't accept your own couple request")]
    OwnRequest,

    #[error("You are not in a couple")]
    NotCoupled,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for CoupleError {
    fn from(e: sqlx::Error) -> Self {
        CoupleError::Database(DatabaseError::Sqlx(e))
    }
}

/// Compact partner profile embedded in the status view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerSummary {
    pub id: String,
    pub full_name: String,
    pub profile_pic: String,
    pub bio: String,
}

/// Everything the couple page needs in one read.
#[derive(Debug, Clone)]
pub struct CoupleStatusView {
    pub couple_status: CoupleStatus,
    pub partner: Option<PartnerSummary>,
    pub anniversary: Option<DateTime<Utc>>,
    pub couple_request_sender_id: Option<String>,
    pub romantic_note: String,
    pub romantic_note_updated_at: Option<DateTime<Utc>>,
    /// Both members are 18 or older. False whenever there is no partner.
    pub is_both_adult: bool,
}

async fn fetch_pair(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    partner_id: &str,
) -> Result<(User, User), CoupleError> {
    let me = fetch_user(&mut **tx, user_id)
        .await?
        .ok_or(CoupleError::UserNotFound)?;
    let partner = fetch_user(&mut **tx, partner_id)
        .await?
        .ok_or(CoupleError::UserNotFound)?;
    Ok((me, partner))
}

/// Send a couple request to a friend. Both rows move to `pending` and
/// record who initiated.
pub async fn request(
    pool: &SqlitePool,
    user_id: &str,
    partner_id: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(), CoupleError> {
    if user_id == partner_id {
        return Err(CoupleError::SelfRequest);
    }

    let mut tx = pool.begin().await?;
    let (me, partner) = fetch_pair(&mut tx, user_id, partner_id).await?;

    if me.age_on(today) < MIN_COUPLE_AGE || partner.age_on(today) < MIN_COUPLE_AGE {
        return Err(CoupleError::AgeRestricted);
    }
    if me.couple_status == CoupleStatus::Coupled {
        return Err(CoupleError::AlreadyCoupled);
    }
    if partner.couple_status == CoupleStatus::Coupled {
        return Err(CoupleError::TargetAlreadyCoupled);
    }
    if me.couple_status == CoupleStatus::Pending {
        return Err(CoupleError::RequestPending);
    }
    if partner.couple_status == CoupleStatus::Pending {
        return Err(CoupleError::TargetRequestPending);
    }
    if !are_friends(&mut *tx, user_id, partner_id).await? {
        return Err(CoupleError::NotFriends);
    }

    for (id, other) in [(user_id, partner_id), (partner_id, user_id)] {
        sqlx::query(
            r#"
            UPDATE users
            SET partner_id = ?, couple_status = ?, couple_request_sender_id = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(other)
        .bind(CoupleStatus::Pending)
        .bind(user_id)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Accept a pending couple request from `sender_id`. Both rows move to
/// `coupled` with the same anniversary.
pub async fn accept(
    pool: &SqlitePool,
    user_id: &str,
    sender_id: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(), CoupleError> {
    let mut tx = pool.begin().await?;
    let (me, sender) = fetch_pair(&mut tx, user_id, sender_id).await?;

    let mirrored = me.couple_status == CoupleStatus::Pending
        && sender.couple_status == CoupleStatus::Pending
        && me.partner_id.as_deref() == Some(sender_id)
        && sender.partner_id.as_deref() == Some(user_id);
    if !mirrored {
        return Err(CoupleError::NoPendingRequest);
    }
    if me.couple_request_sender_id.as_deref() == Some(user_id) {
        return Err(CoupleError::OwnRequest);
    }
    if me.age_on(today) < MIN_COUPLE_AGE || sender.age_on(today) < MIN_COUPLE_AGE {
        return Err(CoupleError::AgeRestricted);
    }

    for id in [user_id, sender_id] {
        sqlx::query(
            r#"
            UPDATE users
            SET couple_status = ?, anniversary = ?, couple_request_sender_id = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(CoupleStatus::Coupled)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Leave the couple, or cancel a pending request. Resets pairing state on
/// both sides. The partner row may be gone or already reset; the caller's
/// side is cleared regardless.
pub async fn unlink(pool: &SqlitePool, user_id: &str, now: DateTime<Utc>) -> Result<(), CoupleError> {
    let mut tx = pool.begin().await?;

    let me = fetch_user(&mut *tx, user_id)
        .await?
        .ok_or(CoupleError::UserNotFound)?;
    let partner_id = me.partner_id.ok_or(CoupleError::NotCoupled)?;

    for id in [user_id, partner_id.as_str()] {
        sqlx::query(
            r#"
            UPDATE users
            SET partner_id = NULL, couple_status = ?, anniversary = NULL,
                couple_request_sender_id = NULL, romantic_note = '',
                romantic_note_updated_at = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(CoupleStatus::None)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Replace the shared note on both rows.
pub async fn update_note(
    pool: &SqlitePool,
    user_id: &str,
    note: &str,
    now: DateTime<Utc>,
) -> Result<(), CoupleError> {
    let me = fetch_user(pool, user_id)
        .await?
        .ok_or(CoupleError::UserNotFound)?;
    if me.couple_status != CoupleStatus::Coupled {
        return Err(CoupleError::NotCoupled);
    }
    let partner_id = me.partner_id.ok_or(CoupleError::NotCoupled)?;

    sqlx::query(
        r#"
        UPDATE users
        SET romantic_note = ?, romantic_note_updated_at = ?, updated_at = ?
        WHERE id IN (?, ?)
        "#,
    )
    .bind(note)
    .bind(now)
    .bind(now)
    .bind(user_id)
    .bind(&partner_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Whether the user and their partner are both adults. False when there is
/// no partner or the partner row is gone.
pub async fn are_both_adult(pool: &SqlitePool, user: &User, today: NaiveDate) -> Result<bool> {
    let Some(partner_id) = user.partner_id.as_deref() else {
        return Ok(false);
    };
    let Some(partner) = fetch_user(pool, partner_id).await? else {
        return Ok(false);
    };

    Ok(user.is_adult_on(today) && partner.is_adult_on(today))
}

/// Assemble the couple page view for `user`.
pub async fn status(pool: &SqlitePool, user: &User, today: NaiveDate) -> Result<CoupleStatusView> {
    let partner = match user.partner_id.as_deref() {
        Some(partner_id) => fetch_user(pool, partner_id).await?,
        None => None,
    };

    let is_both_adult = partner
        .as_ref()
        .map(|p| user.is_adult_on(today) && p.is_adult_on(today))
        .unwrap_or(false);

    Ok(CoupleStatusView {
        couple_status: user.couple_status,
        partner: partner.map(|p| PartnerSummary {
            id: p.id,
            full_name: p.full_name,
            profile_pic: p.profile_pic,
            bio: p.bio,
        }),
        anniversary: user.anniversary,
        couple_request_sender_id: user.couple_request_sender_id.clone(),
        romantic_note: user.romantic_note.clone(),
        romantic_note_updated_at: user.romantic_note_updated_at,
        is_both_adult,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friend;
    use crate::user::tests::{seed_user, test_db};
    use crate::user::get_user;
    use crate::Database;

    async fn befriend(db: &Database, a: &str, b: &str) {
        let request = friend::send_request(db.pool(), a, b, Utc::now())
            .await
            .unwrap();
        friend::accept_request(db.pool(), &request.id, b, Utc::now())
            .await
            .unwrap();
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Two adult friends, ready to pair.
    async fn seed_couple_candidates(db: &Database) {
        seed_user(db, "a", "Asha", "2000-01-01").await;
        seed_user(db, "b", "Bela", "2001-06-15").await;
        befriend(db, "a", "b").await;
    }

    #[tokio::test]
    async fn test_full_couple_lifecycle() {
        let db = test_db().await;
        seed_couple_candidates(&db).await;

        request(db.pool(), "a", "b", today(), Utc::now())
            .await
            .unwrap();

        let a = get_user(db.pool(), "a").await.unwrap();
        let b = get_user(db.pool(), "b").await.unwrap();
        assert_eq!(a.couple_status, CoupleStatus::Pending);
        assert_eq!(b.couple_status, CoupleStatus::Pending);
        assert_eq!(a.partner_id.as_deref(), Some("b"));
        assert_eq!(b.partner_id.as_deref(), Some("a"));
        assert_eq!(a.couple_request_sender_id.as_deref(), Some("a"));
        assert_eq!(b.couple_request_sender_id.as_deref(), Some("a"));

        accept(db.pool(), "b", "a", today(), Utc::now())
            .await
            .unwrap();

        let a = get_user(db.pool(), "a").await.unwrap();
        let b = get_user(db.pool(), "b").await.unwrap();
        assert_eq!(a.couple_status, CoupleStatus::Coupled);
        assert_eq!(b.couple_status, CoupleStatus::Coupled);
        assert!(a.anniversary.is_some());
        assert_eq!(a.anniversary, b.anniversary);
        assert!(a.couple_request_sender_id.is_none());
        assert!(b.couple_request_sender_id.is_none());

        unlink(db.pool(), "a", Utc::now()).await.unwrap();

        let a = get_user(db.pool(), "a").await.unwrap();
        let b = get_user(db.pool(), "b").await.unwrap();
        for user in [&a, &b] {
            assert_eq!(user.couple_status, CoupleStatus::None);
            assert!(user.partner_id.is_none());
            assert!(user.anniversary.is_none());
            assert!(user.couple_request_sender_id.is_none());
        }
    }

    #[tokio::test]
    async fn test_request_requires_friendship() {
        let db = test_db().await;
        seed_user(&db, "a", "Asha", "1999-03-10").await;
        seed_user(&db, "b", "Bela", "1998-11-02").await;

        let result = request(db.pool(), "a", "b", today(), Utc::now()).await;
        assert!(matches!(result, Err(CoupleError::NotFriends)));
    }

    #[tokio::test]
    async fn test_request_rejects_self_and_missing_target() {
        let db = test_db().await;
        seed_user(&db, "a", "Asha", "1999-03-10").await;

        assert!(matches!(
            request(db.pool(), "a", "a", today(), Utc::now()).await,
            Err(CoupleError::SelfRequest)
        ));
        assert!(matches!(
            request(db.pool(), "a", "ghost", today(), Utc::now()).await,
            Err(CoupleError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_age_gate_on_request() {
        let db = test_db().await;
        let underage = today()
            .checked_sub_months(chrono::Months::new(12 * 13))
            .unwrap();
        seed_user(&db, "a", "Asha", "1999-03-10").await;
        seed_user(&db, "kid", "Kiran", &underage.format("%Y-%m-%d").to_string()).await;
        befriend(&db, "a", "kid").await;

        assert!(matches!(
            request(db.pool(), "a", "kid", today(), Utc::now()).await,
            Err(CoupleError::AgeRestricted)
        ));
        assert!(matches!(
            request(db.pool(), "kid", "a", today(), Utc::now()).await,
            Err(CoupleError::AgeRestricted)
        ));

        let a = get_user(db.pool(), "a").await.unwrap();
        assert_eq!(a.couple_status, CoupleStatus::None);
    }

    #[tokio::test]
    async fn test_request_blocked_by_existing_state() {
        let db = test_db().await;
        seed_couple_candidates(&db).await;
        seed_user(&db, "c", "Chandni", "1997-07-07").await;
        befriend(&db, "c", "a").await;
        befriend(&db, "c", "b").await;

        request(db.pool(), "a", "b", today(), Utc::now())
            .await
            .unwrap();

        // both sides of the pending pair are off the market
        assert!(matches!(
            request(db.pool(), "a", "c", today(), Utc::now()).await,
            Err(CoupleError::RequestPending)
        ));
        assert!(matches!(
            request(db.pool(), "c", "b", today(), Utc::now()).await,
            Err(CoupleError::TargetRequestPending)
        ));

        accept(db.pool(), "b", "a", today(), Utc::now())
            .await
            .unwrap();

        assert!(matches!(
            request(db.pool(), "a", "c", today(), Utc::now()).await,
            Err(CoupleError::AlreadyCoupled)
        ));
        assert!(matches!(
            request(db.pool(), "c", "b", today(), Utc::now()).await,
            Err(CoupleError::TargetAlreadyCoupled)
        ));
    }

    #[tokio::test]
    async fn test_accept_validations() {
        let db = test_db().await;
        seed_couple_candidates(&db).await;

        assert!(matches!(
            accept(db.pool(), "b", "a", today(), Utc::now()).await,
            Err(CoupleError::NoPendingRequest)
        ));

        request(db.pool(), "a", "b", today(), Utc::now())
            .await
            .unwrap();

        // the initiator can't accept their own request
        assert!(matches!(
            accept(db.pool(), "a", "b", today(), Utc::now()).await,
            Err(CoupleError::OwnRequest)
        ));

        let a = get_user(db.pool(), "a").await.unwrap();
        assert_eq!(a.couple_status, CoupleStatus::Pending);
    }

    #[tokio::test]
    async fn test_unlink_requires_partner() {
        let db = test_db().await;
        seed_user(&db, "a", "Asha", "1999-03-10").await;

        assert!(matches!(
            unlink(db.pool(), "a", Utc::now()).await,
            Err(CoupleError::NotCoupled)
        ));
    }

    #[tokio::test]
    async fn test_unlink_cancels_pending_request() {
        let db = test_db().await;
        seed_couple_candidates(&db).await;

        request(db.pool(), "a", "b", today(), Utc::now())
            .await
            .unwrap();
        unlink(db.pool(), "b", Utc::now()).await.unwrap();

        let a = get_user(db.pool(), "a").await.unwrap();
        let b = get_user(db.pool(), "b").await.unwrap();
        assert_eq!(a.couple_status, CoupleStatus::None);
        assert_eq!(b.couple_status, CoupleStatus::None);
    }

    #[tokio::test]
    async fn test_unlink_with_dangling_partner_still_resets_caller() {
        let db = test_db().await;
        seed_user(&db, "a", "Asha", "1999-03-10").await;

        // pairing state pointing at a row that no longer exists
        sqlx::query("UPDATE users SET partner_id = 'ghost', couple_status = 'coupled' WHERE id = 'a'")
            .execute(db.pool())
            .await
            .unwrap();

        unlink(db.pool(), "a", Utc::now()).await.unwrap();

        let a = get_user(db.pool(), "a").await.unwrap();
        assert_eq!(a.couple_status, CoupleStatus::None);
        assert!(a.partner_id.is_none());
    }

    #[tokio::test]
    async fn test_note_mirrors_and_clears_on_unlink() {
        let db = test_db().await;
        seed_couple_candidates(&db).await;

        assert!(matches!(
            update_note(db.pool(), "a", "hi", Utc::now()).await,
            Err(CoupleError::NotCoupled)
        ));

        request(db.pool(), "a", "b", today(), Utc::now())
            .await
            .unwrap();
        // pending is not enough for the note
        assert!(matches!(
            update_note(db.pool(), "a", "hi", Utc::now()).await,
            Err(CoupleError::NotCoupled)
        ));

        accept(db.pool(), "b", "a", today(), Utc::now())
            .await
            .unwrap();
        update_note(db.pool(), "a", "see you at eight", Utc::now())
            .await
            .unwrap();

        let a = get_user(db.pool(), "a").await.unwrap();
        let b = get_user(db.pool(), "b").await.unwrap();
        assert_eq!(a.romantic_note, "see you at eight");
        assert_eq!(b.romantic_note, "see you at eight");
        assert!(b.romantic_note_updated_at.is_some());

        unlink(db.pool(), "b", Utc::now()).await.unwrap();
        let a = get_user(db.pool(), "a").await.unwrap();
        assert_eq!(a.romantic_note, "");
        assert!(a.romantic_note_updated_at.is_none());
    }

    #[tokio::test]
    async fn test_status_view_reports_adults() {
        let db = test_db().await;
        let seventeen = today()
            .checked_sub_months(chrono::Months::new(12 * 17))
            .unwrap();
        seed_user(&db, "a", "Asha", "1999-03-10").await;
        seed_user(&db, "t", "Tara", &seventeen.format("%Y-%m-%d").to_string()).await;
        befriend(&db, "a", "t").await;

        request(db.pool(), "a", "t", today(), Utc::now())
            .await
            .unwrap();
        accept(db.pool(), "t", "a", today(), Utc::now())
            .await
            .unwrap();

        let a = get_user(db.pool(), "a").await.unwrap();
        let view = status(db.pool(), &a, today()).await.unwrap();
        assert_eq!(view.couple_status, CoupleStatus::Coupled);
        assert_eq!(view.partner.as_ref().unwrap().full_name, "Tara");
        assert!(!view.is_both_adult);

        // alone, there is nobody to be adult with
        let solo = seed_user(&db, "solo", "Sana", "1990-01-01").await;
        let view = status(db.pool(), &solo, today()).await.unwrap();
        assert!(view.partner.is_none());
        assert!(!view.is_both_adult);
    }
}
