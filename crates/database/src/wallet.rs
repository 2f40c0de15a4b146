//! Gem wallet: gift transfers and balance top-ups.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::error::{DatabaseError, Result};
use crate::user::fetch_user;

/// Share of each gift credited to the creator. The remaining 30% is the
/// platform cut and is not configurable.
pub const CREATOR_SHARE: f64 = 0.7;

/// Errors for wallet operations, worded for direct API use.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("You cannot give a gift to yourself")]
    SelfGift,

    #[error("Amount must be a positive number")]
    InvalidAmount,

    #[error("User not found")]
    UserNotFound,

    #[error("Not enough gems. Please recharge.")]
    InsufficientBalance,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for WalletError {
    fn from(e: sqlx::Error) -> Self {
        WalletError::Database(DatabaseError::Sqlx(e))
    }
}

/// Outcome of a successful gift transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct GiftReceipt {
    /// Sender's gem balance after the debit.
    pub remaining_gems: i64,
    /// Display name of the receiving creator.
    pub creator_name: String,
}

/// Debit `amount` gems from the sender and credit the creator's earnings
/// with their share, atomically. A failed transfer leaves both balances
/// untouched.
pub async fn send_gift(
    pool: &SqlitePool,
    sender_id: &str,
    creator_id: &str,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<GiftReceipt, WalletError> {
    if sender_id == creator_id {
        return Err(WalletError::SelfGift);
    }
    if amount <= 0 {
        return Err(WalletError::InvalidAmount);
    }

    let mut tx = pool.begin().await?;

    let sender = fetch_user(&mut *tx, sender_id)
        .await?
        .ok_or(WalletError::UserNotFound)?;
    let creator = fetch_user(&mut *tx, creator_id)
        .await?
        .ok_or(WalletError::UserNotFound)?;

    if sender.gems < amount {
        return Err(WalletError::InsufficientBalance);
    }

    // guarded debit, in case another transfer spent the balance since the
    // read above
    let debited = sqlx::query(
        "UPDATE users SET gems = gems - ?, updated_at = ? WHERE id = ? AND gems >= ?",
    )
    .bind(amount)
    .bind(now)
    .bind(sender_id)
    .bind(amount)
    .execute(&mut *tx)
    .await?;
    if debited.rows_affected() == 0 {
        return Err(WalletError::InsufficientBalance);
    }

    sqlx::query("UPDATE users SET earnings = earnings + ?, updated_at = ? WHERE id = ?")
        .bind(amount as f64 * CREATOR_SHARE)
        .bind(now)
        .bind(creator_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(GiftReceipt {
        remaining_gems: sender.gems - amount,
        creator_name: creator.full_name,
    })
}

/// Add purchased gems to a balance and return the new total.
pub async fn credit_gems(
    pool: &SqlitePool,
    user_id: &str,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<i64, WalletError> {
    if amount <= 0 {
        return Err(WalletError::InvalidAmount);
    }

    let result = sqlx::query("UPDATE users SET gems = gems + ?, updated_at = ? WHERE id = ?")
        .bind(amount)
        .bind(now)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(WalletError::UserNotFound);
    }

    let user = fetch_user(pool, user_id)
        .await?
        .ok_or(WalletError::UserNotFound)?;
    Ok(user.gems)
}
