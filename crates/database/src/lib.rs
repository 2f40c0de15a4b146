//! SQLite persistence layer for freeChat.
//!
//! This crate provides async database operations for user accounts, the
//! friend graph, couple pairing, quiz game sessions, and the gem wallet
//! using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use database::{user::NewUser, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:freechat.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a user
//!     let user = database::user::create_user(
//!         db.pool(),
//!         &NewUser {
//!             id: "c27fb365-0c84-4cf2-8555-814bb065e448".to_string(),
//!             full_name: "Priya Sharma".to_string(),
//!             email: "priya@example.com".to_string(),
//!             password_hash: "<bcrypt hash>".to_string(),
//!             date_of_birth: "1999-04-12".parse()?,
//!             profile_pic: String::new(),
//!             created_at: Utc::now(),
//!         },
//!     )
//!     .await?;
//!     println!("created {}", user.id);
//!
//!     Ok(())
//! }
//! ```

pub mod bond;
pub mod couple;
pub mod error;
pub mod friend;
pub mod game;
pub mod models;
pub mod user;
pub mod validation;
pub mod wallet;

pub use couple::CoupleError;
pub use error::{DatabaseError, Result};
pub use friend::FriendError;
pub use game::GameError;
pub use models::{
    CoupleStatus, FriendRequest, GameQuestion, GameSession, GameStatus, Question, QuizAnswer,
    RequestStatus, Role, User,
};
pub use validation::ValidationError;
pub use wallet::WalletError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Sized for a handful of concurrent request handlers per instance.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/freechat.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::tests::{seed_user, test_db};
    use chrono::Utc;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = test_db().await;
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_signup_to_gift_across_modules() {
        let db = test_db().await;

        seed_user(&db, "a", "Asha", "1999-03-10").await;
        seed_user(&db, "b", "Bela", "1998-11-02").await;

        let request = friend::send_request(db.pool(), "a", "b", Utc::now())
            .await
            .unwrap();
        friend::accept_request(db.pool(), &request.id, "b", Utc::now())
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        couple::request(db.pool(), "a", "b", today, Utc::now())
            .await
            .unwrap();
        couple::accept(db.pool(), "b", "a", today, Utc::now())
            .await
            .unwrap();

        wallet::credit_gems(db.pool(), "a", 20, Utc::now())
            .await
            .unwrap();
        let receipt = wallet::send_gift(db.pool(), "a", "b", 20, Utc::now())
            .await
            .unwrap();
        assert_eq!(receipt.remaining_gems, 0);

        let b = user::get_user(db.pool(), "b").await.unwrap();
        assert_eq!(b.couple_status, CoupleStatus::Coupled);
        assert!((b.earnings - 14.0).abs() < 1e-9);
    }
}
