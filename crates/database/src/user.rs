//! User account operations.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Full column list for `users`, shared by every query that returns a row.
pub(crate) const USER_COLUMNS: &str = "id, full_name, email, password_hash, date_of_birth, \
     bio, profile_pic, native_language, learning_language, location, \
     is_onboarded, is_public, partner_id, couple_status, couple_request_sender_id, \
     anniversary, romantic_note, romantic_note_updated_at, is_member, member_since, \
     role, gems, earnings, is_stealth_mode, panic_shortcut, mood, last_mood_update, \
     created_at, updated_at";

/// Fields required to create an account. Everything else starts at its
/// schema default.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: NaiveDate,
    pub profile_pic: String,
    pub created_at: DateTime<Utc>,
}

/// Optional profile fields settable after signup. `None` leaves the stored
/// value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub native_language: Option<String>,
    pub learning_language: Option<String>,
    pub profile_pic: Option<String>,
    pub is_public: Option<bool>,
    pub is_stealth_mode: Option<bool>,
    pub panic_shortcut: Option<String>,
}

/// Fields collected during onboarding.
#[derive(Debug, Clone)]
pub struct Onboarding {
    pub full_name: String,
    pub bio: String,
    pub native_language: String,
    pub learning_language: String,
    pub location: String,
}

/// Fetch a user by id on any executor, so callers inside a transaction see
/// their own uncommitted writes.
pub(crate) async fn fetch_user<'e, E>(executor: E, id: &str) -> Result<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

/// Create a new user account.
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (id, full_name, email, password_hash, date_of_birth,
                           profile_pic, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new_user.id)
    .bind(&new_user.full_name)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.date_of_birth)
    .bind(&new_user.profile_pic)
    .bind(new_user.created_at)
    .bind(new_user.created_at)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "User",
                    id: new_user.email.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_user(pool, &new_user.id).await
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    fetch_user(pool, id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        })
}

/// Look up a user by login email.
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Apply a partial profile update and return the fresh row.
pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    update: &ProfileUpdate,
    now: DateTime<Utc>,
) -> Result<User> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET full_name = COALESCE(?, full_name),
            bio = COALESCE(?, bio),
            location = COALESCE(?, location),
            native_language = COALESCE(?, native_language),
            learning_language = COALESCE(?, learning_language),
            profile_pic = COALESCE(?, profile_pic),
            is_public = COALESCE(?, is_public),
            is_stealth_mode = COALESCE(?, is_stealth_mode),
            panic_shortcut = COALESCE(?, panic_shortcut),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.full_name)
    .bind(&update.bio)
    .bind(&update.location)
    .bind(&update.native_language)
    .bind(&update.learning_language)
    .bind(&update.profile_pic)
    .bind(update.is_public)
    .bind(update.is_stealth_mode)
    .bind(&update.panic_shortcut)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    get_user(pool, id).await
}

/// Complete onboarding and return the fresh row.
pub async fn onboard(
    pool: &SqlitePool,
    id: &str,
    onboarding: &Onboarding,
    now: DateTime<Utc>,
) -> Result<User> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET full_name = ?, bio = ?, native_language = ?, learning_language = ?,
            location = ?, is_onboarded = 1, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&onboarding.full_name)
    .bind(&onboarding.bio)
    .bind(&onboarding.native_language)
    .bind(&onboarding.learning_language)
    .bind(&onboarding.location)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    get_user(pool, id).await
}

/// Candidates for the recommendations page: onboarded public profiles that
/// are not the caller and not already friends with them. Newest first;
/// compatibility ranking happens in the caller.
pub async fn recommended_users(
    pool: &SqlitePool,
    user_id: &str,
    search: Option<&str>,
) -> Result<Vec<User>> {
    let sql = format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE id != ?
          AND is_onboarded = 1
          AND is_public = 1
          AND id NOT IN (SELECT friend_id FROM friends WHERE user_id = ?)
          AND (? IS NULL OR full_name LIKE '%' || ? || '%')
        ORDER BY created_at DESC
        "#
    );

    let users = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .bind(user_id)
        .bind(search)
        .bind(search)
        .fetch_all(pool)
        .await?;

    Ok(users)
}

/// Flip the premium membership flag.
pub async fn set_membership(
    pool: &SqlitePool,
    id: &str,
    is_member: bool,
    member_since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_member = ?, member_since = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(is_member)
    .bind(member_since)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            id: id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::Database;

    /// Pool size 1 because every connection to `sqlite::memory:` gets its
    /// own database.
    pub(crate) async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    pub(crate) fn new_user(id: &str, name: &str, email: &str, dob: &str) -> NewUser {
        NewUser {
            id: id.to_string(),
            full_name: name.to_string(),
            email: email.to_string(),
            password_hash: "$2b$12$fake-hash-for-tests".to_string(),
            date_of_birth: dob.parse().unwrap(),
            profile_pic: "https://avatar.iran.liara.run/public/7.png".to_string(),
            created_at: Utc::now(),
        }
    }

    pub(crate) async fn seed_user(db: &Database, id: &str, name: &str, dob: &str) -> User {
        let email = format!("{id}@example.com");
        create_user(db.pool(), &new_user(id, name, &email, dob))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = test_db().await;

        let user = seed_user(&db, "u1", "Alice", "2000-01-01").await;
        assert_eq!(user.full_name, "Alice");
        assert_eq!(user.gems, 0);
        assert!(!user.is_onboarded);
        assert!(user.is_public);
        assert_eq!(user.panic_shortcut, "Escape");

        let fetched = get_user(db.pool(), "u1").await.unwrap();
        assert_eq!(fetched, user);

        let missing = get_user(db.pool(), "nope").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;

        seed_user(&db, "u1", "Alice", "2000-01-01").await;
        let dupe = new_user("u2", "Imposter", "u1@example.com", "2000-01-01");
        let result = create_user(db.pool(), &dupe).await;
        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "User", .. })
        ));
    }

    #[tokio::test]
    async fn test_find_user_by_email() {
        let db = test_db().await;

        seed_user(&db, "u1", "Alice", "2000-01-01").await;
        let found = find_user_by_email(db.pool(), "u1@example.com")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, "u1");

        let missing = find_user_by_email(db.pool(), "ghost@example.com")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_profile_leaves_unset_fields() {
        let db = test_db().await;

        seed_user(&db, "u1", "Alice", "2000-01-01").await;
        let update = ProfileUpdate {
            bio: Some("hello".to_string()),
            is_public: Some(false),
            ..Default::default()
        };
        let user = update_profile(db.pool(), "u1", &update, Utc::now())
            .await
            .unwrap();

        assert_eq!(user.bio, "hello");
        assert!(!user.is_public);
        // untouched fields keep their values
        assert_eq!(user.full_name, "Alice");
        assert_eq!(user.panic_shortcut, "Escape");
    }

    #[tokio::test]
    async fn test_onboard_sets_flag() {
        let db = test_db().await;

        seed_user(&db, "u1", "Alice", "2000-01-01").await;
        let onboarding = Onboarding {
            full_name: "Alice K".to_string(),
            bio: "learning languages".to_string(),
            native_language: "English".to_string(),
            learning_language: "Hindi".to_string(),
            location: "Pune".to_string(),
        };
        let user = onboard(db.pool(), "u1", &onboarding, Utc::now())
            .await
            .unwrap();

        assert!(user.is_onboarded);
        assert_eq!(user.full_name, "Alice K");
        assert_eq!(user.learning_language, "Hindi");
    }

    #[tokio::test]
    async fn test_recommended_users_filters() {
        let db = test_db().await;

        seed_user(&db, "me", "Me", "2000-01-01").await;
        for (id, name) in [("a", "Asha"), ("b", "Bela"), ("c", "Chandni")] {
            seed_user(&db, id, name, "2000-01-01").await;
            onboard(
                db.pool(),
                id,
                &Onboarding {
                    full_name: name.to_string(),
                    bio: String::new(),
                    native_language: "Hindi".to_string(),
                    learning_language: "English".to_string(),
                    location: String::new(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        }

        // "b" goes private, "c" becomes a friend
        update_profile(
            db.pool(),
            "b",
            &ProfileUpdate {
                is_public: Some(false),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
        sqlx::query("INSERT INTO friends (user_id, friend_id, created_at) VALUES (?, ?, ?)")
            .bind("me")
            .bind("c")
            .bind(Utc::now())
            .execute(db.pool())
            .await
            .unwrap();

        let ids: Vec<String> = recommended_users(db.pool(), "me", None)
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec!["a".to_string()]);

        // search narrows by name, case preserved by LIKE
        let hits = recommended_users(db.pool(), "me", Some("sha")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].full_name, "Asha");
    }

    #[tokio::test]
    async fn test_set_membership() {
        let db = test_db().await;

        seed_user(&db, "u1", "Alice", "2000-01-01").await;
        let since = Utc::now();
        set_membership(db.pool(), "u1", true, Some(since), since)
            .await
            .unwrap();

        let user = get_user(db.pool(), "u1").await.unwrap();
        assert!(user.is_member);
        assert_eq!(user.member_since, Some(since));

        set_membership(db.pool(), "u1", false, None, Utc::now())
            .await
            .unwrap();
        let user = get_user(db.pool(), "u1").await.unwrap();
        assert!(!user.is_member);
        assert!(user.member_since.is_none());
    }
}
