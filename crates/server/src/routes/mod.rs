//! Route handlers for the freeChat API.

pub mod auth;
pub mod bond;
pub mod couple;
pub mod games;
pub mod gems;
pub mod health;
pub mod membership;
pub mod users;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Accounts and sessions
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/onboarding", post(auth::onboarding))
        .route("/api/auth/me", get(auth::me))
        // Friend graph and recommendations
        .route("/api/users", get(users::recommended))
        .route("/api/users/friends", get(users::friends))
        .route("/api/users/friends/:id", delete(users::unfriend))
        .route(
            "/api/users/friend-request/:id",
            post(users::send_friend_request).delete(users::decline_friend_request),
        )
        .route(
            "/api/users/friend-request/:id/accept",
            put(users::accept_friend_request),
        )
        .route("/api/users/friend-requests", get(users::friend_requests))
        .route(
            "/api/users/outgoing-friend-requests",
            get(users::outgoing_friend_requests),
        )
        .route("/api/users/profile", put(users::update_profile))
        // Couple pairing
        .route("/api/couple/status", get(couple::status))
        .route("/api/couple/request/:id", post(couple::request))
        .route("/api/couple/accept/:id", put(couple::accept))
        .route("/api/couple/unlink", delete(couple::unlink))
        .route("/api/couple/note", put(couple::update_note))
        // Couple games
        .route("/api/games/templates", get(games::templates))
        .route("/api/games/start", post(games::start))
        .route("/api/games/session/:id", get(games::session))
        .route("/api/games/active", get(games::active))
        .route("/api/games/submit", post(games::submit))
        // Gem wallet
        .route("/api/gems/balance", get(gems::balance))
        .route("/api/gems/send", post(gems::send))
        .route("/api/gems/purchase", post(gems::purchase))
        // Premium membership
        .route("/api/membership/status", get(membership::status))
        .route("/api/membership/subscribe", post(membership::subscribe))
        .route("/api/membership/cancel", post(membership::cancel))
        // Daily bond check-in
        .route("/api/bond/mood", put(bond::update_mood))
        .route("/api/bond/daily", get(bond::daily_insight))
}
