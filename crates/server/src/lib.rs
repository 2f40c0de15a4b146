//! HTTP API for freeChat.
//!
//! Serves accounts and sessions, the friend graph, couple pairing,
//! couple games, the gem wallet, premium membership, and the daily
//! bond check-in over JSON via axum.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
