//! Gem wallet routes.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use database::wallet;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::state::AppState;

/// Spendable balance and lifetime creator earnings.
#[derive(Serialize)]
pub struct BalanceResponse {
    pub gems: i64,
    pub earnings: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendGiftRequest {
    pub creator_id: Option<String>,
    pub gift_amount: Option<i64>,
    pub gift_name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftResponse {
    pub success: bool,
    pub message: String,
    pub remaining_gems: i64,
}

#[derive(Deserialize)]
pub struct PurchaseRequest {
    pub amount: Option<i64>,
}

#[derive(Serialize)]
pub struct PurchaseResponse {
    pub success: bool,
    pub gems: i64,
}

/// The caller's wallet.
pub async fn balance(AuthUser(me): AuthUser) -> Json<BalanceResponse> {
    Json(BalanceResponse {
        gems: me.gems,
        earnings: me.earnings,
    })
}

/// Send a gift to a creator. The creator is credited their share of the
/// amount as earnings.
pub async fn send(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<SendGiftRequest>,
) -> Result<Json<GiftResponse>> {
    let creator_id = body.creator_id.unwrap_or_default();
    let amount = body.gift_amount.unwrap_or_default();
    let gift_name = body.gift_name.unwrap_or_else(|| "a gift".to_string());

    let receipt = wallet::send_gift(state.db.pool(), &me.id, &creator_id, amount, Utc::now()).await?;

    Ok(Json(GiftResponse {
        success: true,
        message: format!("Sent {} to {}", gift_name, receipt.creator_name),
        remaining_gems: receipt.remaining_gems,
    }))
}

/// Credit purchased gems. No payment gateway is wired in; the credit is
/// unconditional.
pub async fn purchase(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>> {
    let amount = body.amount.unwrap_or_default();
    let gems = wallet::credit_gems(state.db.pool(), &me.id, amount, Utc::now()).await?;

    Ok(Json(PurchaseResponse {
        success: true,
        gems,
    }))
}
