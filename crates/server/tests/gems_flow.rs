//! End-to-end tests for the gem wallet.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{req, send, signup, test_app};

#[tokio::test]
async fn test_balance_starts_empty() {
    let app = test_app().await;
    let (asha, _) = signup(&app, "Asha Rao", "asha@example.com").await;

    let (status, body) = send(&app, req("GET", "/api/gems/balance", Some(&asha), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gems"], 0);
    assert_eq!(body["earnings"], 0.0);
}

#[tokio::test]
async fn test_purchase_credits_balance() {
    let app = test_app().await;
    let (asha, _) = signup(&app, "Asha Rao", "asha@example.com").await;

    let (status, body) = send(
        &app,
        req(
            "POST",
            "/api/gems/purchase",
            Some(&asha),
            Some(json!({ "amount": 100 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["gems"], 100);

    let (_, body) = send(
        &app,
        req(
            "POST",
            "/api/gems/purchase",
            Some(&asha),
            Some(json!({ "amount": 50 })),
        ),
    )
    .await;
    assert_eq!(body["gems"], 150);

    let (status, body) = send(
        &app,
        req(
            "POST",
            "/api/gems/purchase",
            Some(&asha),
            Some(json!({ "amount": 0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Amount must be a positive number");

    let (_, body) = send(&app, req("GET", "/api/gems/balance", Some(&asha), None)).await;
    assert_eq!(body["gems"], 150);
}

#[tokio::test]
async fn test_gift_debits_sender_and_credits_creator() {
    let app = test_app().await;
    let (fan, _) = signup(&app, "Farha Khan", "farha@example.com").await;
    let (creator, creator_id) = signup(&app, "Devika Nair", "devika@example.com").await;

    send(
        &app,
        req(
            "POST",
            "/api/gems/purchase",
            Some(&fan),
            Some(json!({ "amount": 100 })),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        req(
            "POST",
            "/api/gems/send",
            Some(&fan),
            Some(json!({
                "creatorId": creator_id,
                "giftAmount": 30,
                "giftName": "Rose",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Sent Rose to Devika Nair");
    assert_eq!(body["remainingGems"], 70);

    // the creator earns their 70% share; spendable gems stay put
    let (_, body) = send(&app, req("GET", "/api/gems/balance", Some(&creator), None)).await;
    assert_eq!(body["gems"], 0);
    assert_eq!(body["earnings"], 21.0);

    // an unnamed gift still reads naturally
    let (_, body) = send(
        &app,
        req(
            "POST",
            "/api/gems/send",
            Some(&fan),
            Some(json!({ "creatorId": creator_id, "giftAmount": 10 })),
        ),
    )
    .await;
    assert_eq!(body["message"], "Sent a gift to Devika Nair");
    assert_eq!(body["remainingGems"], 60);
}

#[tokio::test]
async fn test_gift_guards() {
    let app = test_app().await;
    let (fan, fan_id) = signup(&app, "Farha Khan", "farha@example.com").await;
    let (_, creator_id) = signup(&app, "Devika Nair", "devika@example.com").await;

    send(
        &app,
        req(
            "POST",
            "/api/gems/purchase",
            Some(&fan),
            Some(json!({ "amount": 20 })),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        req(
            "POST",
            "/api/gems/send",
            Some(&fan),
            Some(json!({ "creatorId": fan_id, "giftAmount": 10 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot give a gift to yourself");

    let (status, body) = send(
        &app,
        req(
            "POST",
            "/api/gems/send",
            Some(&fan),
            Some(json!({ "creatorId": "ghost", "giftAmount": 10 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, body) = send(
        &app,
        req(
            "POST",
            "/api/gems/send",
            Some(&fan),
            Some(json!({ "creatorId": creator_id, "giftAmount": 500 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Not enough gems. Please recharge.");

    // the failed sends never touched the balance
    let (_, body) = send(&app, req("GET", "/api/gems/balance", Some(&fan), None)).await;
    assert_eq!(body["gems"], 20);
}
