mod common;

use anyhow::Result;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use common::{seeded_service, test_service};
use payments::api::{AccountResponse, ErrorResponse, TransferRecordResponse, router};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> Result<(StatusCode, Vec<u8>)> {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?,
        None => Request::builder().method(method).uri(uri).body(Body::empty())?,
    };
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, bytes.to_vec()))
}

fn transfer_body(source: u32, destination: u32, amount: &str) -> Value {
    json!({
        "source_account_id": source,
        "destination_account_id": destination,
        "amount": amount,
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).expect("valid json body")
}

#[tokio::test]
async fn test_create_and_get_account() -> Result<()> {
    let (service, _store) = test_service();
    let app = router(service);

    let (status, body) = send(
        &app,
        Method::POST,
        "/accounts",
        Some(json!({ "account_id": 12345, "initial_balance": "100.50" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let created: AccountResponse = decode(&body);
    assert_eq!(created.account_id, 12345);
    assert_eq!(created.balance, "100.50");

    let (status, body) = send(&app, Method::GET, "/accounts/12345", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode::<AccountResponse>(&body), created);

    Ok(())
}

#[tokio::test]
async fn test_create_existing_account_is_conflict() -> Result<()> {
    let (service, _store) = seeded_service(&[(5, "10.00")]).await?;
    let app = router(service);

    let (status, body) = send(
        &app,
        Method::POST,
        "/accounts",
        Some(json!({ "account_id": 5, "initial_balance": "20.00" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    let error: ErrorResponse = decode(&body);
    assert_eq!(error.status, 409);
    assert!(error.error.contains("already exists"));

    let (_, body) = send(&app, Method::GET, "/accounts/5", None).await?;
    assert_eq!(decode::<AccountResponse>(&body).balance, "10.00");

    Ok(())
}

#[tokio::test]
async fn test_create_account_bad_requests() -> Result<()> {
    let (service, _store) = test_service();
    let app = router(service);

    for body in [
        json!({ "account_id": 0, "initial_balance": "1.00" }),
        json!({ "account_id": 1, "initial_balance": "" }),
        json!({ "account_id": 1, "initial_balance": "abc" }),
        json!({ "account_id": 1 }),
        json!({ "account_id": "one", "initial_balance": "1.00" }),
    ] {
        let (status, _) = send(&app, Method::POST, "/accounts", Some(body)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/accounts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{invalidJson:}"))?;
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_get_account_errors() -> Result<()> {
    let (service, _store) = test_service();
    let app = router(service);

    let (status, _) = send(&app, Method::GET, "/accounts/999", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/accounts/not-a-number", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/accounts/0", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_transfer_endpoint() -> Result<()> {
    let (service, _store) = seeded_service(&[(1, "100.00"), (2, "0.00")]).await?;
    let app = router(service);

    let (status, body) = send(
        &app,
        Method::POST,
        "/transactions",
        Some(json!({
            "source_account_id": 1,
            "destination_account_id": 2,
            "amount": "30.00"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());

    let (_, body) = send(&app, Method::GET, "/accounts/1", None).await?;
    assert_eq!(decode::<AccountResponse>(&body).balance, "70.00");
    let (_, body) = send(&app, Method::GET, "/accounts/2", None).await?;
    assert_eq!(decode::<AccountResponse>(&body).balance, "30.00");

    let (status, body) = send(&app, Method::GET, "/transactions?account_id=2", None).await?;
    assert_eq!(status, StatusCode::OK);
    let records: Vec<TransferRecordResponse> = decode(&body);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_account_id, 1);
    assert_eq!(records[0].destination_account_id, 2);
    assert_eq!(records[0].amount, "30.00");

    Ok(())
}

#[tokio::test]
async fn test_transfer_endpoint_errors() -> Result<()> {
    let (service, _store) = seeded_service(&[(1, "70.00"), (2, "30.00")]).await?;
    let app = router(service);

    let cases = [
        (transfer_body(1, 2, "100.00"), StatusCode::UNPROCESSABLE_ENTITY),
        (transfer_body(1, 1, "1.00"), StatusCode::BAD_REQUEST),
        (transfer_body(0, 2, "1.00"), StatusCode::BAD_REQUEST),
        (transfer_body(1, 2, ""), StatusCode::BAD_REQUEST),
        (transfer_body(1, 2, "-1"), StatusCode::BAD_REQUEST),
        (transfer_body(1, 2, "0.000000001"), StatusCode::BAD_REQUEST),
        (transfer_body(1, 3, "1.00"), StatusCode::NOT_FOUND),
    ];

    for (body, expected) in cases {
        let (status, response) =
            send(&app, Method::POST, "/transactions", Some(body.clone())).await?;
        assert_eq!(status, expected, "request {body}");
        let error: ErrorResponse = decode(&response);
        assert_eq!(error.status, expected.as_u16());
    }

    let (_, body) = send(&app, Method::GET, "/accounts/1", None).await?;
    assert_eq!(decode::<AccountResponse>(&body).balance, "70.00");

    Ok(())
}

#[tokio::test]
async fn test_unknown_route() -> Result<()> {
    let (service, _store) = test_service();
    let app = router(service);

    let (status, body) = send(&app, Method::GET, "/nope", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(decode::<Value>(&body), json!({ "error": "Route not found" }));

    let (status, _) = send(&app, Method::GET, "/health", None).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}
