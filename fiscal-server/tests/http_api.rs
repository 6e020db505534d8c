//! HTTP surface, driven through the complete service with `oneshot`

mod common;

use axum::body::Body;
use common::{Outcome, ScriptedFactory, state};
use fiscal_server::Config;
use fiscal_server::api::build_service;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn config() -> Config {
    Config {
        com_timeout_seconds: 5,
        ..Config::default()
    }
}

async fn send(factory: &ScriptedFactory, config: Config, request: Request<Body>) -> (StatusCode, Value) {
    let service = build_service(state(factory, config).await);
    let response = service.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    post(uri, body.to_string())
}

#[tokio::test]
async fn test_fiscal_command_success() {
    let factory = ScriptedFactory::new();
    let (status, body) = send(
        &factory,
        config(),
        post_json("/fiscalCommand", json!({ "Command": "OpenCashDrawer" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ErrorCode": 0, "ErrorMessage": "Success" }));
    assert_eq!(factory.calls(), vec!["OpenCashDrawer"]);
}

#[tokio::test]
async fn test_double_slash_path_is_routed() {
    let factory = ScriptedFactory::new();
    let (status, body) = send(
        &factory,
        config(),
        post_json("//fiscalCommand", json!({ "Command": "printxreport" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ErrorCode"], 0);
    assert_eq!(factory.calls(), vec!["PrintXReport"]);
}

#[tokio::test]
async fn test_missing_parameter_object() {
    let factory = ScriptedFactory::new();
    let (_, body) = send(
        &factory,
        config(),
        post_json("/fiscalCommand", json!({ "Command": "MoneyInCurr" })),
    )
    .await;

    assert_eq!(
        body,
        json!({ "ErrorCode": 999, "ErrorMessage": "Missing 'MoneyInCurr' object." })
    );
    assert!(factory.calls().is_empty());
}

#[tokio::test]
async fn test_device_status_passes_through_with_generic_message() {
    let factory = ScriptedFactory::new();
    factory.script("PrintZReport", Outcome::Code(12));
    let (_, body) = send(
        &factory,
        config(),
        post_json("/fiscalCommand", json!({ "Command": "PrintZReport" })),
    )
    .await;

    assert_eq!(body, json!({ "ErrorCode": 12, "ErrorMessage": "Error" }));
}

#[tokio::test]
async fn test_malformed_json_gets_structured_reply() {
    let factory = ScriptedFactory::new();
    let (status, body) = send(&factory, config(), post("/fullReceipt", "{ \"ReceiptType\": ")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ErrorCode"], 999);
    assert!(body["ErrorMessage"].as_str().unwrap().starts_with("Invalid JSON"));
    assert!(factory.calls().is_empty());
}

#[tokio::test]
async fn test_full_receipt_over_http() {
    let factory = ScriptedFactory::new();
    let (_, body) = send(
        &factory,
        config(),
        post_json(
            "/fullReceipt",
            json!({
                "ReceiptType": "nonfiscal",
                "TopCommentLines": [ { "CommentLine": "Deposit slip" } ],
                "NonFiscalReceipt": {
                    "Tare": [ { "TareDescription": "Crate", "TareQuantity": 1, "TarePrice": 2.0 } ]
                }
            }),
        ),
    )
    .await;

    assert_eq!(body, json!({ "ErrorCode": 0, "ErrorMessage": "Success" }));
    assert_eq!(
        factory.calls(),
        vec![
            "BeginNonFiscalReceipt",
            "PrintNonFiscalLine",
            "PrintTareItem",
            "EndNonFiscalReceipt"
        ]
    );
}

#[tokio::test]
async fn test_radison_mode_appends_register_numbers() {
    let factory = ScriptedFactory::new();
    let config = Config {
        radison_mode: true,
        ..config()
    };
    let (_, body) = send(
        &factory,
        config,
        post_json("/fiscalCommand", json!({ "Command": "OpenCashDrawer" })),
    )
    .await;

    assert_eq!(
        body,
        json!({
            "ErrorCode": 0,
            "ErrorMessage": "Success",
            "CashRegisterNo": "ECR-0042",
            "ReceiptNo": "16"
        })
    );
}

#[tokio::test]
async fn test_radison_mode_unparsable_receipt_number() {
    let factory = ScriptedFactory::new();
    factory.set_info(2, "??");
    let config = Config {
        radison_mode: true,
        ..config()
    };
    let (_, body) = send(
        &factory,
        config,
        post_json("/fullReceipt", json!({ "ReceiptType": "report", "Report": { "ReportType": "PrintX" } })),
    )
    .await;

    assert_eq!(body["ErrorCode"], 0);
    assert_eq!(body["ReceiptNo"], "N/A");
}

#[tokio::test]
async fn test_radison_numbers_belong_to_their_own_operation() {
    let factory = ScriptedFactory::new();
    // Keep the receipt in flight while the command arrives
    factory.script("PrintXReport", Outcome::Hang(std::time::Duration::from_millis(100)));
    let config = Config {
        radison_mode: true,
        ..config()
    };
    let service = build_service(state(&factory, config).await);

    let receipt = service.clone().oneshot(post_json(
        "/fullReceipt",
        json!({ "ReceiptType": "report", "Report": { "ReportType": "PrintX" } }),
    ));
    let command = service
        .clone()
        .oneshot(post_json("/fiscalCommand", json!({ "Command": "OpenCashDrawer" })));
    let (receipt, command) = tokio::join!(receipt, command);
    assert_eq!(receipt.unwrap().status(), StatusCode::OK);
    assert_eq!(command.unwrap().status(), StatusCode::OK);

    // Each operation is directly followed by its own two register queries
    let calls = factory.calls();
    assert_eq!(calls.len(), 6);
    for block in calls.chunks(3) {
        assert!(block[0] == "PrintXReport" || block[0] == "OpenCashDrawer");
        assert_eq!(block[1], "GetFiscalInfo");
        assert_eq!(block[2], "GetFiscalInfo");
    }
    assert_ne!(calls[0], calls[3]);
}

#[tokio::test]
async fn test_unload_then_load_over_http() {
    let factory = ScriptedFactory::new();
    let service = build_service(state(&factory, config()).await);

    let response = service
        .clone()
        .oneshot(post("/device/unload", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = service
        .clone()
        .oneshot(post_json("/fiscalCommand", json!({ "Command": "OpenCashDrawer" })))
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["ErrorCode"], 999);
    assert!(factory.calls().is_empty());

    let response = service
        .clone()
        .oneshot(Request::get("/device/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let status: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status["loaded"], false);
    assert_eq!(status["auto_init_suppressed"], true);

    let response = service
        .clone()
        .oneshot(post("/device/load", Body::empty()))
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let loaded: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(loaded, json!({ "loaded": true }));

    let response = service
        .oneshot(post_json("/fiscalCommand", json!({ "Command": "OpenCashDrawer" })))
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["ErrorCode"], 0);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let factory = ScriptedFactory::new();
    let service = build_service(state(&factory, config()).await);
    let response = service
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["device_loaded"], true);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let factory = ScriptedFactory::new();
    let (status, body) = send(
        &factory,
        config(),
        Request::get("/nope").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
