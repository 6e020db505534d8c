//! Fiscal routes
//!
//! | Path | Method | Body |
//! |------|--------|------|
//! | /fiscalCommand | POST | `FiscalCommandRequest` |
//! | /fullReceipt | POST | `ReceiptRequest` |
//!
//! Both always answer HTTP 200 with `{ "ErrorCode", "ErrorMessage" }`, plus
//! `CashRegisterNo` / `ReceiptNo` in Radison mode. Bodies are read raw so a
//! malformed document still gets the structured reply.

use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use fiscal_device::status::{INFO_CASH_REGISTER_NO, INFO_RECEIPT_NO};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::command::FiscalCommandRequest;
use crate::core::{FiscalReply, ServerState};
use crate::receipt::ReceiptRequest;
use crate::session::SessionGuard;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/fiscalCommand", post(fiscal_command))
        .route("/fullReceipt", post(full_receipt))
}

/// Reply as sent on the wire
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FiscalResponse {
    #[serde(flatten)]
    pub reply: FiscalReply,
    #[serde(rename = "CashRegisterNo", skip_serializing_if = "Option::is_none")]
    pub cash_register_no: Option<String>,
    #[serde(rename = "ReceiptNo", skip_serializing_if = "Option::is_none")]
    pub receipt_no: Option<String>,
}

/// Parse a body; `null` yields the empty request
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, FiscalReply> {
    match serde_json::from_slice::<Option<T>>(body) {
        Ok(request) => Ok(request.unwrap_or_default()),
        Err(e) => {
            tracing::warn!(error = %e, "Malformed JSON request body");
            Err(FiscalReply::failure(format!("Invalid JSON: {e}")))
        }
    }
}

async fn fiscal_command(State(state): State<ServerState>, body: Bytes) -> Json<FiscalResponse> {
    let endpoint = "/fiscalCommand";
    tracing::info!(endpoint, body = %String::from_utf8_lossy(&body), "Received JSON request");

    let request = parse_body::<FiscalCommandRequest>(&body);
    let guard = state.session.acquire().await;
    let reply = match request {
        Ok(request) => state.dispatcher.dispatch_on(&guard, request).await,
        Err(reply) => reply,
    };
    let response = finish(&state, &guard, reply).await;
    drop(guard);
    respond(endpoint, response)
}

async fn full_receipt(State(state): State<ServerState>, body: Bytes) -> Json<FiscalResponse> {
    let endpoint = "/fullReceipt";
    tracing::info!(endpoint, body = %String::from_utf8_lossy(&body), "Received JSON request");

    let request = parse_body::<ReceiptRequest>(&body);
    let guard = state.session.acquire().await;
    let reply = match request {
        Ok(request) => state.engine.process_request_on(&guard, request).await,
        Err(reply) => reply,
    };
    let response = finish(&state, &guard, reply).await;
    drop(guard);
    respond(endpoint, response)
}

/// Radison mode queries run under the operation's own guard
async fn finish(
    state: &ServerState,
    guard: &SessionGuard<'_>,
    reply: FiscalReply,
) -> FiscalResponse {
    if state.config.radison_mode {
        with_register_numbers(guard, reply).await
    } else {
        FiscalResponse {
            reply,
            cash_register_no: None,
            receipt_no: None,
        }
    }
}

fn respond(endpoint: &str, response: FiscalResponse) -> Json<FiscalResponse> {
    match serde_json::to_string(&response) {
        Ok(json) => tracing::info!(endpoint, body = %json, "Sending JSON response"),
        Err(e) => tracing::warn!(endpoint, error = %e, "Failed to render response for logging"),
    }
    Json(response)
}

/// Radison mode: append the register number and the last printed receipt number
async fn with_register_numbers(guard: &SessionGuard<'_>, reply: FiscalReply) -> FiscalResponse {
    let register = guard.fiscal_info(INFO_CASH_REGISTER_NO).await;
    let next_receipt = guard.fiscal_info(INFO_RECEIPT_NO).await;

    FiscalResponse {
        reply,
        cash_register_no: Some(register.message),
        receipt_no: Some(last_receipt_no(&next_receipt.message)),
    }
}

/// The device reports the next receipt number; clients want the last one
fn last_receipt_no(next: &str) -> String {
    match next.trim().parse::<i64>() {
        Ok(n) => (n - 1).to_string(),
        Err(_) => {
            tracing::warn!(value = %next, "Could not parse receipt number from device");
            "N/A".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_receipt_no() {
        assert_eq!(last_receipt_no("42"), "41");
        assert_eq!(last_receipt_no(" 1 "), "0");
        assert_eq!(last_receipt_no("Device call timed out."), "N/A");
    }

    #[test]
    fn test_plain_response_omits_radison_fields() {
        let response = FiscalResponse {
            reply: FiscalReply::new(0, "Success"),
            cash_register_no: None,
            receipt_no: None,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({ "ErrorCode": 0, "ErrorMessage": "Success" })
        );
    }

    #[test]
    fn test_null_body_is_an_empty_request() {
        let request: FiscalCommandRequest = parse_body(b"null").unwrap();
        assert!(request.command.is_none());
        let reply = parse_body::<FiscalCommandRequest>(b"{ nope").unwrap_err();
        assert_eq!(reply.code, 999);
        assert!(reply.message.starts_with("Invalid JSON"));
    }
}
