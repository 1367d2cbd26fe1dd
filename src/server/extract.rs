//! Request extractors whose rejections render through `AppError`, so a bad body
//! or query string gets the same `{message}` shape as every other failure.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use tracing::debug;

use crate::error::AppError;

/// `axum::Json` with malformed bodies and wrong content types reported as 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with undecodable query strings reported as 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

fn rejected(kind: &str, status: u16, text: String) -> AppError {
    debug!(target: "forkful::http", kind, status, "request rejected: {}", text);
    AppError::user("invalid_request".to_string(), text)
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self { rejected("json", rejection.status().as_u16(), rejection.body_text()) }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self { rejected("query", rejection.status().as_u16(), rejection.body_text()) }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self { rejected("multipart", rejection.status().as_u16(), rejection.body_text()) }
}
