//! Content negotiation gate.
//!
//! Every API route accepts and produces JSON only. This gate runs first in
//! each chain and turns away requests that cannot be served as JSON before
//! any body is read or token checked.

use super::{Flow, Gate};
use crate::types::AppError;
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header, HeaderMap, Method},
};

/// 406 body.
pub const NOT_ACCEPTABLE_MESSAGE: &str = "Only JSON representations are supported";
/// 415 body.
pub const UNSUPPORTED_MEDIA_MESSAGE: &str = "A MIME type of application/json is only accepted";

const JSON: &str = "application/json";

/// Rejects clients that will not accept JSON (406) and bodies that are not
/// declared as JSON (415).
///
/// - `Accept` absent means anything is acceptable.
/// - `Accept` is a comma-separated list; only `application/json` or `*/*`
///   satisfy it. A range carrying `q=0` is excluded; other parameters are
///   ignored.
/// - `Content-Type` is required for `POST`, `PUT` and `PATCH` and must name
///   `application/json` (a `charset` parameter is fine).
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestGate;

fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or("").trim()
}

/// Whether a media range carries a zero quality value (`q=0`, `q=0.000`).
fn is_refused(range: &str) -> bool {
    range.split(';').skip(1).any(|param| match param.split_once('=') {
        Some((name, value)) if name.trim().eq_ignore_ascii_case("q") => {
            value.trim().parse::<f32>().map(|q| q <= 0.0).unwrap_or(false)
        }
        _ => false,
    })
}

/// Whether the `Accept` header admits a JSON response.
pub fn accepts_json(headers: &HeaderMap) -> bool {
    let values: Vec<_> = headers.get_all(header::ACCEPT).iter().collect();
    if values.is_empty() {
        return true;
    }

    values.into_iter().any(|value| match value.to_str() {
        Ok(raw) => raw.split(',').filter(|range| !is_refused(range)).any(|range| {
            let media = media_type(range);
            media.eq_ignore_ascii_case(JSON) || media == "*/*"
        }),
        Err(_) => false,
    })
}

/// Whether the declared `Content-Type` is JSON.
pub fn is_json_body(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|raw| media_type(raw).eq_ignore_ascii_case(JSON))
        .unwrap_or(false)
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

#[async_trait]
impl Gate for RequestGate {
    fn name(&self) -> &'static str {
        "request"
    }

    async fn intercept(&self, request: Request) -> Flow {
        if !accepts_json(request.headers()) {
            return Flow::reject(AppError::NotAcceptable(NOT_ACCEPTABLE_MESSAGE.to_string()));
        }

        if carries_body(request.method()) && !is_json_body(request.headers()) {
            return Flow::reject(AppError::UnsupportedMediaType(
                UNSUPPORTED_MEDIA_MESSAGE.to_string(),
            ));
        }

        Flow::Forward(request)
    }
}
