//! Request gates and the chain that composes them.
//!
//! A route is served by a [`Chain`]: an ordered, immutable list of [`Gate`]s
//! in front of one terminal [`Handler`]. Each gate either forwards the
//! (possibly rewritten) request to the next stage or rejects it with a
//! finished response. The first rejection ends the chain, so exactly one of
//! {a gate, the handler} produces the response.
//!
//! # Gates
//!
//! - [`negotiation::RequestGate`] - `Accept` / `Content-Type` checks
//! - [`validators::CreateUserValidator`] - account creation body
//! - [`validators::SignInValidator`] - sign-in body
//! - [`validators::UpdateUserValidator`] - partial update body
//! - [`crate::auth::middleware::AuthorizationGuard`] - bearer token
//!
//! # Example
//!
//! ```rust,ignore
//! let chain = Chain::new(
//!     vec![Arc::new(RequestGate), Arc::new(AuthorizationGuard::new(tokens))],
//!     handler(state, users::get_user),
//! );
//! let router = Router::new().route("/users/{id}", get(move |req| chain.serve(req)));
//! ```

pub mod negotiation;
pub mod validators;

use crate::auth::jwt::Identity;
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::{FromRequestParts, RawPathParams, Request},
    http::{header, request::Parts, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::HashMap, future::Future, sync::Arc};

/// Largest request body a gate will buffer.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Outcome of a single gate.
pub enum Flow {
    /// Hand the request to the next stage.
    Forward(Request),
    /// Stop here; this response is final.
    Reject(Response),
}

impl Flow {
    /// Rejects with anything that renders as a response (usually an `AppError`).
    pub fn reject(response: impl IntoResponse) -> Self {
        Flow::Reject(response.into_response())
    }
}

/// A single intercept-or-forward step.
///
/// A gate gets the request by value and must give it back inside
/// [`Flow::Forward`] to continue, so it can neither call the next stage
/// twice nor write a response after delegating.
#[async_trait]
pub trait Gate: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Inspects the request and decides whether it continues.
    async fn intercept(&self, request: Request) -> Flow;
}

/// Path parameters captured by the router for the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(HashMap<String, String>);

impl PathParams {
    /// Looks up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    async fn from_parts(parts: &mut Parts) -> Self {
        match RawPathParams::from_request_parts(parts, &()).await {
            Ok(raw) => Self(
                raw.iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            Err(_) => Self::default(),
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for PathParams {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// The terminal stage of a chain.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Produces the response once every gate has forwarded.
    ///
    /// `identity` is present only when an authorization gate ran and
    /// accepted the caller's token.
    async fn handle(
        &self,
        request: Request,
        params: PathParams,
        identity: Option<Identity>,
    ) -> Response;
}

/// Adapts a plain async function taking shared state into a [`Handler`].
pub struct StatefulHandler<S, F> {
    state: S,
    f: F,
}

/// Builds a [`Handler`] from shared state and an async function.
pub fn handler<S, F, Fut, R>(state: S, f: F) -> StatefulHandler<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Fn(S, Request, PathParams, Option<Identity>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    StatefulHandler { state, f }
}

#[async_trait]
impl<S, F, Fut, R> Handler for StatefulHandler<S, F>
where
    S: Clone + Send + Sync + 'static,
    F: Fn(S, Request, PathParams, Option<Identity>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    async fn handle(
        &self,
        request: Request,
        params: PathParams,
        identity: Option<Identity>,
    ) -> Response {
        (self.f)(self.state.clone(), request, params, identity)
            .await
            .into_response()
    }
}

/// An ordered list of gates wrapping one terminal handler.
#[derive(Clone)]
pub struct Chain {
    gates: Arc<[Arc<dyn Gate>]>,
    handler: Arc<dyn Handler>,
}

impl Chain {
    /// Composes `gates` (run in list order) around `handler`.
    pub fn new(gates: Vec<Arc<dyn Gate>>, handler: impl Handler + 'static) -> Self {
        Self {
            gates: gates.into(),
            handler: Arc::new(handler),
        }
    }

    /// Gate names in execution order.
    pub fn gate_names(&self) -> Vec<&'static str> {
        self.gates.iter().map(|gate| gate.name()).collect()
    }

    /// Runs the request through every gate, then the handler.
    pub async fn call(&self, request: Request) -> Response {
        let mut request = request;

        for gate in self.gates.iter() {
            match gate.intercept(request).await {
                Flow::Forward(next) => request = next,
                Flow::Reject(response) => {
                    tracing::debug!(
                        gate = gate.name(),
                        status = %response.status(),
                        "request rejected"
                    );
                    return response;
                }
            }
        }

        let (mut parts, body) = request.into_parts();
        let params = PathParams::from_parts(&mut parts).await;
        let identity = parts.extensions.get::<Identity>().cloned();

        self.handler
            .handle(Request::from_parts(parts, body), params, identity)
            .await
    }

    /// Owned variant of [`Chain::call`], convenient as an axum handler:
    /// `get(move |req| chain.serve(req))`.
    pub async fn serve(self, request: Request) -> Response {
        self.call(request).await
    }
}

// ============= Body helpers shared by gates and handlers =============

/// Why a JSON body could not be read.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("failed to read body: {0}")]
    Read(String),
    #[error("body is not valid JSON for this operation: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Buffers the body (up to [`MAX_BODY_BYTES`]) and decodes it as `T`.
pub async fn read_json<T: DeserializeOwned>(body: Body) -> Result<T, BodyError> {
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| BodyError::Read(e.to_string()))?;

    Ok(serde_json::from_slice(&bytes)?)
}

/// Rebuilds a request around a new JSON body, keeping method, URI, headers
/// and extensions.
pub fn with_json_body<T: Serialize>(
    mut parts: Parts,
    value: &T,
) -> Result<Request, serde_json::Error> {
    let bytes = Bytes::from(serde_json::to_vec(value)?);

    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ApiResponse, AppError};
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts invocations and either forwards or rejects.
    struct CountingGate {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        reject: bool,
    }

    #[async_trait]
    impl Gate for CountingGate {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn intercept(&self, mut request: Request) -> Flow {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Flow::reject(AppError::NotAcceptable(format!("{} said no", self.name)));
            }

            // Leave a trail so ordering is observable downstream
            let trail = request
                .headers()
                .get("x-trail")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            let next = format!("{}{}>", trail, self.name);
            request
                .headers_mut()
                .insert("x-trail", HeaderValue::from_str(&next).unwrap());
            Flow::Forward(request)
        }
    }

    fn counting(name: &'static str, reject: bool) -> (Arc<dyn Gate>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = CountingGate {
            name,
            calls: calls.clone(),
            reject,
        };
        (Arc::new(gate), calls)
    }

    async fn echo_trail(
        calls: Arc<AtomicUsize>,
        request: Request,
        _params: PathParams,
        identity: Option<Identity>,
    ) -> ApiResponse {
        calls.fetch_add(1, Ordering::SeqCst);
        let trail = request
            .headers()
            .get("x-trail")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        assert!(identity.is_none());
        ApiResponse::ok(trail)
    }

    async fn body_message(response: Response) -> String {
        let body: ApiResponse = read_json(response.into_body()).await.unwrap();
        body.message.unwrap_or_default()
    }

    #[tokio::test]
    async fn test_gates_run_in_list_order() {
        let (first, _) = counting("first", false);
        let (second, _) = counting("second", false);
        let handler_calls = Arc::new(AtomicUsize::new(0));

        let chain = Chain::new(vec![first, second], handler(handler_calls.clone(), echo_trail));
        assert_eq!(chain.gate_names(), vec!["first", "second"]);

        let response = chain.call(Request::new(Body::empty())).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_message(response).await, "first>second>");
        assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_rejection_short_circuits() {
        let (first, first_calls) = counting("first", true);
        let (second, second_calls) = counting("second", false);
        let handler_calls = Arc::new(AtomicUsize::new(0));

        let chain = Chain::new(vec![first, second], handler(handler_calls.clone(), echo_trail));
        let response = chain.call(Request::new(Body::empty())).await;

        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert_eq!(body_message(response).await, "first said no");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(handler_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_chain_goes_straight_to_handler() {
        let handler_calls = Arc::new(AtomicUsize::new(0));
        let chain = Chain::new(vec![], handler(handler_calls.clone(), echo_trail));

        let response = chain.call(Request::new(Body::empty())).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_json_body_replaces_payload() {
        let original = Request::builder()
            .uri("/somewhere")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"a":1}"#))
            .unwrap();
        let (parts, _) = original.into_parts();

        let rewritten = with_json_body(parts, &serde_json::json!({"b": 2})).unwrap();
        assert_eq!(rewritten.uri(), "/somewhere");
        assert_eq!(rewritten.headers()[header::CONTENT_LENGTH], "7");

        let value: serde_json::Value = read_json(rewritten.into_body()).await.unwrap();
        assert_eq!(value, serde_json::json!({"b": 2}));
    }

    #[tokio::test]
    async fn test_read_json_rejects_garbage() {
        let result = read_json::<serde_json::Value>(Body::from("not json")).await;
        assert!(matches!(result, Err(BodyError::Decode(_))));
    }

    #[test]
    fn test_path_params_lookup() {
        let params = PathParams::from([("id", "abc")]);
        assert_eq!(params.get("id"), Some("abc"));
        assert_eq!(params.get("other"), None);
    }
}
