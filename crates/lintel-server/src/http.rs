//! Axum-based HTTP entry point.
//!
//! Every inbound request funnels through a single fallback handler that
//! rebuilds it as a kernel [`RawRequest`] (query pairs, form fields,
//! multipart uploads, headers, session) and hands it to the dispatcher.
//! Sessions are in-process, keyed by the `lintel_session` cookie.

use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response as AxumResponse},
    Form, Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use lintel_kernel::action::ActionError;
use lintel_kernel::request::{FilePart, Session};
use lintel_kernel::{DispatchOutcome, Dispatcher, KernelError, RawRequest, Response};

use crate::bootstrap;

const SESSION_COOKIE: &str = "lintel_session";

/// Shared state injected into the fallback handler.
#[derive(Clone)]
struct AppState {
    dispatcher: Dispatcher,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    development: bool,
}

impl AppState {
    /// Resolve the request's session, minting a fresh one when the cookie
    /// is absent or names an unknown session. The bool reports freshness so
    /// the response can set the cookie.
    async fn session_for(&self, headers: &HeaderMap) -> (String, Session, bool) {
        if let Some(id) = cookie_value(headers, SESSION_COOKIE) {
            if let Some(session) = self.sessions.read().await.get(&id).cloned() {
                return (id, session, false);
            }
        }
        let id = Uuid::new_v4().to_string();
        let session = Session::new();
        self.sessions.write().await.insert(id.clone(), session.clone());
        (id, session, true)
    }
}

/// Bind and serve until interrupted, then tear the kernel down.
pub async fn serve(bind: &str, config_path: Option<&Path>) -> anyhow::Result<()> {
    use anyhow::Context as _;

    let context = bootstrap::build_context(config_path)?;
    let state = AppState {
        development: context.config().development,
        dispatcher: Dispatcher::new(context.clone()),
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    let app = Router::new()
        .fallback(dispatch_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(addr = %bind, "lintel server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("lintel server stopping");
    if let Err(report) = context.shutdown().await {
        warn!(error = ?report, "shutdown reported failures");
    }
    Ok(())
}

async fn dispatch_handler(State(state): State<AppState>, request: Request) -> AxumResponse {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let (session_id, session, fresh_session) = state.session_for(&parts.headers).await;

    let mut raw = RawRequest::http(&path).with_session(session);
    if let Some(query) = parts.uri.query() {
        for (key, value) in parse_query(query) {
            raw = raw.with_query(key, value);
        }
    }
    for (name, value) in parts.headers.iter() {
        if let Ok(value) = value.to_str() {
            raw = raw.with_header(name.as_str(), value);
        }
    }

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if content_type.starts_with("application/x-www-form-urlencoded") {
        let request = Request::from_parts(parts, body);
        match Form::<HashMap<String, String>>::from_request(request, &()).await {
            Ok(Form(fields)) => {
                for (name, value) in fields {
                    raw = raw.with_body_field(name, value);
                }
            }
            Err(err) => warn!(error = %err, "unreadable form body, continuing without it"),
        }
    } else if content_type.starts_with("multipart/form-data") {
        let request = Request::from_parts(parts, body);
        match Multipart::from_request(request, &()).await {
            Ok(multipart) => raw = read_multipart(raw, multipart).await,
            Err(err) => warn!(error = %err, "unreadable multipart body, continuing without it"),
        }
    }

    let mut response = match state.dispatcher.dispatch(&raw).await {
        Ok(DispatchOutcome::Handled { action, response }) => kernel_response(&action, response),
        Ok(DispatchOutcome::NotFound { attempted }) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("no action matched '{path}'"),
                "attempted": attempted,
            })),
        )
            .into_response(),
        Err(report) => error_response(&state, report),
    };

    if fresh_session {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Drain multipart fields into the raw request: named files become
/// [`FilePart`] metadata, plain fields become body values.
async fn read_multipart(mut raw: RawRequest, mut multipart: Multipart) -> RawRequest {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "multipart field unreadable, stopping");
                break;
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let filename = field.file_name().map(str::to_string);
        let file_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        match filename {
            Some(filename) => match field.bytes().await {
                Ok(bytes) => {
                    raw = raw.with_file(name, FilePart::new(filename, file_type, bytes.len() as u64));
                }
                Err(err) => warn!(field = %name, error = %err, "upload unreadable, skipping"),
            },
            None => match field.text().await {
                Ok(text) => raw = raw.with_body_field(name, text),
                Err(err) => warn!(field = %name, error = %err, "field unreadable, skipping"),
            },
        }
    }
    raw
}

fn kernel_response(action: &str, response: Response) -> AxumResponse {
    let mut builder = axum::response::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, response.kind.content_type())
        .header("x-lintel-action", action);
    for (name, value) in &response.headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(response.body)).unwrap_or_else(|err| {
        error!(error = %err, "handler produced an unencodable response");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}

fn error_response(state: &AppState, report: error_stack::Report<KernelError>) -> AxumResponse {
    match report.current_context() {
        KernelError::Action(ActionError::Timeout { action, timeout_ms }) => {
            warn!(%action, timeout_ms, "action timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({
                    "error": format!("action {action} timed out after {timeout_ms}ms"),
                })),
            )
                .into_response()
        }
        error if error.is_fatal() => {
            error!(error = ?report, "fatal kernel error, shutting down");
            let detail = detail_for(state, &report);
            let context = state.dispatcher.context().clone();
            tokio::spawn(async move {
                let _ = context.shutdown().await;
                std::process::exit(1);
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": detail }))).into_response()
        }
        _ => {
            error!(error = ?report, "dispatch failed");
            let detail = detail_for(state, &report);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": detail }))).into_response()
        }
    }
}

// Full report detail is for development only.
fn detail_for(state: &AppState, report: &error_stack::Report<KernelError>) -> String {
    if state.development {
        format!("{report:?}")
    } else {
        "internal error".to_string()
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key.to_string(), value.to_string())
        })
        .collect()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
