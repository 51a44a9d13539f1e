//! Dev server.
//!
//! One axum router serves the output directory and the live-reload channel:
//!
//! | Path | Response |
//! |---|---|
//! | `/` | `301` to `server.default_page` |
//! | `/__livereload` | WebSocket of [`ReloadMessage`] JSON |
//! | `/__livereload.js` | the client script |
//! | `/<name>` | `<name>.html` if it exists (implicit extension) |
//! | anything else | static file from the output directory |
//!
//! HTML responses get the live-reload script injected; every other file goes
//! through `tower-http`'s `ServeDir` untouched.

use crate::livereload::{self, ReloadMessage, Reloader};
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::services::ServeDir;

#[derive(Debug)]
struct ServeState {
    output_dir: PathBuf,
    default_page: String,
    reloader: Reloader,
}

/// Build the dev server router.
pub fn router(output_dir: &Path, default_page: &str, reloader: Reloader) -> Router {
    let state = Arc::new(ServeState {
        output_dir: output_dir.to_path_buf(),
        default_page: default_page.to_string(),
        reloader,
    });
    Router::new()
        .route(livereload::SOCKET_PATH, get(socket_handler))
        .route(livereload::SCRIPT_PATH, get(script_handler))
        .fallback(static_handler)
        .with_state(state)
}

async fn script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        livereload::CLIENT_JS,
    )
}

async fn socket_handler(ws: WebSocketUpgrade, State(state): State<Arc<ServeState>>) -> Response {
    let rx = state.reloader.subscribe();
    ws.on_upgrade(move |socket| forward(socket, rx))
}

/// Push channel messages to one browser until either side goes away.
async fn forward(mut socket: WebSocket, mut rx: broadcast::Receiver<ReloadMessage>) {
    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Ok(msg) => {
                    let Ok(text) = serde_json::to_string(&msg) else {
                        continue;
                    };
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("live-reload client lagged, skipped {skipped} messages");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn static_handler(State(state): State<Arc<ServeState>>, req: Request) -> Response {
    let path = req.uri().path().to_string();
    if path == "/" {
        return (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, state.default_page.clone())],
        )
            .into_response();
    }

    if let Some(file) = html_file(&state.output_dir, &path).await {
        return match tokio::fs::read_to_string(&file).await {
            Ok(page) => Html(livereload::inject(&page)).into_response(),
            Err(e) => {
                warn!("cannot read {}: {e}", file.display());
                StatusCode::NOT_FOUND.into_response()
            }
        };
    }

    match ServeDir::new(&state.output_dir).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

/// The HTML file a request path maps to, if any.
///
/// `/mac.html` and `/mac` both map to `mac.html`; `/docs/` maps to
/// `docs/index.html`. Paths with `..` segments never match.
async fn html_file(output_dir: &Path, url_path: &str) -> Option<PathBuf> {
    let rel = url_path.trim_start_matches('/');
    if rel.split('/').any(|seg| seg == "..") || rel.contains('\\') {
        return None;
    }
    let candidate = output_dir.join(rel);
    let candidates = match Path::new(rel).extension().and_then(|e| e.to_str()) {
        Some("html") => vec![candidate],
        Some(_) => return None,
        None if rel.is_empty() || rel.ends_with('/') => vec![candidate.join("index.html")],
        None => vec![
            output_dir.join(format!("{rel}.html")),
            candidate.join("index.html"),
        ],
    };
    for file in candidates {
        if tokio::fs::metadata(&file).await.is_ok_and(|m| m.is_file()) {
            return Some(file);
        }
    }
    None
}
