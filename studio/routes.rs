use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::page;
use crate::sse;
use crate::static_files;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub fn html_response(body: &str) -> Response<Cursor<Vec<u8>>> {
    let bytes = body.as_bytes().to_vec();
    let len = bytes.len();
    Response::new(
        StatusCode(200),
        vec![
            Header::from_bytes(b"Content-Type", b"text/html; charset=utf-8").unwrap(),
            cors_header(),
        ],
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = b"404 Not Found".to_vec();
    let len = body.len();
    Response::new(
        StatusCode(404),
        vec![Header::from_bytes(b"Content-Type", b"text/plain").unwrap()],
        Cursor::new(body),
        Some(len),
        None,
    )
}

/// Browser frontends on other origins fetch the dataset and artifacts
/// directly, so every response stays permissive.
pub fn cors_header() -> Header {
    Header::from_bytes(b"Access-Control-Allow-Origin", b"*").unwrap()
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches one incoming request.
///
/// The training stream takes ownership of the request: it holds the raw
/// writer for the lifetime of the session. Everything else responds and
/// returns immediately.
pub fn dispatch(request: Request) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let path = url.split('?').next().unwrap_or("").to_owned();

    // Long-lived session stream; handler owns the connection.
    if method == Method::Get && path == "/train/events" {
        sse::handle_train_stream(request);
        return;
    }

    let response = match (method, path.as_str()) {
        (Method::Get, "/") => html_response(page::INDEX_HTML),
        (Method::Get, p) if p.starts_with("/static/") || p.starts_with("/public/") => {
            match static_files::serve(p) {
                Some(resp) => resp,
                None => not_found(),
            }
        }
        _ => not_found(),
    };

    let _ = request.respond(response);
}
