use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use tiny_http::{Header, Response, StatusCode};

use crate::routes::cors_header;

/// Read-only passthrough for `/static/...` (the dataset) and `/public/...`
/// (the artifacts), relative to the working directory. Returns `None` for
/// anything that is not a plain readable file.
pub fn serve(url_path: &str) -> Option<Response<Cursor<Vec<u8>>>> {
    let relative = sanitize(url_path)?;
    let bytes = std::fs::read(&relative).ok()?;

    let len = bytes.len();
    Some(Response::new(
        StatusCode(200),
        vec![
            Header::from_bytes(b"Content-Type", content_type(&relative).as_bytes()).unwrap(),
            cors_header(),
        ],
        Cursor::new(bytes),
        Some(len),
        None,
    ))
}

/// Strips the leading slash and rejects any path that escapes the mounted
/// directories (`..`, absolute components, and the like).
fn sanitize(url_path: &str) -> Option<PathBuf> {
    let relative = Path::new(url_path.strip_prefix('/')?);
    if relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        Some(relative.to_path_buf())
    } else {
        None
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => "application/json",
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_attempts_are_rejected() {
        assert!(sanitize("/static/../Cargo.toml").is_none());
        assert!(sanitize("/static/./../../etc/passwd").is_none());
        assert_eq!(
            sanitize("/public/imputed.npy"),
            Some(PathBuf::from("public/imputed.npy"))
        );
    }
}
