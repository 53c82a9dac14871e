use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Local;

use crate::shared::format::format_number;

/// Console colour of the status: cyan 2xx, yellow 4xx, red 5xx
fn status_color(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "31"
    } else if status.is_success() {
        "36"
    } else {
        "33"
    }
}

/// Middleware для логирования HTTP запросов
///
/// Одна строка на запрос: local time, duration, response size, status, method, path.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Downloads carry their length, everything else is buffered to measure it
    let declared = parts
        .headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    let (size, body) = match declared {
        Some(len) => (Some(len), body),
        None => match to_bytes(body, usize::MAX).await {
            Ok(bytes) => (Some(bytes.len()), Body::from(bytes)),
            Err(e) => {
                tracing::warn!("{} {}: failed to read response body: {}", method, path, e);
                (None, Body::default())
            }
        },
    };

    let size = size.map(format_number).unwrap_or_else(|| "error".to_string());
    let millis = start.elapsed().as_millis();
    println!(
        "\x1b[{}m{}\x1b[0m | {:>5}ms | {:>12} | {} {:>6} {}",
        status_color(parts.status),
        Local::now().format("%H:%M:%S"),
        millis,
        size,
        parts.status.as_u16(),
        method,
        path
    );
    tracing::debug!("{} {} -> {} in {}ms", method, path, parts.status, millis);

    Response::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_color() {
        assert_eq!(status_color(StatusCode::OK), "36");
        assert_eq!(status_color(StatusCode::NOT_FOUND), "33");
        assert_eq!(status_color(StatusCode::INTERNAL_SERVER_ERROR), "31");
    }
}
