//! HTTP server that verifies requests before handing them to a [`Handler`].
//!
//! Routes:
//! - `GET /health`: liveness, no authentication
//! - `/api/...`: envelope-signed unless the method is read-only
//! - `/proxy/...`: forwarder signature over the query string
//! - `POST /webhooks/...`: base64 signature over the raw body
//!
//! Every response a handler produces leaves the process as a signed envelope.

use anyhow::Result;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use super::types::{ErrorResponse, HealthStatus, HttpRequest, HttpResponse, Trust, VerifiedRequest};
use crate::auth::envelope::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::auth::{proxy, webhook, AuthError, ProxyQuery, WebhookMessage, UNAUTHORIZED_MESSAGE};
use crate::config::Config;

/// Largest request body accepted.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Longest request line or single header line.
const MAX_LINE_BYTES: usize = 8 * 1024;

/// Combined size of all header lines.
const MAX_HEADER_BYTES: usize = 64 * 1024;

const MAX_HEADERS: usize = 100;

/// Why a request could not be read off the wire.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed request: {0}")]
    Malformed(&'static str),

    #[error("Request too large: {0}")]
    TooLarge(String),
}

impl RequestError {
    fn status(&self) -> u16 {
        match self {
            RequestError::TooLarge(_) => 413,
            _ => 400,
        }
    }
}

/// Downstream request handling, run only after verification succeeds.
pub trait Handler: Send + Sync + 'static {
    /// Produce the payload to sign and return to the caller.
    fn handle(&self, request: &VerifiedRequest) -> Result<Value>;
}

/// Handler that reflects what was verified. Useful for wiring checks.
pub struct EchoHandler;

impl Handler for EchoHandler {
    fn handle(&self, request: &VerifiedRequest) -> Result<Value> {
        let trust = match &request.trust {
            Trust::Exempt => "exempt",
            Trust::Envelope(_) => "envelope",
            Trust::Proxy(_) => "proxy",
            Trust::Webhook => "webhook",
        };
        Ok(json!({
            "method": request.method,
            "path": request.path,
            "trust": trust,
            "identity": request.identity(),
            "payload": request.payload,
        }))
    }
}

struct Router<H> {
    config: Config,
    handler: H,
    start_time: Instant,
}

/// Verifying HTTP server.
pub struct GuardServer<H> {
    router: Arc<Router<H>>,
}

impl<H: Handler> GuardServer<H> {
    pub fn new(config: Config, handler: H) -> Self {
        Self {
            router: Arc::new(Router {
                config,
                handler,
                start_time: Instant::now(),
            }),
        }
    }

    /// Bind the configured address.
    pub fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(self.router.config.listen)?;
        Ok(listener)
    }

    /// Accept connections until `shutdown` is set. Each connection is served on
    /// its own thread.
    pub fn serve(&self, listener: TcpListener, shutdown: Arc<AtomicBool>) -> Result<()> {
        listener.set_nonblocking(true)?;
        info!(addr = %listener.local_addr()?, "Guard server listening");

        while !shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    let router = Arc::clone(&self.router);
                    std::thread::spawn(move || {
                        let span = info_span!("request", id = %Uuid::new_v4(), %peer);
                        let _enter = span.enter();
                        if let Err(e) = router.handle_connection(stream) {
                            warn!(error = %e, "Connection error");
                        }
                    });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    error!(error = %e, "Accept error");
                }
            }
        }

        info!("Guard server shutting down");
        Ok(())
    }

    /// Route and verify one request. `now_ms` is the verifier's clock.
    pub fn dispatch(&self, request: &HttpRequest, now_ms: i64) -> HttpResponse {
        self.router.dispatch(request, now_ms)
    }
}

impl<H: Handler> Router<H> {
    fn handle_connection(&self, mut stream: TcpStream) -> Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(Duration::from_secs(30)))?;
        stream.set_write_timeout(Some(Duration::from_secs(30)))?;

        let mut reader = BufReader::new(stream.try_clone()?);
        let (response, head_only) = match read_request(&mut reader) {
            Ok(request) => (
                self.dispatch(&request, crate::auth::current_timestamp_ms()),
                request.method == "HEAD",
            ),
            Err(e) => {
                debug!(error = %e, "Unreadable request");
                (HttpResponse::json(e.status(), &ErrorResponse::new("bad request")), false)
            }
        };
        write_response(&mut stream, &response, head_only)
    }

    fn dispatch(&self, request: &HttpRequest, now_ms: i64) -> HttpResponse {
        let method = request.method.as_str();
        let path = request.path.as_str();

        let verified = if method == "GET" && path == "/health" {
            return self.health(now_ms);
        } else if under(path, "/api") {
            self.verify_envelope(request, now_ms)
        } else if under(path, "/proxy") {
            self.verify_proxy(request, now_ms)
        } else if method == "POST" && under(path, "/webhooks") {
            self.verify_webhook(request)
        } else {
            return HttpResponse::json(404, &ErrorResponse::new("not found"));
        };

        match verified {
            Ok((trust, payload)) => {
                let unverified_body = match trust {
                    Trust::Proxy(_) => request.body.clone(),
                    _ => Vec::new(),
                };
                let verified = VerifiedRequest {
                    method: method.to_string(),
                    path: path.to_string(),
                    trust,
                    payload,
                    unverified_body,
                };
                self.respond(&verified, now_ms)
            }
            Err(e) => {
                warn!(kind = e.kind(), method, path, error = %e, "Request rejected");
                HttpResponse::json(401, &ErrorResponse::new(UNAUTHORIZED_MESSAGE))
            }
        }
    }

    fn verify_envelope(&self, request: &HttpRequest, now_ms: i64) -> Result<(Trust, Value), AuthError> {
        if !envelope::requires_envelope(&request.method) {
            return Ok((Trust::Exempt, Value::Null));
        }
        let envelope = envelope::verify_request(
            self.config.envelope_secret.as_bytes(),
            request.header(SIGNATURE_HEADER),
            request.header(TIMESTAMP_HEADER),
            &request.body,
            now_ms,
        )?;
        let payload = envelope.payload().clone();
        Ok((Trust::Envelope(envelope), payload))
    }

    fn verify_proxy(&self, request: &HttpRequest, now_ms: i64) -> Result<(Trust, Value), AuthError> {
        let query = ProxyQuery::from_query_string(request.query.as_deref().unwrap_or(""))?;
        let verified = proxy::verify_proxy(
            self.config.proxy_secret.as_bytes(),
            &query,
            &self.config.proxy_identity_param,
        )
        .map_err(|e| {
            warn!(diagnostics = %query.diagnostics(), "Proxy signature mismatch");
            e
        })?;
        if let Some(max_age) = self.config.proxy_max_age_secs {
            proxy::check_timestamp_param(&query, max_age, now_ms)?;
        }

        // The forwarder signs the query only; the body stays out of `payload`.
        Ok((Trust::Proxy(verified), Value::Null))
    }

    fn verify_webhook(&self, request: &HttpRequest) -> Result<(Trust, Value), AuthError> {
        let message = WebhookMessage::new(
            request.body.clone(),
            request.header(&self.config.webhook_header),
        )?;
        let payload = webhook::parse_verified(self.config.webhook_secret.as_bytes(), &message)?;
        Ok((Trust::Webhook, payload))
    }

    fn respond(&self, request: &VerifiedRequest, now_ms: i64) -> HttpResponse {
        match self.handler.handle(request) {
            Ok(payload) => self.signed(payload, now_ms),
            Err(e) => {
                error!(error = %e, path = %request.path, "Handler failed");
                HttpResponse::json(500, &ErrorResponse::new("internal error"))
            }
        }
    }

    fn health(&self, now_ms: i64) -> HttpResponse {
        let status = HealthStatus {
            status: "ok".to_string(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        match serde_json::to_value(status) {
            Ok(payload) => self.signed(payload, now_ms),
            Err(e) => {
                error!(error = %e, "Failed to encode health status");
                HttpResponse::json(500, &ErrorResponse::new("internal error"))
            }
        }
    }

    fn signed(&self, payload: Value, now_ms: i64) -> HttpResponse {
        let envelope = envelope::sign_response(self.config.envelope_secret.as_bytes(), payload, now_ms);
        HttpResponse::json(200, &envelope.into_response_body())
    }
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Read one line, refusing to buffer more than `limit` bytes of it.
fn read_line_limited<R: BufRead>(reader: &mut R, limit: usize) -> Result<String, RequestError> {
    let mut line = Vec::new();
    std::io::Read::take(&mut *reader, limit as u64).read_until(b'\n', &mut line)?;
    if line.len() >= limit && line.last() != Some(&b'\n') {
        return Err(RequestError::TooLarge(format!("line over {} bytes", limit)));
    }
    String::from_utf8(line).map_err(|_| RequestError::Malformed("non-UTF-8 line"))
}

/// Read one HTTP/1.1 request: request line, headers, then a
/// `Content-Length` body.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<HttpRequest, RequestError> {
    let request_line = read_line_limited(reader, MAX_LINE_BYTES)?;

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(RequestError::Malformed("request line"));
    }

    let method = parts[0].to_uppercase();
    let (path, query) = match parts[1].split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (parts[1].to_string(), None),
    };

    let mut request = HttpRequest {
        method,
        path,
        query,
        ..HttpRequest::default()
    };

    let mut content_length = 0usize;
    let mut header_bytes = 0usize;
    let mut header_count = 0usize;
    loop {
        let remaining = MAX_HEADER_BYTES - header_bytes;
        if remaining == 0 {
            return Err(RequestError::TooLarge(format!("headers over {} bytes", MAX_HEADER_BYTES)));
        }
        let header_line = read_line_limited(reader, remaining.min(MAX_LINE_BYTES))?;
        if header_line.is_empty() {
            break;
        }
        header_bytes += header_line.len();

        let header_line = header_line.trim();
        if header_line.is_empty() {
            break;
        }
        header_count += 1;
        if header_count > MAX_HEADERS {
            return Err(RequestError::TooLarge(format!("more than {} headers", MAX_HEADERS)));
        }
        if let Some((key, value)) = header_line.split_once(':') {
            let key = key.trim().to_lowercase();
            let value = value.trim().to_string();
            if key == "content-length" {
                content_length = value
                    .parse()
                    .map_err(|_| RequestError::Malformed("Content-Length"))?;
            }
            request.headers.insert(key, value);
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Err(RequestError::TooLarge(format!("body of {} bytes", content_length)));
    }

    // Kept byte-for-byte; webhook signatures cover the exact transmission.
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;
    request.body = body;

    Ok(request)
}

/// Write the response. `head_only` keeps the headers, including the length
/// the body would have had, and drops the body.
fn write_response<W: Write>(stream: &mut W, response: &HttpResponse, head_only: bool) -> Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.status_text(),
        response.body.len()
    );
    stream.write_all(head.as_bytes())?;
    if !head_only {
        stream.write_all(&response.body)?;
    }
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use crate::auth::envelope::ResponseBody;
    use crate::auth::{canonical, sign_request, verify_response};
    use crate::config::Secret;
    use std::io::Cursor;

    const NOW: i64 = 1_700_000_000_000;

    fn config() -> Config {
        Config {
            listen: "127.0.0.1:0".parse().unwrap(),
            envelope_secret: Secret::from_setting("E", Some("env-secret")).unwrap(),
            proxy_secret: Secret::from_setting("P", Some("proxy-secret")).unwrap(),
            webhook_secret: Secret::from_setting("W", Some("hook-secret")).unwrap(),
            webhook_header: "x-hmac-sha256".to_string(),
            proxy_identity_param: "shop".to_string(),
            proxy_max_age_secs: None,
        }
    }

    fn server() -> GuardServer<EchoHandler> {
        GuardServer::new(config(), EchoHandler)
    }

    fn request(method: &str, path: &str) -> HttpRequest {
        HttpRequest {
            method: method.to_string(),
            path: path.to_string(),
            ..HttpRequest::default()
        }
    }

    fn signed_data(response: &HttpResponse) -> Value {
        assert_eq!(response.status, 200);
        verify_response(b"env-secret", &response.body, NOW)
            .unwrap()
            .into_payload()
    }

    fn assert_unauthorized(response: &HttpResponse) {
        assert_eq!(response.status, 401);
        let body: ErrorResponse = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body, ErrorResponse::new(UNAUTHORIZED_MESSAGE));
    }

    #[test]
    fn test_health_is_signed() {
        let response = server().dispatch(&request("GET", "/health"), NOW);
        let data = signed_data(&response);
        assert_eq!(data["status"], "ok");
    }

    #[test]
    fn test_get_is_exempt() {
        let response = server().dispatch(&request("GET", "/api/rates"), NOW);
        let data = signed_data(&response);
        assert_eq!(data["trust"], "exempt");
    }

    #[test]
    fn test_post_with_valid_envelope() {
        let payload = json!({"postalCode": "560001", "city": "Bengaluru"});
        let envelope = sign_request(b"env-secret", payload.clone(), NOW);
        let mut req = request("POST", "/api/address");
        for (name, value) in envelope.to_headers() {
            req.headers.insert(name.to_lowercase(), value);
        }
        req.body = serde_json::to_vec(&payload).unwrap();

        let data = signed_data(&server().dispatch(&req, NOW));
        assert_eq!(data["trust"], "envelope");
        assert_eq!(data["payload"], payload);
    }

    #[test]
    fn test_post_rejections_are_uniform() {
        let payload = json!({"postalCode": "560001"});
        let envelope = sign_request(b"env-secret", payload.clone(), NOW);
        let body = serde_json::to_vec(&payload).unwrap();

        // No headers
        let mut missing = request("POST", "/api/address");
        missing.body = body.clone();

        // Tampered body
        let mut tampered = missing.clone();
        for (name, value) in envelope.to_headers() {
            tampered.headers.insert(name.to_lowercase(), value);
        }
        tampered.body = br#"{"postalCode":"560002"}"#.to_vec();

        // Stale
        let mut stale = tampered.clone();
        stale.body = body;

        let server = server();
        assert_unauthorized(&server.dispatch(&missing, NOW));
        assert_unauthorized(&server.dispatch(&tampered, NOW));
        assert_unauthorized(&server.dispatch(&stale, NOW + 300_001));
    }

    #[test]
    fn test_proxy_route() {
        let params = canonical::collect_params([("shop", "demo.example.com"), ("logged_in_customer_id", "")]);
        let sig = proxy::sign_params(b"proxy-secret", &params);
        let mut req = request("GET", "/proxy/orders");
        req.query = Some(format!(
            "shop=demo.example.com&logged_in_customer_id=&signature={}",
            sig
        ));

        let data = signed_data(&server().dispatch(&req, NOW));
        assert_eq!(data["trust"], "proxy");
        assert_eq!(data["identity"], "demo.example.com");

        req.query = Some(format!("shop=evil.example.com&logged_in_customer_id=&signature={}", sig));
        assert_unauthorized(&server().dispatch(&req, NOW));

        req.query = Some("shop=demo.example.com".to_string());
        assert_unauthorized(&server().dispatch(&req, NOW));
    }

    #[test]
    fn test_proxy_body_is_not_trusted() {
        let params = canonical::collect_params([("shop", "s")]);
        let sig = proxy::sign_params(b"proxy-secret", &params);
        let mut req = request("POST", "/proxy/orders");
        req.query = Some(format!("shop=s&signature={}", sig));
        req.body = br#"{"amount":999999}"#.to_vec();

        let data = signed_data(&server().dispatch(&req, NOW));
        assert_eq!(data["trust"], "proxy");
        assert_eq!(data["payload"], Value::Null);

        struct Capture;
        impl Handler for Capture {
            fn handle(&self, request: &VerifiedRequest) -> Result<Value> {
                assert_eq!(request.payload, Value::Null);
                assert_eq!(request.unverified_body, br#"{"amount":999999}"#);
                Ok(Value::Null)
            }
        }
        let server = GuardServer::new(config(), Capture);
        assert_eq!(server.dispatch(&req, NOW).status, 200);
    }

    #[test]
    fn test_unverified_body_empty_outside_proxy() {
        struct Capture;
        impl Handler for Capture {
            fn handle(&self, request: &VerifiedRequest) -> Result<Value> {
                assert!(request.unverified_body.is_empty());
                Ok(Value::Null)
            }
        }
        let body = br#"{"id":7}"#.to_vec();
        let sig = webhook::sign_webhook(b"hook-secret", &body);
        let mut req = request("POST", "/webhooks/orders");
        req.headers.insert("x-hmac-sha256".to_string(), sig);
        req.body = body;

        let server = GuardServer::new(config(), Capture);
        assert_eq!(server.dispatch(&req, NOW).status, 200);
    }

    #[test]
    fn test_proxy_max_age() {
        let mut config = config();
        config.proxy_max_age_secs = Some(300);
        let server = GuardServer::new(config, EchoHandler);

        let params = canonical::collect_params([("shop", "s"), ("timestamp", "1700000000")]);
        let sig = proxy::sign_params(b"proxy-secret", &params);
        let mut req = request("GET", "/proxy");
        req.query = Some(format!("shop=s&timestamp=1700000000&signature={}", sig));

        assert_eq!(server.dispatch(&req, NOW).status, 200);
        assert_unauthorized(&server.dispatch(&req, NOW + 301_000));
    }

    #[test]
    fn test_webhook_route() {
        let body = br#"{"id": 7, "topic": "orders/create"}"#.to_vec();
        let sig = webhook::sign_webhook(b"hook-secret", &body);
        let mut req = request("POST", "/webhooks/orders");
        req.headers.insert("x-hmac-sha256".to_string(), sig);
        req.body = body;

        let data = signed_data(&server().dispatch(&req, NOW));
        assert_eq!(data["trust"], "webhook");
        assert_eq!(data["payload"]["topic"], "orders/create");

        req.body = br#"{"id": 8, "topic": "orders/create"}"#.to_vec();
        assert_unauthorized(&server().dispatch(&req, NOW));

        req.headers.clear();
        assert_unauthorized(&server().dispatch(&req, NOW));
    }

    #[test]
    fn test_webhook_rejects_envelope_signature() {
        let body = br#"{"id":7}"#.to_vec();
        let hex_sig = crate::auth::signature::sign(
            b"hook-secret",
            &body,
            crate::auth::SignatureEncoding::Hex,
        );
        let mut req = request("POST", "/webhooks/orders");
        req.headers.insert("x-hmac-sha256".to_string(), hex_sig);
        req.body = body;
        assert_unauthorized(&server().dispatch(&req, NOW));
    }

    #[test]
    fn test_unknown_route() {
        assert_eq!(server().dispatch(&request("GET", "/apikeys"), NOW).status, 404);
        assert_eq!(server().dispatch(&request("GET", "/webhooks/x"), NOW).status, 404);
    }

    #[test]
    fn test_handler_error_is_500() {
        struct Failing;
        impl Handler for Failing {
            fn handle(&self, _: &VerifiedRequest) -> Result<Value> {
                Err(anyhow!("upstream unavailable"))
            }
        }
        let server = GuardServer::new(config(), Failing);
        let response = server.dispatch(&request("GET", "/api/rates"), NOW);
        assert_eq!(response.status, 500);
        let body: ErrorResponse = serde_json::from_slice(&response.body).unwrap();
        assert!(!body.error.contains("upstream"));
    }

    #[test]
    fn test_read_request() {
        let raw = b"POST /webhooks/orders?x=1 HTTP/1.1\r\nHost: localhost\r\nX-Hmac-Sha256: abc=\r\nContent-Length: 9\r\n\r\n{\"a\": 1}\n";
        let request = read_request(&mut Cursor::new(&raw[..])).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/webhooks/orders");
        assert_eq!(request.query.as_deref(), Some("x=1"));
        assert_eq!(request.header("x-hmac-sha256"), Some("abc="));
        assert_eq!(request.body, b"{\"a\": 1}\n");
    }

    #[test]
    fn test_read_request_rejects_oversized_body() {
        let raw = format!(
            "POST /api HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
            MAX_BODY_BYTES + 1
        );
        let err = read_request(&mut Cursor::new(raw.into_bytes())).unwrap_err();
        assert!(matches!(err, RequestError::TooLarge(_)));
        assert_eq!(err.status(), 413);
    }

    #[test]
    fn test_read_request_rejects_oversized_header_line() {
        let mut raw = b"POST /api HTTP/1.1\r\nX-Junk: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(8 * 1024 * 1024));
        raw.extend_from_slice(b"\r\nContent-Length: 0\r\n\r\n");

        let err = read_request(&mut Cursor::new(raw)).unwrap_err();
        assert!(matches!(err, RequestError::TooLarge(_)));
    }

    #[test]
    fn test_read_request_rejects_oversized_request_line() {
        let raw = format!("GET /api?{} HTTP/1.1\r\n\r\n", "a".repeat(MAX_LINE_BYTES));
        let err = read_request(&mut Cursor::new(raw.into_bytes())).unwrap_err();
        assert_eq!(err.status(), 413);
    }

    #[test]
    fn test_read_request_caps_total_headers() {
        let mut raw = String::from("POST /api HTTP/1.1\r\n");
        for i in 0..MAX_HEADERS + 1 {
            raw.push_str(&format!("X-H{}: v\r\n", i));
        }
        raw.push_str("\r\n");
        let err = read_request(&mut Cursor::new(raw.into_bytes())).unwrap_err();
        assert!(matches!(err, RequestError::TooLarge(_)));

        // Every line is short, but together they pass the header budget.
        let mut raw = String::from("POST /api HTTP/1.1\r\n");
        let value = "v".repeat(MAX_LINE_BYTES - 32);
        for i in 0..(MAX_HEADER_BYTES / value.len()) + 1 {
            raw.push_str(&format!("X-H{}: {}\r\n", i, value));
        }
        raw.push_str("\r\n");
        let err = read_request(&mut Cursor::new(raw.into_bytes())).unwrap_err();
        assert!(matches!(err, RequestError::TooLarge(_)));
    }

    #[test]
    fn test_read_request_rejects_garbage() {
        let err = read_request(&mut Cursor::new(&b"\r\n"[..])).unwrap_err();
        assert!(matches!(err, RequestError::Malformed(_)));
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_write_response() {
        let response = HttpResponse::json(401, &ErrorResponse::new("unauthorized"));
        let mut out = Vec::new();
        write_response(&mut out, &response, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
        assert!(text.ends_with(r#"{"success":false,"error":"unauthorized"}"#));
    }

    #[test]
    fn test_head_response_has_no_body() {
        let response = server().dispatch(&request("HEAD", "/api/rates"), NOW);
        assert_eq!(response.status, 200);

        let mut out = Vec::new();
        write_response(&mut out, &response, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("\r\n\r\n"));
        assert!(text.contains(&format!("Content-Length: {}\r\n", response.body.len())));
    }

    #[test]
    fn test_under() {
        assert!(under("/api", "/api"));
        assert!(under("/api/x", "/api"));
        assert!(!under("/apikeys", "/api"));
    }

    #[test]
    fn test_response_body_shape() {
        let response = server().dispatch(&request("GET", "/health"), NOW);
        let body: ResponseBody = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body.hmac.timestamp, NOW.to_string());
        assert_eq!(body.hmac.signature.len(), 64);
    }
}
