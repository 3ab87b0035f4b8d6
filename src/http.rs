//! Raw HTTP message helpers.
//!
//! The host runtime hands over request and response bytes exactly as they went over
//! the wire, together with the connection they travelled on. This module turns them
//! into the few things the scanner needs: the request URL, the resource identity used
//! for deduplication, and the decoded response body.

use crate::types::{PrivmodError, Result};
use base64::Engine;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;
use url::Url;

/// Connection metadata for an observed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpService {
    pub host: String,
    pub port: u16,
    /// Whether the connection used TLS.
    pub secure: bool,
}

impl HttpService {
    pub fn new(host: &str, port: u16, secure: bool) -> Self {
        Self {
            host: host.to_string(),
            port,
            secure,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    fn is_default_port(&self) -> bool {
        (self.secure && self.port == 443) || (!self.secure && self.port == 80)
    }

    /// Base URL (scheme, host and non-default port) of this service.
    fn origin(&self) -> String {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        if self.is_default_port() {
            format!("{}://{}", self.scheme(), host)
        } else {
            format!("{}://{}:{}", self.scheme(), host, self.port)
        }
    }
}

/// A request/response pair as delivered by the host runtime.
#[derive(Debug, Clone, Serialize)]
pub struct ObservedTransaction {
    pub service: HttpService,
    #[serde(serialize_with = "serialize_base64")]
    pub request: Vec<u8>,
    /// Empty when no response was received.
    #[serde(serialize_with = "serialize_base64")]
    pub response: Vec<u8>,
}

impl ObservedTransaction {
    pub fn new(service: HttpService, request: Vec<u8>, response: Vec<u8>) -> Self {
        Self {
            service,
            request,
            response,
        }
    }

    /// Parse the request line of this transaction.
    pub fn request_info(&self) -> Result<RequestInfo> {
        analyze_request(&self.service, &self.request)
    }

    /// Decoded response body.
    pub fn body_text(&self) -> &str {
        body_text(&self.response)
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub url: Url,
}

impl RequestInfo {
    pub fn target(&self) -> TargetId {
        TargetId::from_url(&self.url)
    }
}

/// Parsed response head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseInfo {
    /// Index of the first body byte.
    pub body_offset: usize,
}

/// Resource identity of a request: scheme, host, port and path.
///
/// Query string and fragment are ignored, so `/app.js?v=1` and `/app.js?v=2` are the
/// same target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TargetId {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl TargetId {
    pub fn from_url(url: &Url) -> Self {
        Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host: url.host_str().unwrap_or_default().to_ascii_lowercase(),
            port: url.port_or_known_default().unwrap_or(0),
            path: url.path().to_string(),
        }
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}{}", self.scheme, self.host, self.port, self.path)
    }
}

/// Parse raw request bytes into the method and full URL.
///
/// Accepts origin-form (`GET /path HTTP/1.1`) and absolute-form
/// (`GET http://host/path HTTP/1.1`) targets. Any other target form (`CONNECT`
/// authorities, `*`) resolves to the root of the service.
pub fn analyze_request(service: &HttpService, raw: &[u8]) -> Result<RequestInfo> {
    let line_end = find_subsequence(raw, b"\n").unwrap_or(raw.len());
    let request_line = String::from_utf8_lossy(&raw[..line_end]);
    let mut parts = request_line.split_whitespace();

    let (method, target) = match (parts.next(), parts.next()) {
        (Some(method), Some(target)) => (method, target),
        _ => {
            return Err(PrivmodError::MalformedMessage(format!(
                "invalid request line: {:?}",
                request_line.trim_end()
            )))
        }
    };

    let lower = target.to_ascii_lowercase();
    let url = if lower.starts_with("http://") || lower.starts_with("https://") {
        Url::parse(target)?
    } else {
        let path = if target.starts_with('/') { target } else { "/" };
        Url::parse(&format!("{}{}", service.origin(), path))?
    };

    Ok(RequestInfo {
        method: method.to_string(),
        url,
    })
}

/// Locate the body of raw response bytes.
///
/// The head ends at the first blank line, whether it is written `\r\n\r\n` or a
/// bare `\n\n`. A response without a blank line has no body.
pub fn analyze_response(raw: &[u8]) -> ResponseInfo {
    let crlf = find_subsequence(raw, b"\r\n\r\n").map(|idx| idx + 4);
    let lf = find_subsequence(raw, b"\n\n").map(|idx| idx + 2);

    let body_offset = match (crlf, lf) {
        (Some(crlf), Some(lf)) => crlf.min(lf),
        (Some(offset), None) | (None, Some(offset)) => offset,
        (None, None) => raw.len(),
    };

    ResponseInfo { body_offset }
}

/// Decode the body of raw response bytes as text.
///
/// Bodies that are not valid UTF-8 are treated as empty, so a bundle with a single
/// stray latin-1 byte is not scanned at all. Lossy decoding would keep such bodies
/// but could also invent text the server never sent.
pub fn body_text(raw: &[u8]) -> &str {
    let info = analyze_response(raw);
    match std::str::from_utf8(&raw[info.body_offset..]) {
        Ok(text) => text,
        Err(e) => {
            debug!("Undecodable response body ({} bytes): {}", raw.len() - info.body_offset, e);
            ""
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn https(host: &str) -> HttpService {
        HttpService::new(host, 443, true)
    }

    #[test]
    fn test_analyze_origin_form_request() {
        let raw = b"GET /static/js/main.js?v=2 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let info = analyze_request(&https("example.com"), raw).unwrap();

        assert_eq!(info.method, "GET");
        assert_eq!(info.url.as_str(), "https://example.com/static/js/main.js?v=2");
    }

    #[test]
    fn test_analyze_request_keeps_non_default_port() {
        let raw = b"GET /app.js HTTP/1.1\r\n\r\n";
        let info = analyze_request(&HttpService::new("localhost", 8080, false), raw).unwrap();
        assert_eq!(info.url.as_str(), "http://localhost:8080/app.js");
    }

    #[test]
    fn test_analyze_absolute_form_request() {
        let raw = b"GET http://proxy.test/bundle.js HTTP/1.1\r\n\r\n";
        let info = analyze_request(&HttpService::new("proxy.test", 80, false), raw).unwrap();
        assert_eq!(info.url.as_str(), "http://proxy.test/bundle.js");
    }

    #[test]
    fn test_analyze_request_rejects_garbage() {
        let result = analyze_request(&https("example.com"), b"");
        assert!(matches!(result, Err(PrivmodError::MalformedMessage(_))));
    }

    #[test]
    fn test_target_ignores_query_and_fragment() {
        let a = Url::parse("https://Example.com/app.js?v=1").unwrap();
        let b = Url::parse("https://example.com:443/app.js?v=2#top").unwrap();
        let c = Url::parse("https://example.com/other.js").unwrap();

        assert_eq!(TargetId::from_url(&a), TargetId::from_url(&b));
        assert_ne!(TargetId::from_url(&a), TargetId::from_url(&c));
        assert_eq!(TargetId::from_url(&a).to_string(), "https://example.com:443/app.js");
    }

    #[test]
    fn test_analyze_response_offsets() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/javascript\r\n\r\nconsole.log(1)";
        let info = analyze_response(raw);
        assert_eq!(&raw[info.body_offset..], b"console.log(1)");

        let bare = b"HTTP/1.0 404 Not Found\n\nmissing";
        let info = analyze_response(bare);
        assert_eq!(&bare[info.body_offset..], b"missing");
    }

    #[test]
    fn test_first_blank_line_ends_the_head() {
        let raw = b"HTTP/1.1 200 OK\nContent-Type: text/plain\n\nnode_modules/first-secret/a.js\r\n\r\nnode_modules/second/b.js";
        let body = body_text(raw);

        assert_eq!(body, "node_modules/first-secret/a.js\r\n\r\nnode_modules/second/b.js");
        assert_eq!(
            crate::parser::extract_module_names(body),
            vec!["first-secret", "second"]
        );

        // CRLF head followed by a body with bare blank lines
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\na\n\nb";
        assert_eq!(body_text(raw), "a\n\nb");
    }

    #[test]
    fn test_body_text_edge_cases() {
        assert_eq!(body_text(b""), "");
        assert_eq!(body_text(b"HTTP/1.1 204 No Content\r\n"), "");
        assert_eq!(body_text(b"HTTP/1.1 200 OK\r\n\r\n\xff\xfe node_modules/x/"), "");
        assert_eq!(body_text(b"HTTP/1.1 200 OK\r\n\r\nhello"), "hello");
    }
}
