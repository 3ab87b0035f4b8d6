//! HTTP Archive (HAR 1.2) loader.

use crate::http::{HttpService, ObservedTransaction};
use crate::types::{PrivmodError, Result};
use base64::Engine;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct Har {
    log: HarLog,
}

#[derive(Debug, Deserialize)]
struct HarLog {
    #[serde(default)]
    entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
struct HarEntry {
    request: HarRequest,
    response: HarResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarRequest {
    method: String,
    url: String,
    #[serde(default)]
    http_version: String,
    #[serde(default)]
    headers: Vec<HarHeader>,
    #[serde(default)]
    post_data: Option<HarPostData>,
}

#[derive(Debug, Deserialize)]
struct HarPostData {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HarResponse {
    status: i64,
    #[serde(default)]
    status_text: String,
    #[serde(default)]
    headers: Vec<HarHeader>,
    #[serde(default)]
    content: HarContent,
}

#[derive(Debug, Default, Deserialize)]
struct HarContent {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HarHeader {
    name: String,
    value: String,
}

/// Response headers that describe the wire encoding, which HAR content no longer has.
const WIRE_HEADERS: &[&str] = &["content-encoding", "content-length", "transfer-encoding"];

/// Transactions rebuilt from a capture.
#[derive(Debug, Default)]
pub struct Capture {
    pub transactions: Vec<Arc<ObservedTransaction>>,
    /// Entries that could not be turned into a transaction, with the reason.
    pub skipped: Vec<String>,
}

/// Load a HAR file from disk.
pub fn load_har(path: &Path) -> Result<Capture> {
    let content = std::fs::read_to_string(path)?;
    let capture = parse_har(&content)?;
    debug!(
        "Loaded {} transactions from {} ({} skipped)",
        capture.transactions.len(),
        path.display(),
        capture.skipped.len()
    );
    Ok(capture)
}

/// Parse a HAR document.
pub fn parse_har(content: &str) -> Result<Capture> {
    let har: Har = serde_json::from_str(content)?;
    let mut capture = Capture::default();

    for (index, entry) in har.log.entries.into_iter().enumerate() {
        match to_transaction(entry) {
            Ok(transaction) => capture.transactions.push(Arc::new(transaction)),
            Err(e) => {
                warn!("Skipping HAR entry {}: {}", index, e);
                capture.skipped.push(format!("entry {}: {}", index, e));
            }
        }
    }

    Ok(capture)
}

fn to_transaction(entry: HarEntry) -> Result<ObservedTransaction> {
    let url = Url::parse(&entry.request.url)?;
    let secure = match url.scheme() {
        "https" | "wss" => true,
        "http" | "ws" => false,
        other => {
            return Err(PrivmodError::CaptureError(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    };

    let host = url
        .host_str()
        .ok_or_else(|| PrivmodError::CaptureError(format!("no host in {}", url)))?;
    let port = url.port_or_known_default().unwrap_or(if secure { 443 } else { 80 });
    let service = HttpService::new(host.trim_matches(|c| c == '[' || c == ']'), port, secure);

    let request = build_request(&entry.request, &url);
    let response = build_response(&entry.response)?;

    Ok(ObservedTransaction::new(service, request, response))
}

fn build_request(request: &HarRequest, url: &Url) -> Vec<u8> {
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut raw = format!(
        "{} {} {}\r\n",
        request.method,
        target,
        wire_version(&request.http_version)
    );

    let mut has_host = false;
    for header in request.headers.iter().filter(|h| !h.name.starts_with(':')) {
        has_host |= header.name.eq_ignore_ascii_case("host");
        raw.push_str(&format!("{}: {}\r\n", header.name, header.value));
    }
    if !has_host {
        if let Some(host) = url.host_str() {
            match url.port() {
                Some(port) => raw.push_str(&format!("Host: {}:{}\r\n", host, port)),
                None => raw.push_str(&format!("Host: {}\r\n", host)),
            }
        }
    }
    raw.push_str("\r\n");

    let mut bytes = raw.into_bytes();
    if let Some(text) = request.post_data.as_ref().and_then(|p| p.text.as_ref()) {
        bytes.extend_from_slice(text.as_bytes());
    }
    bytes
}

fn build_response(response: &HarResponse) -> Result<Vec<u8>> {
    // Browsers record aborted or blocked requests with status 0
    if response.status <= 0 {
        return Ok(Vec::new());
    }

    let mut raw = format!("HTTP/1.1 {} {}\r\n", response.status, response.status_text);
    for header in &response.headers {
        let name = header.name.to_ascii_lowercase();
        if name.starts_with(':') || WIRE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        raw.push_str(&format!("{}: {}\r\n", header.name, header.value));
    }
    raw.push_str("\r\n");

    let mut bytes = raw.into_bytes();
    if let Some(text) = &response.content.text {
        match response.content.encoding.as_deref() {
            Some(encoding) if encoding.eq_ignore_ascii_case("base64") => {
                let body = base64::engine::general_purpose::STANDARD.decode(text.trim())?;
                bytes.extend_from_slice(&body);
            }
            _ => bytes.extend_from_slice(text.as_bytes()),
        }
    }
    Ok(bytes)
}

fn wire_version(version: &str) -> &str {
    if version.to_ascii_uppercase().starts_with("HTTP/1") {
        version
    } else {
        // h2, h3 and unknown values; only the request target matters downstream
        "HTTP/1.1"
    }
}
