use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::error::DavError;
use crate::merge::deep_merge;

/// Predicate deciding whether a response status counts as success.
pub type StatusValidator = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// Callback receiving upload progress events from the transport.
pub type UploadProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes handed to the connection so far.
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Request body payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Binary(Bytes),
    Json(Value),
}

impl Body {
    /// Whether this body counts as provided when merging options.
    ///
    /// Empty text and falsy JSON scalars (`null`, `false`, `0`, `""`) are
    /// treated as absent. Binary payloads always count, even when empty.
    pub fn is_present(&self) -> bool {
        match self {
            Body::Text(text) => !text.is_empty(),
            Body::Binary(_) => true,
            Body::Json(value) => is_truthy(value),
        }
    }

    pub fn into_bytes(self) -> Result<Bytes, DavError> {
        match self {
            Body::Text(text) => Ok(Bytes::from(text)),
            Body::Binary(bytes) => Ok(bytes),
            Body::Json(value) => Ok(Bytes::from(serde_json::to_vec(&value)?)),
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Binary(Bytes::from(bytes))
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Binary(bytes)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

/// Digest authentication state handed through to the auth layer.
///
/// Its presence on a request is what matters here; the fields are carried
/// untouched for whoever answers the 401 challenge.
#[derive(Clone, PartialEq, Eq)]
pub struct DigestContext {
    pub username: String,
    pub password: String,
    pub realm: Option<String>,
    pub nonce: Option<String>,
    pub opaque: Option<String>,
    pub qop: Option<String>,
    pub algorithm: String,
    pub nc: u32,
    pub cnonce: Option<String>,
}

impl DigestContext {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ..Self::default()
        }
    }
}

impl Default for DigestContext {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            realm: None,
            nonce: None,
            opaque: None,
            qop: None,
            algorithm: "md5".to_string(),
            nc: 1,
            cnonce: None,
        }
    }
}

// Manually implement Debug to redact the password
impl fmt::Debug for DigestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestContext")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("realm", &self.realm)
            .field("nonce", &self.nonce)
            .field("opaque", &self.opaque)
            .field("qop", &self.qop)
            .field("algorithm", &self.algorithm)
            .field("nc", &self.nc)
            .field("cnonce", &self.cnonce)
            .finish()
    }
}

/// A request descriptor, ready to be handed to a transport.
#[derive(Clone)]
pub struct RequestOptions {
    pub url: String,
    pub method: Method,
    pub headers: Option<HeaderMap>,
    pub http_agent: Option<reqwest::Client>,
    pub https_agent: Option<reqwest::Client>,
    pub data: Option<Body>,
    pub max_content_length: Option<u64>,
    pub max_body_length: Option<u64>,
    pub on_upload_progress: Option<UploadProgressFn>,
    pub validate_status: Option<StatusValidator>,
    pub digest: Option<DigestContext>,
    pub with_credentials: Option<bool>,
}

impl RequestOptions {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: None,
            http_agent: None,
            https_agent: None,
            data: None,
            max_content_length: None,
            max_body_length: None,
            on_upload_progress: None,
            validate_status: None,
            digest: None,
            with_credentials: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_data(mut self, data: impl Into<Body>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_validate_status(mut self, validator: StatusValidator) -> Self {
        self.validate_status = Some(validator);
        self
    }

    /// Check a status against the custom validator, or accept 2xx.
    pub fn is_status_valid(&self, status: u16) -> bool {
        match &self.validate_status {
            Some(validator) => validator(status),
            None => (200..300).contains(&status),
        }
    }

    /// The connection handle matching the URL scheme, if one was supplied.
    pub fn agent(&self) -> Option<&reqwest::Client> {
        if is_https(&self.url) {
            self.https_agent.as_ref()
        } else {
            self.http_agent.as_ref()
        }
    }
}

fn is_https(url: &str) -> bool {
    url.get(..6)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https:"))
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers.as_ref().map(header_names))
            .field("http_agent", &self.http_agent.is_some())
            .field("https_agent", &self.https_agent.is_some())
            .field("data", &self.data)
            .field("max_content_length", &self.max_content_length)
            .field("max_body_length", &self.max_body_length)
            .field("on_upload_progress", &self.on_upload_progress.is_some())
            .field("validate_status", &self.validate_status.is_some())
            .field("digest", &self.digest)
            .field("with_credentials", &self.with_credentials)
            .finish()
    }
}

pub(crate) fn header_names(headers: &HeaderMap) -> Vec<&str> {
    headers.keys().map(HeaderName::as_str).collect()
}

/// Caller-supplied overrides for a single request.
///
/// Every field is optional; absent fields never clear anything on the
/// request they are merged into.
#[derive(Clone, Default, bon::Builder)]
pub struct UserOptions {
    pub http_agent: Option<reqwest::Client>,
    pub https_agent: Option<reqwest::Client>,
    #[builder(into)]
    pub data: Option<Body>,
    pub headers: Option<HeaderMap>,
    pub with_credentials: Option<bool>,
    pub max_content_length: Option<u64>,
    pub max_body_length: Option<u64>,
    pub on_upload_progress: Option<UploadProgressFn>,
    pub digest: Option<DigestContext>,
}

impl UserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an untyped option bag.
    ///
    /// Recognized keys follow the camelCase names used by JavaScript WebDAV
    /// clients. Wrong-typed values are skipped with a warning instead of
    /// failing, and keys that can only hold runtime handles (`httpAgent`,
    /// `httpsAgent`, `onUploadProgress`) are always skipped.
    pub fn from_value(value: &Value) -> Self {
        let mut options = Self::default();
        let Some(bag) = value.as_object() else {
            if !value.is_null() {
                warn!(kind = json_kind(value), "ignoring non-object request options");
            }
            return options;
        };

        for key in ["httpAgent", "httpsAgent", "onUploadProgress"] {
            if bag.get(key).is_some_and(is_truthy) {
                warn!(key, "ignoring option that cannot be expressed as data");
            }
        }

        if let Some(data) = bag.get("data").filter(|v| is_truthy(v)) {
            options.data = Some(match data {
                Value::String(text) => Body::Text(text.clone()),
                other => Body::Json(other.clone()),
            });
        }

        match bag.get("headers") {
            Some(Value::Object(headers)) => options.headers = Some(parse_headers(headers)),
            Some(other) if is_truthy(other) => {
                warn!(kind = json_kind(other), "ignoring non-object headers option");
            }
            _ => {}
        }

        match bag.get("withCredentials") {
            Some(Value::Bool(flag)) => options.with_credentials = Some(*flag),
            Some(Value::Null) | None => {}
            Some(other) => {
                warn!(kind = json_kind(other), "ignoring non-boolean withCredentials option");
            }
        }

        options.max_content_length = parse_limit(bag, "maxContentLength");
        options.max_body_length = parse_limit(bag, "maxBodyLength");

        if let Some(digest) = bag.get("_digest").filter(|v| is_truthy(v)) {
            options.digest = Some(parse_digest(digest));
        }

        options
    }

    /// Deep-merge two option bags (`overlay` wins) and parse the result.
    pub fn layered(base: &Value, overlay: &Value) -> Self {
        Self::from_value(&deep_merge(base, overlay))
    }
}

impl fmt::Debug for UserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserOptions")
            .field("http_agent", &self.http_agent.is_some())
            .field("https_agent", &self.https_agent.is_some())
            .field("data", &self.data)
            .field("headers", &self.headers.as_ref().map(header_names))
            .field("with_credentials", &self.with_credentials)
            .field("max_content_length", &self.max_content_length)
            .field("max_body_length", &self.max_body_length)
            .field("on_upload_progress", &self.on_upload_progress.is_some())
            .field("digest", &self.digest)
            .finish()
    }
}

fn parse_headers(headers: &Map<String, Value>) -> HeaderMap {
    let mut output = HeaderMap::new();
    for (name, value) in headers {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                warn!(header = %name, kind = json_kind(value), "skipping header with unsupported value");
                continue;
            }
        };

        let parsed = HeaderName::from_bytes(name.as_bytes())
            .ok()
            .zip(HeaderValue::from_str(&text).ok());
        match parsed {
            Some((name, value)) => {
                output.insert(name, value);
            }
            None => warn!(header = %name, "skipping invalid header"),
        }
    }
    output
}

fn parse_limit(bag: &Map<String, Value>, key: &str) -> Option<u64> {
    let value = bag.get(key)?;
    // JSON producers often write whole numbers as floats (`1024.0`)
    let limit = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64)
    });
    match limit {
        Some(0) => None,
        Some(limit) => Some(limit),
        None => {
            if is_truthy(value) {
                warn!(key, kind = json_kind(value), "ignoring non-integer size limit");
            }
            None
        }
    }
}

fn parse_digest(value: &Value) -> DigestContext {
    let mut digest = DigestContext::default();
    let Some(fields) = value.as_object() else {
        return digest;
    };

    let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
    if let Some(username) = text("username") {
        digest.username = username;
    }
    if let Some(password) = text("password") {
        digest.password = password;
    }
    if let Some(algorithm) = text("algorithm") {
        digest.algorithm = algorithm;
    }
    digest.realm = text("realm");
    digest.nonce = text("nonce");
    digest.opaque = text("opaque");
    digest.qop = text("qop");
    digest.cnonce = text("cnonce");
    if let Some(nc) = fields
        .get("nc")
        .and_then(Value::as_u64)
        .and_then(|nc| u32::try_from(nc).ok())
    {
        digest.nc = nc;
    }
    digest
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
