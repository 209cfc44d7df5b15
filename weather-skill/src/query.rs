//! Request construction and best-effort decoding for provider calls.

use serde_json::Value;
use tracing::warn;

use crate::{
    error::{SkillError, truncate_body},
    mapping,
    transport::{HttpMethod, HttpReply, HttpRequest},
};

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
}

impl std::fmt::Display for QueryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryValue::Str(s) => f.write_str(s),
            QueryValue::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

/// One provider call: endpoint, method, body and extra query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub endpoint: String,
    pub method: HttpMethod,
    pub body: Value,
    pub params: Vec<(String, QueryValue)>,
}

impl WeatherQuery {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            body: Value::Null,
            params: Vec::new(),
        }
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self { method: HttpMethod::Post, body, ..Self::get(endpoint) }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// `<base>/<endpoint>?key=<api_key>&name=value...`
    ///
    /// Values are concatenated as-is; nothing is percent-encoded here.
    pub fn url(&self, base_url: &str, api_key: &str) -> String {
        let mut url = format!("{}/{}?key={api_key}", base_url.trim_end_matches('/'), self.endpoint);
        for (name, value) in &self.params {
            url.push_str(&format!("&{name}={value}"));
        }
        url
    }

    pub fn into_request(self, base_url: &str, api_key: &str) -> HttpRequest {
        let url = self.url(base_url, api_key);
        let body = match self.method {
            HttpMethod::Get => raw_body(&self.body),
            HttpMethod::Post => Some(self.body.to_string()),
        };

        HttpRequest {
            method: self.method,
            url,
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {api_key}")),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }
}

// GET bodies are sent unserialized: strings verbatim, objects as name=value pairs.
fn raw_body(body: &Value) -> Option<String> {
    match body {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => Some(
            map.iter()
                .map(|(name, value)| match value {
                    Value::String(s) => format!("{name}={s}"),
                    other => format!("{name}={other}"),
                })
                .collect::<Vec<_>>()
                .join("&"),
        ),
        other => Some(other.to_string()),
    }
}

/// Decoded provider body.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    Json(Value),
    Raw(String),
}

impl ProviderResponse {
    /// Decode a reply body, keeping the raw text when it is not JSON.
    pub fn decode(reply: HttpReply) -> Self {
        if !reply.is_success() {
            warn!(status = reply.status, "weather provider answered with a non-success status");
        }

        match serde_json::from_str(&reply.body) {
            Ok(value) => ProviderResponse::Json(value),
            Err(err) => {
                warn!(error = %err, "weather provider body is not JSON, keeping raw text");
                ProviderResponse::Raw(reply.body)
            }
        }
    }

    /// The decoded document, or the reason there is none.
    ///
    /// A provider error object (`{"error": {"code", "message"}}`) becomes
    /// [`SkillError::Provider`].
    pub fn into_document(self) -> Result<Value, SkillError> {
        let doc = match self {
            ProviderResponse::Json(doc) => doc,
            ProviderResponse::Raw(text) => return Err(SkillError::UnexpectedBody(truncate_body(&text))),
        };

        if let Some(err) = mapping::lookup(&doc, "error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(SkillError::Provider { code, message });
        }

        if doc.is_object() {
            Ok(doc)
        } else {
            Err(SkillError::UnexpectedBody(truncate_body(&doc.to_string())))
        }
    }
}

/// `url` with the value of the `key` query parameter masked, for logging.
/// Other parameters are left untouched.
pub(crate) fn redact_key(url: &str) -> String {
    let start = match url.find("?key=").or_else(|| url.find("&key=")) {
        Some(idx) => idx + "?key=".len(),
        None => return url.to_string(),
    };
    let end = url[start..].find('&').map_or(url.len(), |len| start + len);

    format!("{}***{}", &url[..start], &url[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_appends_key_then_params_in_order() {
        let query = WeatherQuery::get("forecast.json").param("q", "Paris").param("days", 2);
        assert_eq!(
            query.url("http://api.weatherapi.com/v1", "K"),
            "http://api.weatherapi.com/v1/forecast.json?key=K&q=Paris&days=2"
        );
    }

    #[test]
    fn url_does_not_encode_values() {
        let query = WeatherQuery::get("current.json").param("q", "48.8,2.3&x=1");
        assert_eq!(query.url("http://h/v1/", "K"), "http://h/v1/current.json?key=K&q=48.8,2.3&x=1");
    }

    #[test]
    fn request_carries_bearer_and_content_type() {
        let req = WeatherQuery::get("current.json").param("q", "Oslo").into_request(DEFAULT_BASE_URL, "K");

        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.body, None);
        assert!(req.headers.contains(&("Authorization".to_string(), "Bearer K".to_string())));
        assert!(req.headers.contains(&("Content-Type".to_string(), "application/json".to_string())));
    }

    #[test]
    fn get_body_is_raw_and_post_body_is_json() {
        let get = WeatherQuery { body: json!({ "a": "x y", "n": 1 }), ..WeatherQuery::get("e") }
            .into_request("http://h", "K");
        assert_eq!(get.body.as_deref(), Some("a=x y&n=1"));

        let raw = WeatherQuery { body: json!("plain"), ..WeatherQuery::get("e") }.into_request("http://h", "K");
        assert_eq!(raw.body.as_deref(), Some("plain"));

        let post = WeatherQuery::post("e", json!({ "a": "x" })).into_request("http://h", "K");
        assert_eq!(post.method, HttpMethod::Post);
        assert_eq!(post.body.as_deref(), Some(r#"{"a":"x"}"#));
    }

    #[test]
    fn decode_keeps_raw_text_when_not_json() {
        let reply = HttpReply { status: 502, body: "<html>Bad Gateway</html>".to_string() };
        assert_eq!(
            ProviderResponse::decode(reply),
            ProviderResponse::Raw("<html>Bad Gateway</html>".to_string())
        );
    }

    #[test]
    fn into_document_maps_provider_error_object() {
        let body = json!({ "error": { "code": 1006, "message": "No matching location found." } });
        let err = ProviderResponse::Json(body).into_document().unwrap_err();
        assert_eq!(err.to_string(), "Weather provider error 1006: No matching location found.");
    }

    #[test]
    fn into_document_rejects_raw_and_non_objects() {
        let err = ProviderResponse::Raw("nope".into()).into_document().unwrap_err();
        assert!(matches!(err, SkillError::UnexpectedBody(ref s) if s == "nope"));

        let err = ProviderResponse::Json(json!([1, 2])).into_document().unwrap_err();
        assert!(matches!(err, SkillError::UnexpectedBody(_)));
    }

    #[test]
    fn redact_key_masks_only_the_key_parameter() {
        assert_eq!(redact_key("http://h/c.json?key=SECRET&q=x"), "http://h/c.json?key=***&q=x");
        assert_eq!(redact_key("http://h/c.json?key=SECRET"), "http://h/c.json?key=***");
        assert_eq!(redact_key("http://h"), "http://h");
    }

    #[test]
    fn redact_key_leaves_location_containing_the_key_alone() {
        let url = WeatherQuery::get("current.json").param("q", "ab").url("http://h/v1", "a");
        assert_eq!(url, "http://h/v1/current.json?key=a&q=ab");
        assert_eq!(redact_key(&url), "http://h/v1/current.json?key=***&q=ab");
    }
}
