/// Blocking HTTP client for the schedule-suggestion endpoint.
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{SuggestError, SuggestionRequest, SuggestionSource};

static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("array pattern is valid"));

#[derive(Clone)]
pub struct HttpSuggestionClient {
    endpoint: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl HttpSuggestionClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.into(),
            api_key,
            agent,
        }
    }
}

impl SuggestionSource for HttpSuggestionClient {
    fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<Value>, SuggestError> {
        debug!(
            endpoint = %self.endpoint,
            priorities = request.priorities.len(),
            "requesting suggestions"
        );
        let mut call = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .set("User-Agent", "dayplan");
        if let Some(key) = &self.api_key {
            call = call.set("Authorization", &format!("Bearer {key}"));
        }

        match call.send_json(request) {
            Ok(response) => {
                let body = response
                    .into_string()
                    .map_err(|err| SuggestError::Transport(err.to_string()))?;
                parse_suggestion_body(&body)
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(status_error(status, &body))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(SuggestError::Transport(transport.to_string()))
            }
        }
    }
}

fn status_error(status: u16, body: &str) -> SuggestError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .filter(|message| !message.trim().is_empty());
    match status {
        429 => SuggestError::RateLimited(message),
        402 => SuggestError::QuotaExhausted(message),
        _ => SuggestError::Status { status, message },
    }
}

/// Reads candidates from `{ "suggestions": [...] }`, a bare array, or the
/// outermost `[...]` inside free-form text.
pub(crate) fn parse_suggestion_body(body: &str) -> Result<Vec<Value>, SuggestError> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        match value {
            Value::Array(items) => return Ok(items),
            Value::Object(mut map) => {
                if let Some(Value::Array(items)) = map.remove("suggestions") {
                    return Ok(items);
                }
            }
            _ => {}
        }
    }

    let Some(found) = JSON_ARRAY.find(body) else {
        return Err(SuggestError::Parse("no JSON array in response".to_string()));
    };
    serde_json::from_str::<Vec<Value>>(found.as_str())
        .map_err(|err| SuggestError::Parse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::suggest::fetch_or_fallback;
    use crate::types::{Priority, PriorityDomain};

    /// Serves one canned HTTP response on a local port and returns its URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
        let addr = listener.local_addr().expect("local addr");
        thread::spawn(move || {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream);
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
            let mut request_body = vec![0u8; content_length];
            let _ = reader.read_exact(&mut request_body);

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        });
        format!("http://{addr}/generate-schedule")
    }

    fn client(url: String) -> HttpSuggestionClient {
        HttpSuggestionClient::new(url, Some("test-key".to_string()), Duration::from_secs(5))
    }

    fn request() -> SuggestionRequest {
        SuggestionRequest {
            priorities: vec![Priority::new(PriorityDomain::You, "Health")],
            voice_input: None,
            current_time: Some("08:00".to_string()),
        }
    }

    #[test]
    fn success_body_yields_candidates() {
        let url = serve_once(
            "200 OK",
            r#"{"suggestions":[{"title":"Run","category":"play","startTime":"06:00","endTime":"07:00"}]}"#,
        );
        let raw = client(url).suggest(&request()).expect("suggestions");
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0]["title"], "Run");
    }

    #[test]
    fn status_429_maps_to_rate_limited() {
        let url = serve_once("429 Too Many Requests", r#"{"error":"slow down"}"#);
        let err = client(url).suggest(&request()).expect_err("rate limited");
        assert!(matches!(err, SuggestError::RateLimited(Some(ref msg)) if msg == "slow down"));
    }

    #[test]
    fn status_402_maps_to_quota_exhausted() {
        let url = serve_once("402 Payment Required", r#"{"error":"no credits"}"#);
        let err = client(url).suggest(&request()).expect_err("quota");
        assert!(matches!(err, SuggestError::QuotaExhausted(_)));
    }

    #[test]
    fn server_error_maps_to_status() {
        let url = serve_once("500 Internal Server Error", "oops");
        let err = client(url).suggest(&request()).expect_err("server error");
        assert!(matches!(err, SuggestError::Status { status: 500, .. }));
    }

    #[test]
    fn rate_limited_call_falls_back_without_error() {
        let url = serve_once("429 Too Many Requests", r#"{"error":"slow down"}"#);
        let outcome = fetch_or_fallback(&client(url), &request());
        assert!(outcome.used_fallback);
        assert!((9..=11).contains(&outcome.blocks.len()));
        let notice = outcome.notice.expect("fallback carries a notice");
        assert!(notice.contains("slow down"), "notice was {notice:?}");
    }

    #[test]
    fn server_error_without_message_uses_generic_notice() {
        let url = serve_once("500 Internal Server Error", "oops");
        let outcome = fetch_or_fallback(&client(url), &request());
        assert_eq!(
            outcome.notice.as_deref(),
            Some("Suggestion service unavailable. Showing a default plan.")
        );
    }

    #[test]
    fn quota_message_reaches_notice() {
        let notice = status_error(402, r#"{"error":"no credits left"}"#).notice();
        assert_eq!(
            notice,
            "Suggestion credits used up (no credits left). Showing a default plan."
        );
    }

    #[test]
    fn array_is_extracted_from_free_text() {
        let body = "Here is your plan:\n[{\"title\":\"Walk\"}]\nEnjoy!";
        let items = parse_suggestion_body(body).expect("array found");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Walk");
    }

    #[test]
    fn body_without_array_is_a_parse_error() {
        let err = parse_suggestion_body("{\"note\":\"nothing here\"}").expect_err("no array");
        assert!(matches!(err, SuggestError::Parse(_)));
    }
}
