/// Suggestion collaborator: the remote service that proposes a day of blocks.
///
/// Everything the service returns is untrusted. Candidates pass through
/// [`coerce::coerce_suggestion`] before they can reach the store, and any
/// failure degrades to [`coerce::fallback_blocks`] plus a user notice.
mod client;
mod coerce;
mod staging;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SuggestionsConfig;
use crate::types::{NewTimeBlock, Priority};

pub use client::HttpSuggestionClient;
pub use coerce::{coerce_suggestion, fallback_blocks};
pub use staging::{CancelToken, StagedApply};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub priorities: Vec<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time: Option<String>,
}

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("no suggestion endpoint configured")]
    NotConfigured,
    #[error("rate limited{}", detail(.0))]
    RateLimited(Option<String>),
    #[error("quota exhausted{}", detail(.0))]
    QuotaExhausted(Option<String>),
    #[error("suggestion service returned {status}{}", detail(.message))]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("suggestion service unreachable: {0}")]
    Transport(String),
    #[error("suggestion response unreadable: {0}")]
    Parse(String),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

impl SuggestError {
    /// Short, non-blocking notice shown to the user. The service's own
    /// error text is included when it sent one.
    pub fn notice(&self) -> String {
        let (reason, message) = match self {
            SuggestError::NotConfigured => ("No suggestion service configured", None),
            SuggestError::RateLimited(message) => {
                ("Too many requests, wait a moment", message.as_deref())
            }
            SuggestError::QuotaExhausted(message) => {
                ("Suggestion credits used up", message.as_deref())
            }
            SuggestError::Status { message, .. } => {
                ("Suggestion service unavailable", message.as_deref())
            }
            SuggestError::Transport(_) => ("Suggestion service unavailable", None),
            SuggestError::Parse(_) => ("Suggestion service sent an unreadable plan", None),
        };
        match message {
            Some(message) => format!("{reason} ({message}). Showing a default plan."),
            None => format!("{reason}. Showing a default plan."),
        }
    }
}

/// Anything that can turn a request into raw candidate records.
pub trait SuggestionSource: Send + Sync {
    fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<Value>, SuggestError>;
}

/// Stand-in used when no endpoint is configured; always fails over to the
/// fallback plan.
struct Unconfigured;

impl SuggestionSource for Unconfigured {
    fn suggest(&self, _request: &SuggestionRequest) -> Result<Vec<Value>, SuggestError> {
        Err(SuggestError::NotConfigured)
    }
}

pub fn build_source(settings: &SuggestionsConfig) -> Arc<dyn SuggestionSource> {
    match settings.endpoint.as_deref().map(str::trim) {
        Some(endpoint) if !endpoint.is_empty() => Arc::new(HttpSuggestionClient::new(
            endpoint,
            settings.api_key(),
            settings.timeout(),
        )),
        _ => Arc::new(Unconfigured),
    }
}

/// Result of one suggestion round, already coerced and safe to admit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionOutcome {
    pub blocks: Vec<NewTimeBlock>,
    pub notice: Option<String>,
    pub used_fallback: bool,
}

impl SuggestionOutcome {
    fn fallback(notice: String) -> Self {
        Self {
            blocks: fallback_blocks(),
            notice: Some(notice),
            used_fallback: true,
        }
    }
}

/// Asks `source` for suggestions; on any failure returns the fallback plan.
pub fn fetch_or_fallback(
    source: &dyn SuggestionSource,
    request: &SuggestionRequest,
) -> SuggestionOutcome {
    match source.suggest(request) {
        Ok(raw) => {
            let received = raw.len();
            let blocks = raw
                .iter()
                .filter_map(coerce_suggestion)
                .collect::<Vec<_>>();
            if blocks.len() < received {
                warn!(
                    dropped = received - blocks.len(),
                    "discarded suggestions with inverted times"
                );
            }
            info!(count = blocks.len(), "suggestions received");
            SuggestionOutcome {
                blocks,
                notice: None,
                used_fallback: false,
            }
        }
        Err(err) => {
            warn!(error = %err, "suggestion request failed, using fallback plan");
            SuggestionOutcome::fallback(err.notice())
        }
    }
}

/// A suggestion round running on a worker thread.
pub struct PendingSuggestions {
    rx: Receiver<SuggestionOutcome>,
}

impl PendingSuggestions {
    /// Non-blocking poll; `Some` once the worker has finished.
    pub fn try_take(&self) -> Option<SuggestionOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(SuggestionOutcome::fallback(
                SuggestError::Transport("worker stopped".to_string()).notice(),
            )),
        }
    }

    /// Blocks until the worker has finished.
    #[cfg(test)]
    pub fn wait(self) -> SuggestionOutcome {
        self.rx.recv().unwrap_or_else(|_| {
            SuggestionOutcome::fallback(
                SuggestError::Transport("worker stopped".to_string()).notice(),
            )
        })
    }
}

/// Runs [`fetch_or_fallback`] on a worker thread.
pub fn spawn_fetch(
    source: Arc<dyn SuggestionSource>,
    request: SuggestionRequest,
) -> PendingSuggestions {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let outcome = fetch_or_fallback(source.as_ref(), &request);
        // The receiver is gone when a newer request replaced this one.
        let _ = tx.send(outcome);
    });
    PendingSuggestions { rx }
}
