use std::sync::Arc;

use log::error;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::CustomError;

/// Destination for captured errors, e.g. a hosted error tracker.
pub trait ErrorReporter: Send + Sync {
    fn capture(&self, message: &str, tags: &[(&str, &str)], context: &Value);
}

/// Writes captured errors to the log, tagged with the reporting key they
/// would be sent under.
pub struct LogErrorReporter {
    dsn: String,
}

impl LogErrorReporter {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self { dsn: dsn.into() }
    }
}

impl ErrorReporter for LogErrorReporter {
    fn capture(&self, message: &str, tags: &[(&str, &str)], context: &Value) {
        error!(
            target: "error_report",
            "[{}] {} tags={:?} context={}",
            self.dsn, message, tags, context
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundaryOutcome {
    /// Replace the failed subtree with the generic error page.
    ErrorPage,
    /// The client bundle is stale; reload instead of showing the error.
    Reload,
}

pub struct ErrorBoundary {
    reporter: Option<Arc<dyn ErrorReporter>>,
    chunk_failed: Regex,
}

impl ErrorBoundary {
    pub fn new(reporter: Option<Arc<dyn ErrorReporter>>) -> Result<Self, CustomError> {
        let chunk_failed = Regex::new(r"Loading chunk \d+ failed")
            .map_err(|e| CustomError::ConfigError(e.to_string()))?;
        Ok(Self {
            reporter,
            chunk_failed,
        })
    }

    pub fn from_dsn(dsn: Option<&str>) -> Result<Self, CustomError> {
        let reporter = dsn.map(|dsn| Arc::new(LogErrorReporter::new(dsn)) as Arc<dyn ErrorReporter>);
        Self::new(reporter)
    }

    pub fn is_reporting(&self) -> bool {
        self.reporter.is_some()
    }

    /// Without a reporter every error shows the error page. With one, the
    /// error is reported with the wallet as context, and chunk load failures
    /// ask for a reload.
    pub fn capture(&self, message: &str, wallet_name: Option<&str>) -> BoundaryOutcome {
        let Some(reporter) = &self.reporter else {
            error!("unhandled error: {}", message);
            return BoundaryOutcome::ErrorPage;
        };

        let wallet_name = wallet_name.unwrap_or("unknown");
        reporter.capture(
            message,
            &[("web3", wallet_name)],
            &json!({ "wallet": { "name": wallet_name } }),
        );

        if self.chunk_failed.is_match(message) {
            BoundaryOutcome::Reload
        } else {
            BoundaryOutcome::ErrorPage
        }
    }

    /// Routes server-side failures through [`ErrorBoundary::capture`]; client
    /// errors pass through untouched.
    pub fn guard<T>(&self, result: Result<T, CustomError>, wallet_name: Option<&str>) -> Result<T, CustomError> {
        use actix_web::ResponseError;

        result.map_err(|e| {
            if !e.status_code().is_server_error() {
                return e;
            }
            match self.capture(&e.to_string(), wallet_name) {
                BoundaryOutcome::Reload => CustomError::ReloadRequiredError,
                BoundaryOutcome::ErrorPage => e,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingReporter {
        captured: Mutex<Vec<(String, String, Value)>>,
    }

    impl ErrorReporter for RecordingReporter {
        fn capture(&self, message: &str, tags: &[(&str, &str)], context: &Value) {
            let tags = tags
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(",");
            self.captured
                .lock()
                .unwrap()
                .push((message.to_string(), tags, context.clone()));
        }
    }

    #[test]
    fn reports_with_wallet_tags() {
        let reporter = Arc::new(RecordingReporter::default());
        let boundary = ErrorBoundary::new(Some(reporter.clone())).unwrap();

        let outcome = boundary.capture("boom", Some("MetaMask"));
        assert_eq!(outcome, BoundaryOutcome::ErrorPage);

        let captured = reporter.captured.lock().unwrap();
        assert_eq!(captured[0].0, "boom");
        assert_eq!(captured[0].1, "web3=MetaMask");
        assert_eq!(captured[0].2["wallet"]["name"], "MetaMask");
    }

    #[test]
    fn chunk_failures_reload_when_reporting() {
        let boundary = ErrorBoundary::new(Some(Arc::new(RecordingReporter::default()))).unwrap();
        assert_eq!(
            boundary.capture("Loading chunk 42 failed.", None),
            BoundaryOutcome::Reload
        );
        assert_eq!(
            boundary.capture("Loading chunk abc failed", None),
            BoundaryOutcome::ErrorPage
        );
    }

    #[test]
    fn without_reporter_always_shows_error_page() {
        let boundary = ErrorBoundary::from_dsn(None).unwrap();
        assert!(!boundary.is_reporting());
        assert_eq!(
            boundary.capture("Loading chunk 7 failed", None),
            BoundaryOutcome::ErrorPage
        );
    }

    #[test]
    fn guard_only_touches_server_errors() {
        let boundary = ErrorBoundary::new(Some(Arc::new(RecordingReporter::default()))).unwrap();
        let client_error: Result<(), _> = boundary.guard(Err(CustomError::WalletNotConnectedError), None);
        assert!(matches!(client_error, Err(CustomError::WalletNotConnectedError)));

        let stale: Result<(), _> = boundary.guard(
            Err(CustomError::NetworkError("Loading chunk 3 failed".into())),
            None,
        );
        assert!(matches!(stale, Err(CustomError::ReloadRequiredError)));
    }
}
