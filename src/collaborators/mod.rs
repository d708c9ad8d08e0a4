//! Host-supplied collaborators and the fail-open boundary around them.
//!
//! Every collaborator call goes through [`bounded`], which turns timeouts
//! into a [`CollaboratorFailure`]. Call sites resolve that failure to their
//! documented default; it never escapes a turn.

pub mod http;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::CollaboratorFailure;
use crate::quality::CorrectionRequest;
use crate::signals::EqSignal;
use crate::tone::StyleDirectives;

pub use http::{ChatCompletionClient, ChatCompletionConfig};

/// Produces the coach's reply for a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        directives: &StyleDirectives,
    ) -> Result<String, CollaboratorFailure>;
}

/// Optional second opinion on an utterance's EQ categories.
#[async_trait]
pub trait SignalRefiner: Send + Sync {
    /// Return categories for `utterance`. `preliminary` holds the keyword
    /// result. Only categories from the fixed enumeration are expressible.
    async fn refine(
        &self,
        utterance: &str,
        preliminary: &[EqSignal],
    ) -> Result<Vec<EqSignal>, CollaboratorFailure>;
}

/// Rewrites a reply that failed the quality gate. `Ok(None)` means the
/// rewriter declined.
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(
        &self,
        request: &CorrectionRequest,
    ) -> Result<Option<String>, CollaboratorFailure>;
}

/// Await `fut` for at most `timeout`.
pub async fn bounded<T, F>(
    collaborator: &'static str,
    timeout: Duration,
    fut: F,
) -> Result<T, CollaboratorFailure>
where
    F: Future<Output = Result<T, CollaboratorFailure>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(CollaboratorFailure::TimedOut {
            collaborator,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let ok = bounded("generator", Duration::from_secs(1), async {
            Ok::<_, CollaboratorFailure>(7)
        })
        .await;
        assert_eq!(ok, Ok(7));
    }

    #[test]
    fn test_bounded_passes_failure_through() {
        let failed: Result<(), _> = tokio_test::block_on(bounded(
            "rewriter",
            Duration::from_secs(1),
            async { Err(CollaboratorFailure::failed("rewriter", "HTTP 500")) },
        ));
        assert_eq!(
            failed.unwrap_err(),
            CollaboratorFailure::failed("rewriter", "HTTP 500")
        );
    }

    #[test]
    fn test_timeout_message_names_collaborator() {
        let err: Result<(), _> = tokio_test::block_on(bounded(
            "signal refiner",
            Duration::from_millis(5),
            futures::future::pending(),
        ));
        assert_eq!(
            err.unwrap_err().to_string(),
            "signal refiner timed out after 5ms"
        );
    }

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = bounded("generator", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, CollaboratorFailure>(())
        })
        .await;
        assert_eq!(
            slow,
            Err(CollaboratorFailure::TimedOut {
                collaborator: "generator",
                timeout_ms: 10
            })
        );
    }
}
