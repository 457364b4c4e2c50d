//! Location resolver — orchestrates the fallback chain.
//!
//! Flow: primary provider → fallback provider → unresolvable.
//! No retries and no caching: two calls with the same provider behaviour give
//! the same answer.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::providers::{IpApiProvider, IpInfoProvider, LocationProvider, FALLBACK_URL, PRIMARY_URL};
use super::types::{LocationError, LocationSource, Notice, Resolution, ResolveFailure};

/// Per-request timeout for each provider when the whole lookup must finish
/// within `lookup`. Two fifths each leaves room for both requests plus
/// scheduling overhead, so a hanging primary still reaches the fallback.
pub fn provider_budget(lookup: Duration) -> Duration {
    lookup * 2 / 5
}

/// The location resolver with its two-step pipeline.
pub struct LocationResolver {
    primary: Box<dyn LocationProvider>,
    fallback: Box<dyn LocationProvider>,
}

impl LocationResolver {
    /// Resolver against the public ipinfo.io and ipapi.co endpoints.
    pub fn new(provider_timeout: Duration) -> Self {
        Self::with_endpoints(PRIMARY_URL, FALLBACK_URL, provider_timeout)
    }

    /// `provider_timeout` bounds each request separately; see [`provider_budget`].
    pub fn with_endpoints(primary_url: &str, fallback_url: &str, provider_timeout: Duration) -> Self {
        Self::with_providers(
            Box::new(IpInfoProvider::new(primary_url, provider_timeout)),
            Box::new(IpApiProvider::new(fallback_url, provider_timeout)),
        )
    }

    /// Create a resolver from arbitrary providers (for testing).
    pub fn with_providers(
        primary: Box<dyn LocationProvider>,
        fallback: Box<dyn LocationProvider>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Walk the chain to completion.
    pub fn resolve(&self) -> Result<Resolution, ResolveFailure> {
        self.resolve_until(&CancellationToken::new())
    }

    /// Walk the chain, skipping the fallback once `cancel` has fired.
    pub fn resolve_until(&self, cancel: &CancellationToken) -> Result<Resolution, ResolveFailure> {
        let primary_err = match self.primary.locate() {
            Ok(located) => {
                tracing::debug!(provider = self.primary.name(), "primary provider resolved location");
                return Ok(Resolution {
                    coordinate: located.coordinate,
                    details: None,
                    source: LocationSource::Primary,
                    notices: Vec::new(),
                });
            }
            Err(LocationError::PrimaryUnavailable(reason)) => LocationError::PrimaryUnavailable(reason),
            Err(e) => LocationError::PrimaryUnavailable(e.to_string()),
        };

        tracing::info!(provider = self.primary.name(), error = %primary_err, "falling back");
        let notices = vec![Notice::PrimaryFellBack];

        if cancel.is_cancelled() {
            return Err(ResolveFailure {
                primary: primary_err,
                fallback: LocationError::Cancelled,
                notices,
            });
        }

        match self.fallback.locate() {
            Ok(located) => Ok(Resolution {
                coordinate: located.coordinate,
                details: located.details,
                source: LocationSource::Fallback,
                notices,
            }),
            Err(fallback_err) => {
                tracing::warn!(provider = self.fallback.name(), error = %fallback_err, "fallback provider failed");
                Err(ResolveFailure {
                    primary: primary_err,
                    fallback: fallback_err,
                    notices,
                })
            }
        }
    }
}

/// Run the blocking chain off the async runtime, bounded by `timeout` and
/// abandoned when `cancel` fires.
pub async fn resolve_with_deadline(
    resolver: Arc<LocationResolver>,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<Resolution, ResolveFailure> {
    let task_cancel = cancel.clone();
    let task = tokio::task::spawn_blocking(move || resolver.resolve_until(&task_cancel));

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ResolveFailure::aborted(LocationError::Cancelled)),
        joined = tokio::time::timeout(timeout, task) => match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ResolveFailure::aborted(LocationError::Data(format!("lookup task failed: {}", e)))),
            Err(_) => Err(ResolveFailure::aborted(LocationError::TimedOut)),
        },
    };

    // Stop a still-running blocking task from starting the fallback request.
    cancel.cancel();
    outcome
}
