//! Per-request source selection with silent fallback
//!
//! Two states. A request starts in `RemoteAttempt` when a remote store is
//! configured, otherwise directly in `LocalFallback`. Any remote error moves
//! it to `LocalFallback` with a warning and no retry. `LocalFallback` is
//! terminal: its failure is returned to the caller as
//! [`DataSourceError::Unavailable`] listing every attempt.

use super::error::{DataSourceError, ServiceError};
use std::future::Future;

/// Where a request is currently being served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    RemoteAttempt,
    LocalFallback,
}

/// A value together with the state that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub value: T,
    pub served_by: SourceState,
}

/// Process-wide selection policy
#[derive(Debug, Clone, Default)]
pub struct SourcePolicy {
    /// Label of the configured remote store, if any
    remote: Option<String>,
}

impl SourcePolicy {
    /// Policy for a process with (`Some(label)`) or without a remote store
    pub fn new(remote: Option<String>) -> Self {
        Self { remote }
    }

    pub fn local_only() -> Self {
        Self::default()
    }

    pub fn initial_state(&self) -> SourceState {
        if self.remote.is_some() {
            SourceState::RemoteAttempt
        } else {
            SourceState::LocalFallback
        }
    }

    /// Transition taken when the remote path fails
    pub fn on_remote_failure(&self, operation: &str, error: &ServiceError) -> SourceState {
        tracing::warn!(
            operation,
            remote = self.remote.as_deref().unwrap_or("<none>"),
            error = %error,
            "remote store failed, falling back to local snapshot"
        );
        SourceState::LocalFallback
    }

    /// Run one request through the state machine
    ///
    /// `remote` is only invoked in `RemoteAttempt`; `local` only after the
    /// remote path failed or was never configured.
    pub async fn execute<T, R, RF, L, LF>(
        &self,
        operation: &str,
        remote: R,
        local: L,
    ) -> Result<Served<T>, ServiceError>
    where
        R: FnOnce() -> RF,
        RF: Future<Output = Result<T, ServiceError>>,
        L: FnOnce() -> LF,
        LF: Future<Output = Result<T, ServiceError>>,
    {
        let mut remote_failure = None;

        if self.initial_state() == SourceState::RemoteAttempt {
            match remote().await {
                Ok(value) => {
                    return Ok(Served {
                        value,
                        served_by: SourceState::RemoteAttempt,
                    });
                }
                Err(error) => {
                    let next = self.on_remote_failure(operation, &error);
                    debug_assert_eq!(next, SourceState::LocalFallback);
                    remote_failure = Some(error);
                }
            }
        }

        match local().await {
            Ok(value) => Ok(Served {
                value,
                served_by: SourceState::LocalFallback,
            }),
            Err(error) => Err(self.exhausted(operation, error, remote_failure)),
        }
    }

    fn exhausted(
        &self,
        operation: &str,
        local_error: ServiceError,
        remote_failure: Option<ServiceError>,
    ) -> ServiceError {
        let mut unavailable = match local_error {
            ServiceError::DataSource(e) => e,
            other => {
                DataSourceError::unavailable(vec!["local snapshot".to_string()], other.to_string())
            }
        };
        if let (Some(remote), Some(failure)) = (&self.remote, &remote_failure) {
            unavailable = unavailable.after(format!("{} ({})", remote, failure));
        }

        tracing::error!(operation, error = %unavailable, "every data source failed");
        unavailable.into()
    }
}
