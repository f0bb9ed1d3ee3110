//! Request cancellation scopes
//!
//! A [`RequestScope`] belongs to whatever issued the requests (a screen, a
//! background task). Cancelling or dropping it aborts every request still
//! running inside it with [`ServiceError::Cancelled`].

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::services::{ServiceError, ServiceResult};

/// Cancellation boundary for a group of requests
#[derive(Debug, Default)]
pub struct RequestScope {
    token: CancellationToken,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope that is also cancelled when `parent` is
    pub fn child_of(parent: &RequestScope) -> Self {
        Self {
            token: parent.token.child_token(),
        }
    }

    /// Token for code that wants to watch the scope directly
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `fut` unless the scope is cancelled first
    ///
    /// An already-cancelled scope returns without polling `fut`.
    pub async fn run<T, F>(&self, fut: F) -> ServiceResult<T>
    where
        F: Future<Output = ServiceResult<T>>,
    {
        race(self.token.clone(), fut).await
    }

    /// Spawn `fut` onto the runtime, tied to this scope
    ///
    /// Dropping the scope cancels the task; its handle then yields `Cancelled`.
    pub fn spawn<T, F>(&self, fut: F) -> JoinHandle<ServiceResult<T>>
    where
        T: Send + 'static,
        F: Future<Output = ServiceResult<T>> + Send + 'static,
    {
        tokio::spawn(race(self.token.clone(), fut))
    }
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if !self.token.is_cancelled() {
            debug!("Request scope dropped, cancelling in-flight requests");
            self.token.cancel();
        }
    }
}

async fn race<T, F>(token: CancellationToken, fut: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    if token.is_cancelled() {
        return Err(ServiceError::Cancelled);
    }

    tokio::select! {
        biased;
        () = token.cancelled() => Err(ServiceError::Cancelled),
        result = fut => result,
    }
}
