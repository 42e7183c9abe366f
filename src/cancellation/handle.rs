//! Per-request cancellation handle.

use std::convert::Infallible;
use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio_util::sync::CancellationToken;

/// "This request should stop." Owned by whoever created it (the boundary or
/// a test); handlers only observe it.
///
/// As an extractor it yields the handle installed by
/// [`CancellationBoundaryLayer`](super::CancellationBoundaryLayer), or an
/// inert handle that never fires when the boundary is not in place.
#[derive(Debug, Clone)]
pub struct CancellationHandle(CancellationToken);

impl CancellationHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self(token)
    }

    /// A handle nothing will ever cancel.
    pub fn inert() -> Self {
        Self(CancellationToken::new())
    }

    pub fn into_token(self) -> CancellationToken {
        self.0
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::inert()
    }
}

impl Deref for CancellationHandle {
    type Target = CancellationToken;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CancellationHandle
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CancellationHandle>()
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn extracts_installed_handle() {
        let token = CancellationToken::new();
        let mut req = Request::new(());
        req.extensions_mut().insert(CancellationHandle::new(token.clone()));
        let (mut parts, _) = req.into_parts();

        let handle = CancellationHandle::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(!handle.is_cancelled());
        token.cancel();
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn missing_handle_is_inert() {
        let (mut parts, _) = Request::new(()).into_parts();
        let handle = CancellationHandle::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(!handle.is_cancelled());
    }
}
