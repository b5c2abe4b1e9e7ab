//! Bearer credential seam between the session and the request client

use async_trait::async_trait;

/// Bearer token (if any) tagged with the session generation it belongs to
///
/// The generation is present even without a token so a 401 on an
/// unauthenticated request can still be attributed to a session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: Option<String>,
    pub generation: u64,
}

/// Source of bearer credentials for outgoing requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn credential(&self) -> Credential;

    /// End the session if `generation` is still current. Returns `true` only
    /// for the caller that actually performed the invalidation.
    async fn invalidate(&self, generation: u64) -> bool;
}

/// Token source that never has a session
pub struct Anonymous;

#[async_trait]
impl TokenSource for Anonymous {
    async fn credential(&self) -> Credential {
        Credential {
            token: None,
            generation: 0,
        }
    }

    async fn invalidate(&self, _generation: u64) -> bool {
        false
    }
}
