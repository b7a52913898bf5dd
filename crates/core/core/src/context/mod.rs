//! Session context shared by components that need the signed-in admin.
//!
//! The context is an explicit object handed to whoever needs it. It is fed
//! by the identity provider's listener between [`SessionContext::attach`]
//! and the drop (or [`SessionSubscription::detach`]) of the returned
//! subscription.

use crate::error::{AdminError, AdminResult};
use crate::types::AdminIdentity;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// The signed-in admin, if any.
    pub identity: Option<AdminIdentity>,
    /// True until the provider has reported at least once.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            identity: None,
            loading: true,
        }
    }
}

/// The session context passed to dashboard components.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    state: Arc<RwLock<SessionState>>,
}

impl SessionContext {
    /// Creates a context in the loading state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Records the provider's latest report and leaves the loading state.
    pub async fn set_identity(&self, identity: Option<AdminIdentity>) {
        let mut state = self.state.write().await;
        state.identity = identity;
        state.loading = false;
    }

    /// Returns true if an admin is signed in.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.identity.is_some()
    }

    /// Returns the signed-in admin or `Unauthenticated`.
    pub async fn require(&self) -> AdminResult<AdminIdentity> {
        self.state
            .read()
            .await
            .identity
            .clone()
            .ok_or(AdminError::Unauthenticated)
    }

    /// Starts following an identity listener.
    ///
    /// Every value published on `listener` replaces the session identity.
    /// The listener is followed until the subscription is dropped or the
    /// sending side goes away.
    pub fn attach(&self, mut listener: watch::Receiver<Option<AdminIdentity>>) -> SessionSubscription {
        let context = self.clone();
        let handle = tokio::spawn(async move {
            loop {
                let identity = listener.borrow_and_update().clone();
                context.set_identity(identity).await;
                if listener.changed().await.is_err() {
                    break;
                }
            }
            tracing::debug!("Identity listener closed");
        });
        SessionSubscription { handle }
    }
}

/// Handle for an attached identity listener.
#[derive(Debug)]
pub struct SessionSubscription {
    handle: JoinHandle<()>,
}

impl SessionSubscription {
    /// Stops following the listener.
    pub fn detach(self) {}

    /// Returns true once the listener task has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let ctx = SessionContext::new();
        let state = ctx.snapshot().await;
        assert!(state.loading);
        assert!(matches!(ctx.require().await, Err(AdminError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_attach_follows_listener() {
        let ctx = SessionContext::new();
        let (tx, rx) = watch::channel(None);
        let subscription = ctx.attach(rx);

        settle().await;
        let state = ctx.snapshot().await;
        assert!(!state.loading);
        assert!(state.identity.is_none());

        tx.send(Some(AdminIdentity::new("admin-1"))).unwrap();
        settle().await;
        assert_eq!(ctx.require().await.unwrap().uid, "admin-1");

        subscription.detach();
        settle().await;
        let _ = tx.send(None);
        settle().await;
        assert!(ctx.is_authenticated().await, "detached context must not follow the listener");
    }

    #[tokio::test]
    async fn test_listener_closed_ends_task() {
        let ctx = SessionContext::new();
        let (tx, rx) = watch::channel(Some(AdminIdentity::new("a")));
        let subscription = ctx.attach(rx);
        drop(tx);
        settle().await;
        assert!(subscription.is_finished());
    }
}
