//! Live connection handles owned by the registry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A physical connection (usually a pool) produced by a [`Connector`](crate::Connector).
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// Whether the connection can still serve queries.
    fn is_connected(&self) -> bool;

    /// Release the underlying resources. Must be idempotent.
    async fn close(&self);

    /// Access the concrete type, so operations can reach a driver-specific pool.
    fn as_any(&self) -> &dyn Any;
}

/// A cached connection for one environment.
///
/// Handles are shared as `Arc<ConnectionHandle>`; the registry decides when a
/// handle is replaced and closes the old one.
pub struct ConnectionHandle {
    id: Uuid,
    environment: String,
    opened_at: DateTime<Utc>,
    /// Token lifetime for `aad` environments; `None` never expires.
    expires_at: Option<DateTime<Utc>>,
    inner: Arc<dyn DatabaseConnection>,
}

impl ConnectionHandle {
    pub fn new(
        environment: impl Into<String>,
        opened_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
        inner: Arc<dyn DatabaseConnection>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            environment: environment.into(),
            opened_at,
            expires_at,
            inner,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Usable at `now`: still connected, and any expiry lies beyond `now + margin`.
    pub fn is_usable_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        if !self.is_connected() {
            return false;
        }
        match (self.expires_at, now.checked_add_signed(margin)) {
            (None, _) => true,
            (Some(expiry), Some(deadline)) => expiry > deadline,
            (Some(_), None) => false,
        }
    }

    /// Downcast the underlying connection.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    pub(crate) async fn close(&self) {
        self.inner.close().await;
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("environment", &self.environment)
            .field("opened_at", &self.opened_at)
            .field("expires_at", &self.expires_at)
            .field("connected", &self.is_connected())
            .finish()
    }
}
