//! The driver seam: turning [`ConnectParams`] into a live connection.

use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::ConnectParams;
use crate::connection::DatabaseConnection;
use crate::error::RegistryError;

/// Opens physical connections. One implementation per database driver.
///
/// Implementations report rejected credentials as
/// [`RegistryError::AuthenticationFailed`] and everything else as
/// [`RegistryError::ConnectionFailed`]. Timeouts are applied by the registry.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        params: &ConnectParams,
    ) -> Result<Arc<dyn DatabaseConnection>, RegistryError>;
}
