//! # warden-registry
//!
//! The environment registry: named environment configurations plus a cache of
//! live connections with token-expiry renewal and single-flight connect.
//!
//! Database drivers plug in through [`Connector`]; directory token
//! acquisition through [`TokenProvider`]; time through [`Clock`].
//!
//! ```rust,ignore
//! let tokens = ClientCredentialsProvider::new(Duration::from_secs(30))?;
//! let registry = EnvironmentRegistry::builder(config, Arc::new(PgConnector::default()))
//!     .token_provider(Arc::new(tokens))
//!     .build()?;
//!
//! let handle = registry.get_connection(Some("prod-db")).await?;
//! ```

pub mod aad;
pub mod auth;
pub mod clock;
pub mod connection;
pub mod connector;
pub mod error;
pub mod registry;

pub use aad::ClientCredentialsProvider;
pub use auth::{AccessToken, AuthParams, ConnectParams, TokenProvider, UnconfiguredTokenProvider};
pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::{ConnectionHandle, DatabaseConnection};
pub use connector::Connector;
pub use error::RegistryError;
pub use registry::{ConnectionState, EnvironmentRegistry, RegistryBuilder};
