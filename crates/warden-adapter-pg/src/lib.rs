//! Postgres connector for the Warden environment registry.
//!
//! Each environment gets its own `sqlx` pool. Operations reach the pool by
//! downcasting the registry handle:
//!
//! ```rust,ignore
//! let handle = registry.get_connection(Some("dev")).await?;
//! let pool = handle.downcast_ref::<PgPoolConnection>().map(|c| c.pool());
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use warden_registry::{AuthParams, ConnectParams, Connector, DatabaseConnection, RegistryError};

const DEFAULT_PORT: u16 = 5432;

/// SQLSTATE class 28: invalid authorization specification.
const AUTH_SQLSTATE_PREFIX: &str = "28";

#[derive(Debug, Clone)]
pub struct PgConnectorOptions {
    /// Reported to the server as `application_name`.
    pub application_name: String,
    /// How long a pool waits for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for PgConnectorOptions {
    fn default() -> Self {
        Self {
            application_name: "warden".to_string(),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Opens one `PgPool` per environment.
#[derive(Debug, Clone, Default)]
pub struct PgConnector {
    options: PgConnectorOptions,
}

impl PgConnector {
    pub fn new(options: PgConnectorOptions) -> Self {
        Self { options }
    }

    /// Translate registry parameters into `sqlx` connect options.
    pub fn connect_options(&self, params: &ConnectParams) -> Result<PgConnectOptions, RegistryError> {
        let options = PgConnectOptions::new()
            .host(&params.server)
            .port(params.port.unwrap_or(DEFAULT_PORT))
            .database(&params.database)
            .application_name(&self.options.application_name);

        match &params.auth {
            AuthParams::Sql { username, password } => {
                let options = options.username(username);
                Ok(match password {
                    Some(password) => options.password(password),
                    None => options,
                })
            }
            AuthParams::Token { username, token } => {
                // The token stands in for the password and must travel over TLS.
                let options = options.password(&token.token).ssl_mode(PgSslMode::Require);
                Ok(match username {
                    Some(username) => options.username(username),
                    None => options,
                })
            }
            AuthParams::Windows { .. } => Err(RegistryError::AuthenticationFailed {
                environment: params.environment.clone(),
                message: "integrated windows authentication is not supported by the postgres connector"
                    .to_string(),
            }),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(
        &self,
        params: &ConnectParams,
    ) -> Result<Arc<dyn DatabaseConnection>, RegistryError> {
        let options = self.connect_options(params)?;

        let pool = PgPoolOptions::new()
            .max_connections(params.max_connections)
            .acquire_timeout(self.options.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| classify_error(&params.environment, e))?;

        tracing::debug!(
            environment = %params.environment,
            server = %params.server,
            database = %params.database,
            max_connections = params.max_connections,
            "Postgres pool connected"
        );

        Ok(Arc::new(PgPoolConnection { pool }))
    }
}

/// Map a `sqlx` connect error onto the registry taxonomy.
fn classify_error(environment: &str, error: sqlx::Error) -> RegistryError {
    let is_auth = match &error {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| code.starts_with(AUTH_SQLSTATE_PREFIX)),
        _ => false,
    };

    if is_auth {
        RegistryError::AuthenticationFailed {
            environment: environment.to_string(),
            message: error.to_string(),
        }
    } else {
        RegistryError::ConnectionFailed {
            environment: environment.to_string(),
            message: error.to_string(),
        }
    }
}

/// A connected Postgres pool.
#[derive(Debug, Clone)]
pub struct PgPoolConnection {
    pool: PgPool,
}

impl PgPoolConnection {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseConnection for PgPoolConnection {
    fn is_connected(&self) -> bool {
        !self.pool.is_closed()
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
