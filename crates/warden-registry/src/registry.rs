//! The environment registry.
//!
//! Owns the immutable environment configurations and a per-environment cache
//! of live connection handles.
//!
//! ## Connection lifecycle
//!
//! ```text
//! Absent -> Connecting -> Ready -> Expiring -> Connecting (replace) -> ... -> Closed
//! ```
//!
//! - A cached handle is reused while it is connected and its token expiry (if
//!   any) lies beyond `now + token_refresh_margin`.
//! - Concurrent `get_connection` calls for the same environment share one
//!   in-flight attempt. Every waiter sees the same handle or the same error.
//! - A failed attempt leaves the environment `Absent`; nothing is retried.
//! - The replaced handle is closed once the attempt settles.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use warden_core::{
    AccessCheck, ConfigError, ConnectionSettings, EnvironmentConfig, ScopeRules, WardenConfig,
};

use crate::auth::{self, TokenProvider, UnconfiguredTokenProvider};
use crate::clock::{Clock, SystemClock};
use crate::connection::ConnectionHandle;
use crate::connector::Connector;
use crate::error::RegistryError;

type ConnectResult = Result<Arc<ConnectionHandle>, RegistryError>;
type PendingConnect = Shared<BoxFuture<'static, ConnectResult>>;

/// Observable state of one environment's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No handle cached.
    Absent,
    /// An attempt is in flight.
    Connecting,
    /// A usable handle is cached.
    Ready,
    /// A handle is cached but expired or disconnected; the next call replaces it.
    Expiring,
    /// The registry has been shut down.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Absent => "absent",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Expiring => "expiring",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

enum Slot {
    Ready(Arc<ConnectionHandle>),
    Connecting { attempt: u64, pending: PendingConnect },
}

#[derive(Default)]
struct CacheState {
    closed: bool,
    next_attempt: u64,
    slots: HashMap<String, Slot>,
}

enum Lookup {
    Hit(Arc<ConnectionHandle>),
    Join(PendingConnect),
    Miss(Option<Arc<ConnectionHandle>>),
}

struct Inner {
    environments: Vec<EnvironmentConfig>,
    default_environment: Option<String>,
    settings: ConnectionSettings,
    connector: Arc<dyn Connector>,
    tokens: Arc<dyn TokenProvider>,
    clock: Arc<dyn Clock>,
    cache: Mutex<CacheState>,
}

impl Inner {
    fn cache(&self) -> MutexGuard<'_, CacheState> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh_margin(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.settings.refresh_margin()).unwrap_or(chrono::Duration::MAX)
    }

    fn is_usable(&self, handle: &ConnectionHandle, now: DateTime<Utc>) -> bool {
        handle.is_usable_at(now, self.refresh_margin())
    }

    async fn open(&self, environment: &EnvironmentConfig) -> ConnectResult {
        let params = auth::connect_params(environment, &self.settings, self.tokens.as_ref()).await?;
        let expires_at = params.expires_at();
        let connection = self.connector.connect(&params).await?;
        Ok(Arc::new(ConnectionHandle::new(
            &environment.name,
            self.clock.now(),
            expires_at,
            connection,
        )))
    }
}

/// Builder for [`EnvironmentRegistry`].
pub struct RegistryBuilder {
    config: WardenConfig,
    connector: Arc<dyn Connector>,
    tokens: Arc<dyn TokenProvider>,
    clock: Arc<dyn Clock>,
}

impl RegistryBuilder {
    pub fn token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the configuration and build the registry.
    pub fn build(self) -> Result<EnvironmentRegistry, ConfigError> {
        self.config.validate()?;

        let WardenConfig {
            default_environment,
            environments,
            connection,
            ..
        } = self.config;

        tracing::info!(
            environments = environments.len(),
            default = ?default_environment,
            "Environment registry ready"
        );

        Ok(EnvironmentRegistry {
            inner: Arc::new(Inner {
                environments,
                default_environment,
                settings: connection,
                connector: self.connector,
                tokens: self.tokens,
                clock: self.clock,
                cache: Mutex::new(CacheState::default()),
            }),
        })
    }
}

/// Named environments plus their live connections.
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct EnvironmentRegistry {
    inner: Arc<Inner>,
}

impl EnvironmentRegistry {
    /// Start building a registry over `config`, opening connections with `connector`.
    pub fn builder(config: WardenConfig, connector: Arc<dyn Connector>) -> RegistryBuilder {
        RegistryBuilder {
            config,
            connector,
            tokens: Arc::new(UnconfiguredTokenProvider),
            clock: Arc::new(SystemClock),
        }
    }

    // ===== Configuration =====

    /// All environments, in declaration order.
    pub fn environments(&self) -> &[EnvironmentConfig] {
        &self.inner.environments
    }

    pub fn default_environment(&self) -> Option<&str> {
        self.inner.default_environment.as_deref()
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.inner.settings
    }

    /// Look up an environment, falling back to the default when `name` is absent or empty.
    pub fn resolve(&self, name: Option<&str>) -> Result<&EnvironmentConfig, RegistryError> {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => self
                .inner
                .default_environment
                .as_deref()
                .ok_or(RegistryError::NoDefaultEnvironment)?,
        };

        self.inner
            .environments
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| RegistryError::EnvironmentNotFound(name.to_string()))
    }

    pub fn is_database_allowed(
        &self,
        environment: Option<&str>,
        database: &str,
    ) -> Result<AccessCheck, RegistryError> {
        Ok(self.resolve(environment)?.is_database_allowed(database))
    }

    pub fn is_schema_allowed(
        &self,
        environment: Option<&str>,
        schema: &str,
        table: Option<&str>,
    ) -> Result<AccessCheck, RegistryError> {
        Ok(self.resolve(environment)?.is_schema_allowed(schema, table))
    }

    // ===== Connections =====

    /// Get a usable connection for an environment, opening one if needed.
    pub async fn get_connection(&self, name: Option<&str>) -> ConnectResult {
        let environment = self.resolve(name)?;

        let pending = {
            let mut cache = self.inner.cache();
            if cache.closed {
                return Err(RegistryError::Closed);
            }

            let now = self.inner.clock.now();
            let lookup = match cache.slots.get(&environment.name) {
                Some(Slot::Ready(handle)) if self.inner.is_usable(handle, now) => {
                    Lookup::Hit(handle.clone())
                }
                Some(Slot::Ready(handle)) => Lookup::Miss(Some(handle.clone())),
                Some(Slot::Connecting { pending, .. }) => Lookup::Join(pending.clone()),
                None => Lookup::Miss(None),
            };

            match lookup {
                Lookup::Hit(handle) => return Ok(handle),
                Lookup::Join(pending) => {
                    tracing::debug!(environment = %environment.name, "Joining in-flight connect");
                    pending
                }
                Lookup::Miss(stale) => self.start_connect(&mut cache, environment, stale),
            }
        };

        pending.await
    }

    /// Register a new attempt in the cache. Caller holds the cache lock.
    ///
    /// The attempt runs as its own task so it settles (and cleans up its slot)
    /// even if every waiter is dropped.
    fn start_connect(
        &self,
        cache: &mut CacheState,
        environment: &EnvironmentConfig,
        stale: Option<Arc<ConnectionHandle>>,
    ) -> PendingConnect {
        cache.next_attempt += 1;
        let attempt = cache.next_attempt;
        let name = environment.name.clone();

        tracing::debug!(
            environment = %name,
            attempt,
            replacing = stale.is_some(),
            "Opening connection"
        );

        let task = tokio::spawn(connect_and_install(
            self.inner.clone(),
            environment.clone(),
            attempt,
            stale,
        ));

        let task_name = name.clone();
        let pending = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(RegistryError::failed(
                    &task_name,
                    format!("connect task aborted: {}", e),
                )),
            }
        }
        .boxed()
        .shared();

        cache.slots.insert(
            name,
            Slot::Connecting {
                attempt,
                pending: pending.clone(),
            },
        );
        pending
    }

    /// Current cache state for an environment.
    pub fn connection_state(&self, name: Option<&str>) -> Result<ConnectionState, RegistryError> {
        let environment = self.resolve(name)?;
        let cache = self.inner.cache();
        if cache.closed {
            return Ok(ConnectionState::Closed);
        }

        let now = self.inner.clock.now();
        Ok(match cache.slots.get(&environment.name) {
            None => ConnectionState::Absent,
            Some(Slot::Connecting { .. }) => ConnectionState::Connecting,
            Some(Slot::Ready(handle)) if self.inner.is_usable(handle, now) => ConnectionState::Ready,
            Some(Slot::Ready(_)) => ConnectionState::Expiring,
        })
    }

    /// Close every cached handle and refuse further connections.
    ///
    /// In-flight attempts close their own connection when they finish.
    pub async fn close_all(&self) {
        let handles: Vec<Arc<ConnectionHandle>> = {
            let mut cache = self.inner.cache();
            cache.closed = true;
            cache
                .slots
                .drain()
                .filter_map(|(_, slot)| match slot {
                    Slot::Ready(handle) => Some(handle),
                    Slot::Connecting { .. } => None,
                })
                .collect()
        };

        for handle in &handles {
            handle.close().await;
            tracing::info!(
                environment = %handle.environment(),
                handle = %handle.id(),
                "Closed connection"
            );
        }

        tracing::info!(closed = handles.len(), "Environment registry closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cache().closed
    }
}

impl fmt::Debug for EnvironmentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentRegistry")
            .field(
                "environments",
                &self
                    .inner
                    .environments
                    .iter()
                    .map(|e| e.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("default_environment", &self.inner.default_environment)
            .finish_non_exhaustive()
    }
}

/// Run one connect attempt under the configured timeout and publish its outcome.
async fn connect_and_install(
    inner: Arc<Inner>,
    environment: EnvironmentConfig,
    attempt: u64,
    stale: Option<Arc<ConnectionHandle>>,
) -> ConnectResult {
    let timeout = inner.settings.connect_timeout();
    let result = match tokio::time::timeout(timeout, inner.open(&environment)).await {
        Ok(result) => result,
        Err(_) => Err(RegistryError::ConnectionTimeout {
            environment: environment.name.clone(),
            seconds: inner.settings.connect_timeout_secs,
        }),
    };

    let (outcome, orphan) = {
        let mut cache = inner.cache();
        let owns_slot = matches!(
            cache.slots.get(&environment.name),
            Some(Slot::Connecting { attempt: current, .. }) if *current == attempt
        );

        match result {
            Ok(handle) if cache.closed || !owns_slot => (Err(RegistryError::Closed), Some(handle)),
            Ok(handle) => {
                cache
                    .slots
                    .insert(environment.name.clone(), Slot::Ready(handle.clone()));
                (Ok(handle), None)
            }
            Err(e) => {
                if owns_slot {
                    cache.slots.remove(&environment.name);
                }
                (Err(e), None)
            }
        }
    };

    match &outcome {
        Ok(handle) => tracing::info!(
            environment = %environment.name,
            handle = %handle.id(),
            expires_at = ?handle.expires_at(),
            "Connection opened"
        ),
        Err(e) => tracing::warn!(
            environment = %environment.name,
            error = %e,
            "Connection attempt failed"
        ),
    }

    if let Some(handle) = orphan {
        handle.close().await;
    }

    if let Some(stale) = stale {
        stale.close().await;
        tracing::info!(
            environment = %environment.name,
            handle = %stale.id(),
            "Closed replaced connection"
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AccessToken, ConnectParams};
    use crate::clock::ManualClock;
    use crate::connection::DatabaseConnection;
    use async_trait::async_trait;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::any::Any;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use warden_core::{AadSettings, AuthMode, ErrorCode};

    #[derive(Default)]
    struct FakeConnection {
        closed: AtomicBool,
    }

    #[async_trait]
    impl DatabaseConnection for FakeConnection {
        fn is_connected(&self) -> bool {
            !self.closed.load(Ordering::SeqCst)
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct FakeConnector {
        attempts: AtomicUsize,
        fail: AtomicBool,
        delay_ms: u64,
        opened: std::sync::Mutex<Vec<Arc<FakeConnection>>>,
    }

    impl FakeConnector {
        fn slow(delay_ms: u64) -> Self {
            Self {
                delay_ms,
                ..Default::default()
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }

        /// Every physical connection handed out, in order.
        fn opened(&self) -> Vec<Arc<FakeConnection>> {
            self.opened.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        async fn connect(
            &self,
            params: &ConnectParams,
        ) -> Result<Arc<dyn DatabaseConnection>, RegistryError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(RegistryError::ConnectionFailed {
                    environment: params.environment.clone(),
                    message: "refused".to_string(),
                });
            }
            let connection = Arc::new(FakeConnection::default());
            self.opened.lock().unwrap().push(connection.clone());
            Ok(connection)
        }
    }

    /// Issues one-hour tokens relative to the manual clock.
    #[derive(Debug)]
    struct ClockTokens(Arc<ManualClock>);

    #[async_trait]
    impl TokenProvider for ClockTokens {
        async fn acquire_token(
            &self,
            _environment: &EnvironmentConfig,
        ) -> Result<AccessToken, RegistryError> {
            Ok(AccessToken {
                token: "t".to_string(),
                expires_at: self.0.now() + Duration::hours(1),
            })
        }
    }

    fn sql_env(name: &str) -> EnvironmentConfig {
        EnvironmentConfig {
            username: Some("app".to_string()),
            ..EnvironmentConfig::new(name, "localhost", "app")
        }
    }

    fn config() -> WardenConfig {
        let aad = EnvironmentConfig {
            auth_mode: AuthMode::Aad,
            aad: Some(AadSettings {
                tenant_id: "tenant".to_string(),
                client_id: "client".to_string(),
                client_secret: None,
                scope: None,
                authority: None,
            }),
            ..EnvironmentConfig::new("cloud", "cloud.example", "app")
        };
        WardenConfig {
            default_environment: Some("dev".to_string()),
            environments: vec![sql_env("dev"), sql_env("prod-db"), aad],
            ..Default::default()
        }
    }

    fn registry(connector: Arc<FakeConnector>) -> (EnvironmentRegistry, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let registry = EnvironmentRegistry::builder(config(), connector)
            .clock(clock.clone())
            .token_provider(Arc::new(ClockTokens(clock.clone())))
            .build()
            .unwrap();
        (registry, clock)
    }

    #[test]
    fn test_resolve_default_and_unknown() {
        let (registry, _) = registry(Arc::new(FakeConnector::default()));

        assert_eq!(registry.resolve(None).unwrap().name, "dev");
        assert_eq!(registry.resolve(Some("")).unwrap().name, "dev");
        assert_eq!(registry.resolve(Some("prod-db")).unwrap().name, "prod-db");

        let err = registry.resolve(Some("staging")).unwrap_err();
        assert_eq!(err, RegistryError::EnvironmentNotFound("staging".to_string()));
        assert_eq!(err.code(), ErrorCode::EnvironmentNotFound);
    }

    #[test]
    fn test_no_default_environment() {
        let config = WardenConfig {
            environments: vec![sql_env("dev")],
            ..Default::default()
        };
        let registry = EnvironmentRegistry::builder(config, Arc::new(FakeConnector::default()))
            .build()
            .unwrap();
        assert_eq!(registry.resolve(None).unwrap_err(), RegistryError::NoDefaultEnvironment);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let config = WardenConfig {
            environments: vec![sql_env("dev"), sql_env("DEV")],
            ..Default::default()
        };
        let result = EnvironmentRegistry::builder(config, Arc::new(FakeConnector::default())).build();
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_cached_handle_is_reused() {
        let connector = Arc::new(FakeConnector::default());
        let (registry, _) = registry(connector.clone());

        assert_eq!(registry.connection_state(None).unwrap(), ConnectionState::Absent);
        let first = registry.get_connection(None).await.unwrap();
        let second = registry.get_connection(Some("dev")).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.attempts(), 1);
        assert_eq!(registry.connection_state(None).unwrap(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn test_expired_token_triggers_one_reconnect() {
        let connector = Arc::new(FakeConnector::default());
        let (registry, clock) = registry(connector.clone());

        let first = registry.get_connection(Some("cloud")).await.unwrap();
        clock.advance(Duration::minutes(30));
        let again = registry.get_connection(Some("cloud")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(connector.attempts(), 1);

        // Inside the two-minute refresh margin.
        clock.advance(Duration::minutes(29));
        assert_eq!(
            registry.connection_state(Some("cloud")).unwrap(),
            ConnectionState::Expiring
        );

        let renewed = registry.get_connection(Some("cloud")).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &renewed));
        assert_eq!(connector.attempts(), 2);
        assert!(!first.is_connected());
        assert!(renewed.is_connected());

        let cached = registry.get_connection(Some("cloud")).await.unwrap();
        assert!(Arc::ptr_eq(&renewed, &cached));
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test]
    async fn test_disconnected_handle_is_replaced() {
        let connector = Arc::new(FakeConnector::default());
        let (registry, _) = registry(connector.clone());

        let first = registry.get_connection(None).await.unwrap();
        first.close().await;

        let second = registry.get_connection(None).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_attempt() {
        let connector = Arc::new(FakeConnector::slow(50));
        let (registry, _) = registry(connector.clone());

        let calls = (0..16).map(|_| registry.get_connection(Some("prod-db")));
        let results = futures::future::join_all(calls).await;

        assert_eq!(connector.attempts(), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_failure() {
        let connector = Arc::new(FakeConnector::slow(50));
        connector.fail.store(true, Ordering::SeqCst);
        let (registry, _) = registry(connector.clone());

        let calls = (0..8).map(|_| registry.get_connection(None));
        let results = futures::future::join_all(calls).await;

        assert_eq!(connector.attempts(), 1);
        for result in &results {
            assert_eq!(result.as_ref().unwrap_err().code(), ErrorCode::ConnectionFailed);
        }
        assert_eq!(registry.connection_state(None).unwrap(), ConnectionState::Absent);

        // Failures are not cached; the next call tries again.
        connector.fail.store(false, Ordering::SeqCst);
        registry.get_connection(None).await.unwrap();
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_renewal_after_expiry_replaces_once() {
        let connector = Arc::new(FakeConnector::slow(50));
        let (registry, clock) = registry(connector.clone());

        let first = registry.get_connection(Some("cloud")).await.unwrap();
        clock.advance(Duration::minutes(59));

        let calls = (0..12).map(|_| registry.get_connection(Some("cloud")));
        let results = futures::future::join_all(calls).await;

        assert_eq!(connector.attempts(), 2);
        let renewed = results[0].as_ref().unwrap();
        assert!(!Arc::ptr_eq(&first, renewed));
        for result in &results {
            assert!(Arc::ptr_eq(renewed, result.as_ref().unwrap()));
        }
        assert!(!first.is_connected());
        assert!(renewed.is_connected());
        assert_eq!(
            registry.connection_state(Some("cloud")).unwrap(),
            ConnectionState::Ready
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_all_during_connect_discards_the_new_connection() {
        let connector = Arc::new(FakeConnector::slow(50));
        let (registry, _) = registry(connector.clone());

        let waiter = registry.get_connection(Some("prod-db"));
        let closer = async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            assert_eq!(
                registry.connection_state(Some("prod-db")).unwrap(),
                ConnectionState::Connecting
            );
            registry.close_all().await;
        };
        let (result, ()) = tokio::join!(waiter, closer);

        assert_eq!(result.unwrap_err(), RegistryError::Closed);
        assert_eq!(connector.attempts(), 1);

        // The attempt finished after shutdown; its connection must not leak.
        let opened = connector.opened();
        assert_eq!(opened.len(), 1);
        assert!(!opened[0].is_connected());
        assert_eq!(
            registry.connection_state(Some("prod-db")).unwrap(),
            ConnectionState::Closed
        );
        assert_eq!(registry.get_connection(None).await.unwrap_err(), RegistryError::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout_leaves_environment_absent() {
        let connector = Arc::new(FakeConnector::slow(60_000));
        let (registry, _) = registry(connector.clone());

        let err = registry.get_connection(None).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::ConnectionTimeout {
                environment: "dev".to_string(),
                seconds: 30
            }
        );
        assert_eq!(registry.connection_state(None).unwrap(), ConnectionState::Absent);
    }

    #[tokio::test]
    async fn test_close_all_is_terminal() {
        let connector = Arc::new(FakeConnector::default());
        let (registry, _) = registry(connector.clone());

        let dev = registry.get_connection(Some("dev")).await.unwrap();
        let prod = registry.get_connection(Some("prod-db")).await.unwrap();

        registry.close_all().await;
        assert!(!dev.is_connected());
        assert!(!prod.is_connected());
        assert!(registry.is_closed());
        assert_eq!(registry.connection_state(None).unwrap(), ConnectionState::Closed);
        assert_eq!(registry.get_connection(None).await.unwrap_err(), RegistryError::Closed);
    }

    #[test]
    fn test_access_checks_delegate_to_environment() {
        let (registry, _) = registry(Arc::new(FakeConnector::default()));
        assert!(registry.is_database_allowed(None, "APP").unwrap().allowed);
        assert!(!registry.is_database_allowed(None, "other").unwrap().allowed);
        assert!(registry.is_schema_allowed(Some("dev"), "dbo", None).unwrap().allowed);
        assert!(registry.is_database_allowed(Some("nope"), "app").is_err());
    }
}
