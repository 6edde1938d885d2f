//! Routing prompts end to end through the enforcer and registry.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use warden_audit::{AuditLogger, MemoryStorage};
use warden_core::{EnvironmentConfig, ErrorCode, RouterConfig, ToolCapabilities, ToolResult, WardenConfig};
use warden_policy::{PolicyEnforcer, Tool, ToolContext, ToolRegistry};
use warden_registry::{ConnectParams, Connector, DatabaseConnection, EnvironmentRegistry, RegistryError};
use warden_router::{IntentRouter, OperationSpec, RouteRequest, default_catalog};

struct FakeConnection;

#[async_trait]
impl DatabaseConnection for FakeConnection {
    fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) {}

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Default)]
struct FakeConnector {
    attempts: AtomicUsize,
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _params: &ConnectParams,
    ) -> Result<Arc<dyn DatabaseConnection>, RegistryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeConnection))
    }
}

/// Echoes where it ran; fails when asked to.
struct Recorder {
    name: &'static str,
    capabilities: ToolCapabilities,
    runs: AtomicUsize,
}

impl Recorder {
    fn new(name: &'static str, capabilities: ToolCapabilities) -> Arc<Self> {
        Arc::new(Self {
            name,
            capabilities,
            runs: AtomicUsize::new(0),
        })
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> ToolCapabilities {
        self.capabilities
    }

    async fn run(&self, ctx: &ToolContext) -> anyhow::Result<ToolResult> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if ctx.arguments.get("explode").is_some() {
            anyhow::bail!("driver error: connection reset");
        }
        Ok(ToolResult::success(json!({
            "tool": self.name,
            "environment": ctx.environment,
        })))
    }
}

struct Harness {
    router: IntentRouter,
    connector: Arc<FakeConnector>,
    list_tables: Arc<Recorder>,
    read_data: Arc<Recorder>,
    update_data: Arc<Recorder>,
}

impl Harness {
    fn new(config: RouterConfig) -> Self {
        Self::with_operations(default_catalog(), config)
    }

    fn with_operations(operations: Vec<OperationSpec>, router: RouterConfig) -> Self {
        let config = WardenConfig {
            default_environment: Some("dev".to_string()),
            environments: vec![
                environment("dev"),
                EnvironmentConfig {
                    require_approval: true,
                    ..environment("staging")
                },
                EnvironmentConfig {
                    readonly: true,
                    ..environment("prod-db")
                },
            ],
            ..Default::default()
        };
        let connector = Arc::new(FakeConnector::default());
        let registry = EnvironmentRegistry::builder(config, connector.clone())
            .build()
            .unwrap();
        let enforcer = Arc::new(PolicyEnforcer::new(
            registry,
            Arc::new(AuditLogger::with_storage(Arc::new(MemoryStorage::new()))),
        ));

        let list_tables = Recorder::new("list_tables", ToolCapabilities::read_only());
        let read_data = Recorder::new("read_data", ToolCapabilities::read_only());
        let update_data = Recorder::new("update_data", ToolCapabilities::mutating());
        let mut tools = ToolRegistry::new();
        tools.register(list_tables.clone());
        tools.register(read_data.clone());
        tools.register(update_data.clone());

        Self {
            router: IntentRouter::new(enforcer, tools, operations, router),
            connector,
            list_tables,
            read_data,
            update_data,
        }
    }

    fn attempts(&self) -> usize {
        self.connector.attempts.load(Ordering::SeqCst)
    }
}

fn environment(name: &str) -> EnvironmentConfig {
    EnvironmentConfig {
        username: Some("app".to_string()),
        ..EnvironmentConfig::new(name, "localhost", "app")
    }
}

fn update_args() -> Value {
    json!({"table": "orders", "values": {"status": "shipped"}, "where": "id = 7"})
}

#[tokio::test]
async fn test_show_tables_in_prod_routes_to_list_tables() {
    let harness = Harness::new(RouterConfig::default());

    let outcome = harness.router.route(RouteRequest::new("show tables in prod")).await;

    let selected = outcome.plan.selected().unwrap();
    assert_eq!(selected.operation, "list_tables");
    assert!(selected.score.unwrap() > 0);
    assert!(outcome.result.success, "{:?}", outcome.result);
    assert_eq!(
        outcome.result.data.unwrap(),
        json!({"tool": "list_tables", "environment": "prod-db"})
    );
    assert_eq!(harness.list_tables.runs(), 1);
}

#[tokio::test]
async fn test_routing_is_deterministic() {
    let harness = Harness::new(RouterConfig::default());
    let request = RouteRequest::new("show the latest rows from orders in dev")
        .with_arguments(json!({"table": "orders"}));

    let first = harness.router.plan(&request);
    for _ in 0..5 {
        assert_eq!(harness.router.plan(&request), first);
    }

    let a = harness.router.route(request.clone()).await;
    let b = harness.router.route(request).await;
    assert_eq!(a, b);
    assert_eq!(a.plan.selected().unwrap().operation, "read_data");
}

#[tokio::test]
async fn test_only_registered_tools_are_candidates() {
    let harness = Harness::new(RouterConfig::default());
    let plan = harness.router.plan(&RouteRequest::new("list databases"));
    let names: Vec<_> = plan.candidates.iter().map(|c| c.operation.as_str()).collect();
    assert_eq!(names, vec!["read_data", "list_tables", "update_data"]);
}

#[tokio::test]
async fn test_no_match_refuses_to_guess() {
    let harness = Harness::with_operations(
        vec![
            OperationSpec::new("update_data", &[warden_router::Intent::DataWrite])
                .requires(&["table", "values", "where"])
                .mutating(),
        ],
        RouterConfig::default(),
    );

    let outcome = harness.router.route(RouteRequest::new("good morning")).await;

    assert_eq!(outcome.result.error, Some(ErrorCode::NoToolMatch));
    assert!(outcome.plan.selected().is_none());
    assert_eq!(harness.attempts(), 0);
    assert_eq!(harness.update_data.runs(), 0);
}

#[tokio::test]
async fn test_missing_arguments_gate() {
    let harness = Harness::new(RouterConfig::default());

    let outcome = harness
        .router
        .route(
            RouteRequest::new("update the orders")
                .with_arguments(json!({"table": "orders"}))
                .confirmed(),
        )
        .await;

    assert_eq!(outcome.result.error, Some(ErrorCode::MissingArguments));
    assert_eq!(
        outcome.result.details.unwrap()["missing"],
        json!(["values", "where"])
    );
    assert_eq!(harness.update_data.runs(), 0);
    assert_eq!(harness.attempts(), 0);
}

#[tokio::test]
async fn test_confirmation_gate_then_pass_through() {
    let harness = Harness::new(RouterConfig::default());
    let request = RouteRequest::new("update orders in staging").with_arguments(update_args());

    let pending = harness.router.route(request.clone()).await;
    assert_eq!(pending.result.error, Some(ErrorCode::ConfirmationRequired));
    assert!(pending.result.hint.unwrap().contains("confirm_intent"));
    assert_eq!(harness.update_data.runs(), 0);

    // staging requires approval; confirm_intent also satisfies it.
    let done = harness.router.route(request.confirmed()).await;
    assert!(done.result.success, "{:?}", done.result);
    assert_eq!(done.result.data.unwrap()["environment"], json!("staging"));
    assert_eq!(harness.update_data.runs(), 1);
}

#[tokio::test]
async fn test_confirmation_not_required_when_disabled() {
    let harness = Harness::new(RouterConfig {
        allow_mutations: true,
        require_confirmation: false,
    });

    let outcome = harness
        .router
        .route(RouteRequest::new("update orders in dev").with_arguments(update_args()))
        .await;
    assert!(outcome.result.success);
    assert_eq!(harness.update_data.runs(), 1);
}

#[tokio::test]
async fn test_enforcer_policy_still_applies() {
    let harness = Harness::new(RouterConfig::default());

    let outcome = harness
        .router
        .route(
            RouteRequest::new("update orders in production")
                .with_arguments(update_args())
                .confirmed(),
        )
        .await;

    assert_eq!(outcome.plan.environment.as_ref().unwrap().name, "prod-db");
    assert_eq!(outcome.result.error, Some(ErrorCode::EnvironmentReadonly));
    assert_eq!(harness.update_data.runs(), 0);
    assert_eq!(harness.attempts(), 0);
}

#[tokio::test]
async fn test_mutations_disabled_never_selects_writes() {
    let harness = Harness::new(RouterConfig {
        allow_mutations: false,
        require_confirmation: true,
    });

    let plan = harness
        .router
        .plan(&RouteRequest::new("update orders").with_arguments(update_args()));

    let update = plan
        .candidates
        .iter()
        .find(|c| c.operation == "update_data")
        .unwrap();
    assert_eq!(update.score, None);
    assert_ne!(plan.selected().unwrap().operation, "update_data");
}

#[tokio::test]
async fn test_operation_failure_is_wrapped() {
    let harness = Harness::new(RouterConfig::default());

    let outcome = harness
        .router
        .route(
            RouteRequest::new("show rows")
                .with_arguments(json!({"table": "orders", "explode": true})),
        )
        .await;

    assert_eq!(outcome.result.error, Some(ErrorCode::RoutedToolFailed));
    let details = outcome.result.details.unwrap();
    assert_eq!(details["operation"], json!("read_data"));
    assert_eq!(details["cause"], json!("TOOL_FAILED"));
    assert_eq!(harness.read_data.runs(), 1);
}

#[tokio::test]
async fn test_non_string_environment_argument_is_refused() {
    let harness = Harness::new(RouterConfig::default());

    let outcome = harness
        .router
        .route(
            RouteRequest::new("show rows in prod-db")
                .with_arguments(json!({"table": "orders", "environment": {"name": "dev"}})),
        )
        .await;

    assert_eq!(outcome.plan.environment, None);
    assert_eq!(outcome.result.error, Some(ErrorCode::InvalidArguments));
    assert_eq!(harness.read_data.runs(), 0);
    assert_eq!(harness.attempts(), 0);
}
