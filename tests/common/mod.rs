//! tests/common/mod.rs
//! Shared helpers: in-memory collaborators and a helper to spawn the app
//! on an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::{serve, Router};
use rust_decimal::Decimal;
use tokio::net::TcpListener as TokioTcpListener;
use uuid::Uuid;

use property_dashboard_api::api::middleware::auth::{extract_bearer_token, AuthError, Authenticator};
use property_dashboard_api::database::{PropertyStore, StoreError};
use property_dashboard_api::models::{Principal, Property, RevenueSummary, TenantId};
use property_dashboard_api::services::{ProviderError, RevenueSummaryProvider};
use property_dashboard_api::{create_app, AppState, EnvironmentVariables};

pub const TENANT_A_TOKEN: &str = "token-tenant-a";
pub const TENANT_B_TOKEN: &str = "token-tenant-b";
pub const T1_TOKEN: &str = "token-t1";
pub const UNKNOWN_TENANT_TOKEN: &str = "token-unknown-tenant";
pub const NO_TENANT_TOKEN: &str = "token-no-tenant";

/// Bearer tokens mapped to fixed principals
pub struct StaticAuthenticator {
    sessions: HashMap<String, Principal>,
}

impl StaticAuthenticator {
    pub fn standard() -> Self {
        let mut sessions: HashMap<String, Principal> = HashMap::new();
        for (token, tenant) in [
            (TENANT_A_TOKEN, Some("tenant-a")),
            (TENANT_B_TOKEN, Some("tenant-b")),
            (T1_TOKEN, Some("t1")),
            (UNKNOWN_TENANT_TOKEN, Some("tenant-z")),
            (NO_TENANT_TOKEN, None),
        ] {
            sessions.insert(
                token.to_string(),
                Principal {
                    user_id: Uuid::new_v4(),
                    tenant_id: tenant.map(str::to_string),
                },
            );
        }
        Self { sessions }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AuthError> {
        let token: &str = extract_bearer_token(headers)?;
        self.sessions
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Healthy,
    Unavailable,
    BrokenQuery,
    // Answers correctly, but only after `SLOW_STORE_DELAY`
    Slow,
}

pub const SLOW_STORE_DELAY: std::time::Duration = std::time::Duration::from_secs(3);

/// Property store over a fixed row set, with a switchable failure mode
pub struct InMemoryPropertyStore {
    rows: Vec<(String, Property)>,
    mode: StoreMode,
    pub calls: AtomicUsize,
}

impl InMemoryPropertyStore {
    pub fn new(mode: StoreMode) -> Self {
        let rows: Vec<(String, Property)> = vec![
            ("t1".to_string(), Property::new("p2", "Zeta")),
            ("t1".to_string(), Property::new("p1", "Alpha")),
            ("t2".to_string(), Property::new("p9", "Bravo")),
            ("tenant-a".to_string(), Property::new("prop-100", "Harbor View")),
        ];
        Self {
            rows,
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PropertyStore for InMemoryPropertyStore {
    async fn list_properties(&self, tenant_id: &TenantId) -> Result<Vec<Property>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.mode {
            StoreMode::Unavailable => Err(StoreError::Unavailable("connection refused".into())),
            StoreMode::BrokenQuery => Err(StoreError::Query("column \"nme\" does not exist".into())),
            StoreMode::Slow => {
                tokio::time::sleep(SLOW_STORE_DELAY).await;
                Ok(Vec::new())
            }
            StoreMode::Healthy => {
                let mut properties: Vec<Property> = self
                    .rows
                    .iter()
                    .filter(|(tenant, _)| tenant == tenant_id.as_str())
                    .map(|(_, property)| property.clone())
                    .collect();
                properties.sort_by(|a, b| a.name.cmp(&b.name));
                Ok(properties)
            }
        }
    }
}

/// Revenue provider over fixed per-tenant summaries
pub struct InMemoryRevenueProvider {
    summaries: HashMap<(String, String), RevenueSummary>,
    unavailable: bool,
    pub calls: AtomicUsize,
}

impl InMemoryRevenueProvider {
    pub fn new() -> Self {
        let mut summaries: HashMap<(String, String), RevenueSummary> = HashMap::new();
        summaries.insert(
            ("tenant-a".to_string(), "prop-001".to_string()),
            RevenueSummary {
                property_id: "prop-001".to_string(),
                total: Decimal::new(245075, 2),
                currency: "USD".to_string(),
                count: 7,
            },
        );
        Self {
            summaries,
            unavailable: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RevenueSummaryProvider for InMemoryRevenueProvider {
    async fn get_revenue_summary(
        &self,
        property_id: &str,
        tenant_id: &TenantId,
    ) -> Result<RevenueSummary, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable {
            return Err(ProviderError::Unavailable("cache and database unreachable".into()));
        }

        self.summaries
            .get(&(tenant_id.as_str().to_string(), property_id.to_string()))
            .cloned()
            .ok_or_else(|| ProviderError::PropertyNotFound {
                property_id: property_id.to_string(),
            })
    }
}

/// Handles to the doubles wired into a spawned app
pub struct TestApp {
    pub base_url: String,
    pub store: Arc<InMemoryPropertyStore>,
    pub revenue: Arc<InMemoryRevenueProvider>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Spawns the app with default configuration
pub fn spawn_app(store: InMemoryPropertyStore, revenue: InMemoryRevenueProvider) -> TestApp {
    spawn_app_with_env(EnvironmentVariables::default(), store, revenue)
}

/// Spawns the app on a random unused port and returns its handles.
pub fn spawn_app_with_env(
    env: EnvironmentVariables,
    store: InMemoryPropertyStore,
    revenue: InMemoryRevenueProvider,
) -> TestApp {
    let store: Arc<InMemoryPropertyStore> = Arc::new(store);
    let revenue: Arc<InMemoryRevenueProvider> = Arc::new(revenue);

    let state: AppState = AppState::new(Arc::new(env))
        .expect("Failed to build app state")
        .with_authenticator(Arc::new(StaticAuthenticator::standard()))
        .with_property_store(store.clone())
        .with_revenue_provider(revenue.clone());

    // * Build the application using the same layers as main().
    let app: Router = create_app(state);

    // * Bind an ephemeral port using std::net::TcpListener.
    let std_listener: std::net::TcpListener = std::net::TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    std_listener.set_nonblocking(true).unwrap();

    // * Convert std::net::TcpListener to tokio::net::TcpListener.
    let tokio_listener: TokioTcpListener = TokioTcpListener::from_std(std_listener)
        .expect("Failed to convert to tokio listener");

    let addr: std::net::SocketAddr = tokio_listener.local_addr().unwrap();

    // * Spawn the server in a background task.
    tokio::spawn(async move {
        serve(tokio_listener, app)
            .await
            .expect("Server failed");
    });

    TestApp {
        base_url: format!("http://{}", addr),
        store,
        revenue,
    }
}

/// GET `path` with an optional bearer token, returning status and JSON body
pub async fn get_json(app: &TestApp, path: &str, token: Option<&str>) -> (reqwest::StatusCode, serde_json::Value) {
    let mut request: reqwest::RequestBuilder = reqwest::Client::new().get(app.url(path));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let resp: reqwest::Response = request.send().await.expect("Failed to execute request.");
    let status: reqwest::StatusCode = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Response was not JSON");
    (status, body)
}
