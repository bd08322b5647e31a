// Tenant-scoped caller identity

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Returned when a principal has no usable tenant association.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No tenant context available")]
pub struct MissingTenant;

/// Tenant identifier exactly as the session carries it. Never empty or
/// whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Rejects blank identifiers; anything else is kept unchanged
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, MissingTenant> {
        let raw: &str = raw.as_ref();
        if raw.trim().is_empty() {
            return Err(MissingTenant);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = MissingTenant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TenantId::parse(value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

/// What an authenticator knows about a request: who is calling and,
/// if the session carries one, which tenant they act for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// An authenticated caller with a validated tenant. Handlers only ever
/// see this type, so the tenant is mandatory at the handler boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: Uuid,
    pub tenant_id: TenantId,
}

impl TryFrom<Principal> for CallerIdentity {
    type Error = MissingTenant;

    fn try_from(principal: Principal) -> Result<Self, Self::Error> {
        let tenant_id: TenantId = principal
            .tenant_id
            .as_deref()
            .ok_or(MissingTenant)
            .and_then(TenantId::parse)?;

        Ok(Self {
            user_id: principal.user_id,
            tenant_id,
        })
    }
}
