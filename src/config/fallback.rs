// Static fallback property table used when the property store is unreachable

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::{Property, TenantId};

/// Read-only tenant → properties table, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct FallbackProperties {
    by_tenant: HashMap<String, Vec<Property>>,
}

impl FallbackProperties {
    /// The built-in table shipped with the service
    pub fn builtin() -> Self {
        Self::from_entries([
            ("tenant-a", vec![Property::new("prop-001", "Beach House Alpha")]),
            ("tenant-b", vec![Property::new("prop-001", "Mountain Lodge Beta")]),
        ])
    }

    /// Builds a table, sorting each tenant's list by name
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<Property>)>,
        K: Into<String>,
    {
        let by_tenant: HashMap<String, Vec<Property>> = entries
            .into_iter()
            .map(|(tenant, mut properties)| {
                properties.sort_by(|a, b| a.name.cmp(&b.name));
                (tenant.into(), properties)
            })
            .collect();

        Self { by_tenant }
    }

    /// Parses a JSON object of the form `{"tenant": [{"id": .., "name": ..}]}`
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, Vec<Property>> = serde_json::from_str(raw)
            .context("Fallback properties must be a JSON object of tenant -> [{id, name}]")?;
        Ok(Self::from_entries(parsed))
    }

    /// Loads the table from `path`, or the built-in table when no path is configured
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::builtin());
        };

        let raw: String = std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read fallback properties file '{path}'"))?;
        let table: Self = Self::from_json(&raw)
            .with_context(|| format!("Invalid fallback properties file '{path}'"))?;

        info!("Loaded fallback properties for {} tenants from {}", table.by_tenant.len(), path);
        Ok(table)
    }

    /// Properties for `tenant`, or an empty list for unknown tenants
    pub fn for_tenant(&self, tenant: &TenantId) -> Vec<Property> {
        self.by_tenant
            .get(tenant.as_str())
            .cloned()
            .unwrap_or_default()
    }
}
