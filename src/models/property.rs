use serde::{Deserialize, Serialize};

/// A property owned by a tenant, as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Property {
    pub id: String,
    pub name: String,
}

impl Property {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
