// Start of file: /src/models/mod.rs

/*
    * Domain models shared by the handlers, the store and the providers:
    * tenant identity, properties and revenue summaries.
*/

pub mod identity;
pub mod property;
pub mod revenue;

pub use identity::{CallerIdentity, Principal, TenantId};
pub use property::Property;
pub use revenue::{DashboardSummary, RevenueSummary};

// End of file: /src/models/mod.rs
