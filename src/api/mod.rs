// HTTP surface: route groups and request middleware

pub mod dashboard;
pub mod middleware;
pub mod status;
