// Start of file: /src/utils/mod.rs

/*
    * Re-exports for all utility modules like error handling,
    * the response envelope and its middleware.
*/

pub mod api_error;
pub mod error_handler;
pub mod response_handler;

pub use api_error::ApiError;

// End of file: /src/utils/mod.rs
