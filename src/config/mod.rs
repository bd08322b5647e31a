// Start of file: /src/config/mod.rs

/*
* Re-export submodules related to configuration, environment variables,
* the static fallback table and app state.
*/

pub mod environment;
pub mod fallback;
pub mod state;

// End of file: /src/config/mod.rs
