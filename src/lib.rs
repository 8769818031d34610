pub mod api;
pub mod config;
pub mod diff;
pub mod error;
pub mod github;
pub mod simulation;
pub mod state;
pub mod store;

pub use error::MockServerError;
