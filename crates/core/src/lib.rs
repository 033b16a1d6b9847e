// Core types and response shaping for the Strava MCP server

pub mod api;
pub mod models;
pub mod search;
pub mod shape;
pub mod types;

pub use api::{ApiError, ApiResult, StravaApi};
pub use models::*;
pub use types::*;
