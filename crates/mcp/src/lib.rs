//! MCP server exposing the Strava API as tools for AI agents.
//!
//! Tools are registered in a [`tools::ToolRegistry`], served over newline
//! delimited JSON-RPC on stdio or over HTTP by [`McpServer`], and talk to
//! Strava through any [`strava_mcp_core::StravaApi`] implementation.

pub mod analysis;
pub mod config;
pub mod protocol;
pub mod server;
pub mod services;
pub mod tools;

pub use server::McpServer;
