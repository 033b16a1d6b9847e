//! Transport layer for the Strava SDK.

pub mod http;

pub use http::HttpTransport;
