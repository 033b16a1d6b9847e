//! Endpoint groups of the Strava API.

pub mod activities;
pub mod athletes;
pub mod streams;

pub use activities::ActivitiesApi;
pub use athletes::AthletesApi;
pub use streams::StreamsApi;
