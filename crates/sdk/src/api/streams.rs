//! Activity stream endpoints.

use crate::client::StravaClient;
use crate::error::StravaResult;
use serde::Deserialize;
use strava_mcp_core::types::{Stream, StreamResolution, StreamSet, StreamType};

/// Streams API for the raw time series of an activity.
pub struct StreamsApi<'a> {
    client: &'a StravaClient,
}

impl<'a> StreamsApi<'a> {
    pub(crate) fn new(client: &'a StravaClient) -> Self {
        Self { client }
    }

    /// Get the streams of an activity keyed by type.
    ///
    /// `None` for `types` requests every stream type.
    pub async fn get(
        &self,
        activity_id: u64,
        types: Option<&[StreamType]>,
        resolution: Option<StreamResolution>,
    ) -> StravaResult<StreamSet> {
        let params = stream_params(types, resolution);
        let response: StreamsResponse = self
            .client
            .http
            .get_with_query(&format!("activities/{}/streams", activity_id), &params)
            .await?;

        Ok(response.into_set())
    }
}

fn stream_params(
    types: Option<&[StreamType]>,
    resolution: Option<StreamResolution>,
) -> Vec<(&'static str, String)> {
    let keys = types
        .filter(|t| !t.is_empty())
        .unwrap_or(&StreamType::ALL)
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(",");

    let mut params = vec![("keys", keys), ("key_by_type", "true".to_string())];
    if let Some(resolution) = resolution {
        params.push(("resolution", resolution.as_str().to_string()));
    }
    params
}

/// The endpoint answers with a map when `key_by_type` is honored, and with a
/// list of typed streams otherwise (or when the activity has none).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StreamsResponse {
    Keyed(StreamSet),
    Listed(Vec<TypedStream>),
}

#[derive(Debug, Deserialize)]
struct TypedStream {
    #[serde(rename = "type")]
    stream_type: String,
    #[serde(flatten)]
    stream: Stream,
}

impl StreamsResponse {
    fn into_set(self) -> StreamSet {
        match self {
            StreamsResponse::Keyed(set) => set,
            StreamsResponse::Listed(list) => list
                .into_iter()
                .map(|s| (s.stream_type, s.stream))
                .collect(),
        }
    }
}
