//! Minimal Mattermost REST client (channel listing only).

use reqwest::header::IF_NONE_MATCH;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

const CHANNELS_PATH: &str = "/api/v4/channels";

fn user_agent() -> String {
    format!("mm-channel-stats/{}", crate::config::version())
}

/// One channel as returned by the platform's "list all channels" endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiChannel {
    pub id: String,
    pub team_id: String,
    pub team_display_name: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    pub display_name: String,
    pub header: String,
    pub purpose: String,
    pub update_at: i64,
    pub last_post_at: i64,
    pub total_msg_count: i64,
    pub total_msg_count_root: i64,
}

/// A single page together with the HTTP status it arrived with.
#[derive(Debug, Clone, Default)]
pub struct ChannelPage {
    pub status: u16,
    pub channels: Vec<ApiChannel>,
}

/// Anything able to serve paginated channel listings.
#[allow(async_fn_in_trait)]
pub trait ChannelSource {
    async fn get_all_channels(&self, page: u32, per_page: u32, etag: &str) -> Result<ChannelPage>;
}

#[derive(Debug, Clone)]
pub struct MattermostClient {
    http: Client,
    base_url: String,
    token: String,
}

impl MattermostClient {
    /// Create a client for `base_url` (e.g. `https://chat.example.com:443`).
    pub fn new<S1: Into<String>, S2: Into<String>>(base_url: S1, token: S2) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent())
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ChannelSource for MattermostClient {
    async fn get_all_channels(&self, page: u32, per_page: u32, etag: &str) -> Result<ChannelPage> {
        let url = format!("{}{}", self.base_url, CHANNELS_PATH);

        let mut request = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("include_deleted", "false".to_string()),
            ]);
        if !etag.is_empty() {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(page, status = status.as_u16(), "GetAllChannels response");

        if !status.is_success() {
            return Ok(ChannelPage {
                status: status.as_u16(),
                channels: Vec::new(),
            });
        }

        let body = response.text().await?;
        let channels: Vec<ApiChannel> = serde_json::from_str(&body)?;

        Ok(ChannelPage {
            status: status.as_u16(),
            channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn api_channel_deserializes_platform_payload() {
        let payload = serde_json::json!({
            "id": "ch1",
            "create_at": 1,
            "update_at": 1_700_000_000_000_i64,
            "delete_at": 0,
            "team_id": "t1",
            "type": "O",
            "display_name": "Town Square",
            "name": "town-square",
            "header": "",
            "purpose": "General chat",
            "last_post_at": 1_700_000_100_000_i64,
            "total_msg_count": 42,
            "total_msg_count_root": 30,
            "team_display_name": "Engineering",
            "team_name": "eng"
        });

        let channel: ApiChannel = serde_json::from_value(payload).unwrap();
        assert_eq!(channel.id, "ch1");
        assert_eq!(channel.channel_type, "O");
        assert_eq!(channel.team_display_name, "Engineering");
        assert_eq!(channel.total_msg_count, 42);
        assert_eq!(channel.total_msg_count_root, 30);
        assert!(channel.header.is_empty());
    }

    #[test]
    fn api_channel_tolerates_missing_fields() {
        let channel: ApiChannel = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert_eq!(channel.id, "x");
        assert_eq!(channel.update_at, 0);
        assert!(channel.display_name.is_empty());
    }

    #[test]
    fn new_trims_trailing_slash() {
        let client = MattermostClient::new("http://localhost:8065/", "tok").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8065");
    }

    #[tokio::test]
    async fn get_all_channels_sends_pagination_and_auth() {
        let server = MockServer::start_async().await;

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/channels")
                .query_param("page", "3")
                .query_param("per_page", "50")
                .query_param("include_deleted", "false")
                .header("authorization", "Bearer secret");
            then.status(200).json_body(serde_json::json!([
                { "id": "a", "display_name": "Alpha" },
                { "id": "b", "display_name": "Beta" }
            ]));
        });

        let client = MattermostClient::new(server.base_url(), "secret").unwrap();
        let page = client.get_all_channels(3, 50, "").await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.channels.len(), 2);
        assert_eq!(page.channels[1].display_name, "Beta");
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn user_agent_reports_cli_version() {
        let server = MockServer::start_async().await;
        let expected = format!("mm-channel-stats/{}", crate::config::version());

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/channels")
                .header("user-agent", expected.as_str());
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = MattermostClient::new(server.base_url(), "tok").unwrap();
        client.get_all_channels(0, 50, "").await.unwrap();
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn get_all_channels_forwards_etag() {
        let server = MockServer::start_async().await;

        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v4/channels")
                .header("if-none-match", "abc");
            then.status(200).json_body(serde_json::json!([]));
        });

        let client = MattermostClient::new(server.base_url(), "secret").unwrap();
        let page = client.get_all_channels(0, 50, "abc").await.unwrap();

        assert!(page.channels.is_empty());
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn get_all_channels_reports_error_status_without_decoding() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/v4/channels");
            then.status(401).body("not json");
        });

        let client = MattermostClient::new(server.base_url(), "bad").unwrap();
        let page = client.get_all_channels(0, 50, "").await.unwrap();

        assert_eq!(page.status, 401);
        assert!(page.channels.is_empty());
    }

    #[tokio::test]
    async fn get_all_channels_rejects_malformed_body() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(GET).path("/api/v4/channels");
            then.status(200).body("{not json");
        });

        let client = MattermostClient::new(server.base_url(), "tok").unwrap();
        let err = client.get_all_channels(0, 50, "").await.unwrap_err();
        assert!(matches!(err, Error::SerializationError(_)));
    }

    #[tokio::test]
    async fn get_all_channels_surfaces_transport_failure() {
        // Nothing listens on port 1.
        let client = MattermostClient::new("http://127.0.0.1:1", "tok").unwrap();
        let err = client.get_all_channels(0, 50, "").await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
