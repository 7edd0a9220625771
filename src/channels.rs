//! Channel records and the paginated fetch that builds them.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::client::{ApiChannel, ChannelSource};
use crate::format::{format_timestamp, is_non_empty};
use crate::{Error, Result};

/// Channels requested per page.
pub const PAGE_SIZE: u32 = 50;

/// HTTP statuses treated as a successful listing.
///
/// 201 is accepted alongside 200 for parity with the classic tool, even
/// though a read-only listing should never create anything.
pub const ACCEPTED_STATUSES: [u16; 2] = [200, 201];

/// Summary statistics for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChannelRecord {
    pub channel_name: String,
    #[serde(rename = "ChannelID")]
    pub channel_id: String,
    #[serde(rename = "TeamID")]
    pub team_id: String,
    pub team_name: String,
    pub channel_type: String,
    pub last_update_date: String,
    pub last_post_date: String,
    pub total_message_count: i64,
    pub total_message_count_root: i64,
    pub has_header: bool,
    pub has_purpose: bool,
}

impl From<&ApiChannel> for ChannelRecord {
    fn from(channel: &ApiChannel) -> Self {
        Self {
            channel_name: channel.display_name.clone(),
            channel_id: channel.id.clone(),
            team_id: channel.team_id.clone(),
            team_name: channel.team_display_name.clone(),
            channel_type: channel.channel_type.clone(),
            last_update_date: format_timestamp(channel.update_at),
            last_post_date: format_timestamp(channel.last_post_at),
            total_message_count: channel.total_msg_count,
            total_message_count_root: channel.total_msg_count_root,
            has_header: is_non_empty(&channel.header),
            has_purpose: is_non_empty(&channel.purpose),
        }
    }
}

/// Walk every page of the channel listing until an empty page comes back.
///
/// Pages are requested one at a time starting from zero. Any transport
/// failure or a status outside [`ACCEPTED_STATUSES`] aborts the whole fetch
/// and nothing collected so far is returned.
pub async fn fetch_all_channels<S: ChannelSource>(
    source: &S,
    page_size: u32,
) -> Result<Vec<ChannelRecord>> {
    debug!("Getting channel stats");

    let etag = "";
    let mut records = Vec::new();
    let mut page = 0;

    loop {
        let response = source
            .get_all_channels(page, page_size, etag)
            .await
            .inspect_err(|e| error!(page, error = %e, "Failed to retrieve channels"))?;

        if !ACCEPTED_STATUSES.contains(&response.status) {
            error!(
                page,
                status = response.status,
                "GetAllChannels returned bad HTTP response"
            );
            return Err(Error::UnexpectedStatus(response.status));
        }

        if response.channels.is_empty() {
            break;
        }

        debug!(page, count = response.channels.len(), "Fetched channel page");
        records.extend(response.channels.iter().map(ChannelRecord::from));
        page += 1;
    }

    info!(channels = records.len(), pages = page, "Channel fetch complete");
    Ok(records)
}
