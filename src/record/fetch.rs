use std::collections::HashSet;
use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::settings::PluginSettings;

use super::helpers::{
    decode_page, error_for_status, http_client, page_url, parse_endpoint, MAX_PAGES, PAGE_LIMIT,
};
use super::types::DailyRecord;

/// Anything that can produce daily records. The orchestrator only sees this
/// trait so tests can swap the network out.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetches records, newest-created first. With `since`, paging may stop
    /// once a page reaches records created before it.
    async fn fetch(&self, since: Option<i64>) -> SyncResult<Vec<DailyRecord>>;
}

pub struct HttpRecordFetcher {
    api: String,
    token: String,
    client: reqwest::Client,
}

impl HttpRecordFetcher {
    pub fn new(settings: &PluginSettings) -> SyncResult<Self> {
        Ok(Self {
            api: settings.daily_record_api.trim().to_string(),
            token: settings.daily_record_token.trim().to_string(),
            client: http_client()?,
        })
    }

    async fn fetch_page(&self, url: url::Url) -> SyncResult<Vec<DailyRecord>> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }
        decode_page(&body)
    }
}

#[async_trait]
impl RecordSource for HttpRecordFetcher {
    async fn fetch(&self, since: Option<i64>) -> SyncResult<Vec<DailyRecord>> {
        if self.api.is_empty() || self.token.is_empty() {
            return Err(SyncError::Config(
                "dailyRecordAPI and dailyRecordToken must both be set".to_string(),
            ));
        }
        let endpoint = parse_endpoint(&self.api)?;

        collect_pages(since, PAGE_LIMIT, MAX_PAGES, |offset| {
            self.fetch_page(page_url(&endpoint, offset))
        })
        .await
    }
}

/// Pages through `fetch_page(offset)` until a short page, a page ending
/// before `since`, or `max_pages`. Records repeated across pages keep their
/// first occurrence.
async fn collect_pages<F, Fut>(
    since: Option<i64>,
    page_limit: usize,
    max_pages: usize,
    mut fetch_page: F,
) -> SyncResult<Vec<DailyRecord>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = SyncResult<Vec<DailyRecord>>>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut exhausted = false;
    for page in 0..max_pages {
        let batch = fetch_page(page * page_limit).await?;
        let count = batch.len();
        let oldest_created = batch.last().map(|r| r.created_ts);
        debug!(page, count, "fetched record page");

        for record in batch {
            record.check_timestamps()?;
            // Offsets drift when memos are created mid-paging.
            if seen.insert(record.key()) {
                out.push(record);
            }
        }

        if count < page_limit {
            exhausted = true;
            break;
        }
        if let (Some(since), Some(oldest)) = (since, oldest_created) {
            if oldest < since {
                exhausted = true;
                break;
            }
        }
    }
    if !exhausted {
        warn!(max_pages, "stopped paging before the end of the record list");
    }

    Ok(out)
}
