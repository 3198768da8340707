use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use log::{debug, info, warn};
#[cfg(test)]
use mockall::automock;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Serialize;

use crate::config::TogglConfig;
use crate::time_entry::{normalize, RawTimeEntry, TimeEntry, Timing};

/// Toggl APIへ作成元として通知するクライアント名。
const CREATED_WITH: &str = "toggl-rounder";

/// Toggl APIへ送信するタイムエントリー。
#[derive(Debug, PartialEq, Serialize)]
struct TogglTimeEntryPayload {
    created_with: &'static str,
    description: String,
    start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<i64>,
    tags: Vec<String>,
    workspace_id: Option<i64>,
    project_id: Option<i64>,
    task_id: Option<i64>,
    user_id: Option<i64>,
    billable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_ids: Option<Vec<i64>>,
}

/// タイムエントリーを送信用の形式に変換する。
///
/// 計測中のエントリーは`stop`と`duration`を含めない。
fn to_payload(entry: &TimeEntry) -> TogglTimeEntryPayload {
    let timestamp = |dt: DateTime<FixedOffset>| dt.to_rfc3339_opts(SecondsFormat::Secs, true);
    let (start, stop, duration) = match entry.timing {
        Timing::Running { start } => (timestamp(start), None, None),
        Timing::Stopped { start, stop } => (
            timestamp(start),
            Some(timestamp(stop)),
            entry.timing.duration(),
        ),
    };

    TogglTimeEntryPayload {
        created_with: CREATED_WITH,
        description: entry.description.clone(),
        start,
        stop,
        duration,
        tags: entry.tags.clone(),
        workspace_id: entry.metadata.workspace_id,
        project_id: entry.metadata.project_id,
        task_id: entry.metadata.task_id,
        user_id: entry.metadata.user_id,
        billable: entry.metadata.billable,
        tag_ids: entry.metadata.tag_ids.clone(),
    }
}

/// Toggl APIとのやり取りを表すtrait。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TogglRepository {
    /// 指定された期間のタイムエントリーを取得する。
    ///
    /// # Arguments
    ///
    /// * `start_at` - 取得するタイムエントリーの開始日時
    /// * `end_at` - 取得するタイムエントリーの終了日時
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<RawTimeEntry>>;

    /// 既存のタイムエントリーを更新する。
    async fn update_time_entry(&self, entry: &TimeEntry) -> Result<()>;

    /// 新しいタイムエントリーを作成する。
    async fn create_time_entry(&self, entry: &TimeEntry) -> Result<()>;
}

/// 指定された期間のタイムエントリーを取得し、正規化する。
///
/// 時刻をパースできないエントリーは警告を出して読み飛ばす。
/// `strict`の場合は読み飛ばさずにエラーを返す。
pub async fn read_normalized_time_entries<T: TogglRepository + ?Sized>(
    repository: &T,
    start_at: &DateTime<Utc>,
    end_at: &DateTime<Utc>,
    strict: bool,
) -> Result<Vec<TimeEntry>> {
    let raw_entries = repository
        .read_time_entries(start_at, end_at)
        .await
        .context("Failed to retrieve time entries")?;

    if strict {
        return normalize(&raw_entries).context("Failed to normalize time entries");
    }

    let time_entries = raw_entries
        .iter()
        .filter_map(|raw| match TimeEntry::from_raw(raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skip time entry {:?}: {}", raw.id, err);
                None
            }
        })
        .collect::<Vec<_>>();
    info!(
        "Normalized {} of {} time entries",
        time_entries.len(),
        raw_entries.len()
    );

    Ok(time_entries)
}

/// Toggl APIと通信するためのクライアント。
///
/// リクエストは1回のみ行い、リトライはしない。
///
/// # Examples
///
/// ```
/// let client = TogglClient::new(TogglConfig::new(DEFAULT_API_URL, &api_token));
/// let time_entries = client.read_time_entries(&start_at, &end_at).await.unwrap();
/// ```
pub struct TogglClient {
    client: Client,
    config: TogglConfig,
}

impl TogglClient {
    /// 新しい`TogglClient`を返す。
    pub fn new(config: TogglConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl TogglRepository for TogglClient {
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<RawTimeEntry>> {
        let time_entries = self
            .client
            .get(format!("{}/me/time_entries", self.config.api_url))
            .basic_auth(&self.config.api_token, Some("api_token"))
            .header(CONTENT_TYPE, "application/json")
            .query(&[
                ("start_date", start_at.to_rfc3339()),
                ("end_date", end_at.to_rfc3339()),
            ])
            .send()
            .await
            .with_context(|| {
                format!("Failed to send request to Toggl API at {}", self.config.api_url)
            })?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<Vec<RawTimeEntry>>()
            .await
            .context("Failed to deserialize response")?;
        info!("length of time entries: {}", time_entries.len());

        Ok(time_entries)
    }

    async fn update_time_entry(&self, entry: &TimeEntry) -> Result<()> {
        let workspace_id = entry
            .metadata
            .workspace_id
            .context("Time entry has no workspace id")?;
        let id = entry.metadata.id.context("Time entry has no id")?;
        let url = format!(
            "{}/workspaces/{}/time_entries/{}",
            self.config.api_url, workspace_id, id
        );
        debug!("PUT {}", url);

        self.client
            .put(&url)
            .basic_auth(&self.config.api_token, Some("api_token"))
            .header(CONTENT_TYPE, "application/json")
            .json(&to_payload(entry))
            .send()
            .await
            .with_context(|| format!("Failed to send request to Toggl API at {}", url))?
            .error_for_status()
            .with_context(|| format!("Failed to update time entry {}", id))?;

        Ok(())
    }

    async fn create_time_entry(&self, entry: &TimeEntry) -> Result<()> {
        let workspace_id = entry
            .metadata
            .workspace_id
            .context("Time entry has no workspace id")?;
        let url = format!(
            "{}/workspaces/{}/time_entries",
            self.config.api_url, workspace_id
        );
        debug!("POST {}", url);

        self.client
            .post(&url)
            .basic_auth(&self.config.api_token, Some("api_token"))
            .header(CONTENT_TYPE, "application/json")
            .json(&to_payload(entry))
            .send()
            .await
            .with_context(|| format!("Failed to send request to Toggl API at {}", url))?
            .error_for_status()
            .context("Failed to create time entry")?;

        Ok(())
    }
}
