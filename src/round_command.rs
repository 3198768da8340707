use anyhow::{Context, Result};
use log::{error, info, warn};

use crate::datetime::days_back_range;
use crate::time_entry::TimeEntry;
use crate::toggl::{read_normalized_time_entries, TogglRepository};

/// `round`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct RoundArgs {
    #[clap(
        default_value_t = 1,
        help = "Number of days from today to process time entries"
    )]
    days: i64,

    #[clap(
        long = "strict",
        help = "Fail on malformed timestamps instead of skipping them"
    )]
    strict: bool,

    #[clap(long = "dry-run", help = "Show rounded entries without updating Toggl")]
    pub dry_run: bool,
}

/// 取得したtime entryを15分単位に丸めて更新するサブコマンド。
pub struct RoundCommand<'a, T: TogglRepository> {
    toggl_client: &'a T,
}

impl<'a, T: TogglRepository> RoundCommand<'a, T> {
    /// 新しい`RoundCommand`を返す。
    ///
    /// # Arguments
    /// * `toggl_client` - Toggl APIと通信するためのリポジトリ
    pub fn new(toggl_client: &'a T) -> Self {
        Self { toggl_client }
    }

    /// `round`サブコマンドの処理を行う。
    ///
    /// `days`日前の00:00:00(UTC)から現在までのtime entryを取得して丸め、1件ずつ更新する。
    /// 更新に失敗したエントリーはログに残して次のエントリーの処理を続ける。
    /// `dry_run`の場合は更新しない。
    ///
    /// # Returns
    ///
    /// 丸めたtime entry
    pub async fn run(&self, args: &RoundArgs) -> Result<Vec<TimeEntry>> {
        let (start_at, end_at) = days_back_range(args.days)?;
        info!("Getting time entries from {} to {}", start_at, end_at);

        let time_entries =
            read_normalized_time_entries(self.toggl_client, &start_at, &end_at, args.strict)
                .await
                .context("Failed to read time entries")?;

        if args.dry_run {
            info!("Dry run, {} time entries are not updated", time_entries.len());
            return Ok(time_entries);
        }

        let mut updated = 0;
        for entry in &time_entries {
            if entry.metadata.id.is_none() || entry.metadata.workspace_id.is_none() {
                warn!("Skip time entry without id: {:?}", entry);
                continue;
            }
            match self.toggl_client.update_time_entry(entry).await {
                Ok(()) => updated += 1,
                Err(err) => error!(
                    "Failed to update time entry {:?}: {:#}",
                    entry.metadata.id, err
                ),
            }
        }
        info!("Updated {} of {} time entries", updated, time_entries.len());

        Ok(time_entries)
    }
}
