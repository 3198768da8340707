use anyhow::{bail, Context, Result};
use log::{error, info};

use crate::datetime::days_back_range;
use crate::gap_fill::{fill_gaps, FillerTemplate, DEFAULT_TARGET_SECONDS};
use crate::time_entry::TimeEntry;
use crate::toggl::{read_normalized_time_entries, TogglRepository};

/// `fill`サブコマンドの引数。
#[derive(Debug, clap::Args)]
pub struct FillArgs {
    #[clap(
        default_value_t = 1,
        help = "Number of days from today to process time entries"
    )]
    days: i64,

    #[clap(long = "workspace-id", help = "Workspace id of the filler entries")]
    workspace_id: i64,

    #[clap(long = "project-id", help = "Project id of the filler entries")]
    project_id: i64,

    #[clap(
        long = "description",
        default_value = "Admin",
        help = "Description of the filler entries"
    )]
    description: String,

    #[clap(
        long = "target-hours",
        help = "Hours each day should add up to, as H or H:MM up to 24:00 [default: 8]",
        parse(try_from_str = parse_target_hours),
    )]
    target_seconds: Option<i64>,

    #[clap(
        long = "strict",
        help = "Fail on malformed timestamps instead of skipping them"
    )]
    strict: bool,

    #[clap(long = "dry-run", help = "Show filler entries without creating them")]
    pub dry_run: bool,
}

impl FillArgs {
    fn target_seconds(&self) -> i64 {
        self.target_seconds.unwrap_or(DEFAULT_TARGET_SECONDS)
    }

    fn template(&self) -> FillerTemplate {
        FillerTemplate {
            workspace_id: self.workspace_id,
            project_id: self.project_id,
            description: self.description.clone(),
        }
    }
}

/// 1日の目標時間の上限(秒)。
const MAX_TARGET_SECONDS: i64 = 24 * 60 * 60;

/// `H`または`H:MM`形式の目標時間をパースし、秒で返す。
///
/// 24時間を超える値はエラーとする。
fn parse_target_hours(s: &str) -> Result<i64> {
    let (hours, minutes) = s.split_once(':').unwrap_or((s, "0"));
    let hours = hours
        .parse::<i64>()
        .with_context(|| format!("Failed to parse hours: {}", s))?;
    let minutes = minutes
        .parse::<i64>()
        .with_context(|| format!("Failed to parse minutes: {}", s))?;
    if !(0..60).contains(&minutes) {
        bail!("Minutes must be between 0 and 59: {}", s);
    }

    let seconds = hours
        .checked_mul(3600)
        .and_then(|seconds| seconds.checked_add(minutes * 60))
        .filter(|seconds| (0..=MAX_TARGET_SECONDS).contains(seconds))
        .with_context(|| format!("Target must be between 0:00 and 24:00: {}", s))?;

    Ok(seconds)
}

/// 目標時間に満たない日を穴埋め用エントリーで埋めるサブコマンド。
pub struct FillCommand<'a, T: TogglRepository> {
    toggl_client: &'a T,
}

impl<'a, T: TogglRepository> FillCommand<'a, T> {
    /// 新しい`FillCommand`を返す。
    ///
    /// # Arguments
    /// * `toggl_client` - Toggl APIと通信するためのリポジトリ
    pub fn new(toggl_client: &'a T) -> Self {
        Self { toggl_client }
    }

    /// `fill`サブコマンドの処理を行う。
    ///
    /// 対象期間のtime entryを丸めて日毎に集計し、目標時間に満たない日の
    /// 穴埋め用エントリーを作成する。起点となる終了時刻がない日があればエラーとし、
    /// 何も作成しない。
    ///
    /// 起点は丸めた終了時刻のため、元のエントリーは`round`サブコマンドで
    /// 先に更新しておく。そうしないと穴埋め用エントリーが元のエントリーと
    /// 最大7分重なる。
    ///
    /// # Returns
    ///
    /// 穴埋め用エントリー
    pub async fn run(&self, args: &FillArgs) -> Result<Vec<TimeEntry>> {
        let (start_at, end_at) = days_back_range(args.days)?;
        info!("Getting time entries from {} to {}", start_at, end_at);

        let time_entries =
            read_normalized_time_entries(self.toggl_client, &start_at, &end_at, args.strict)
                .await
                .context("Failed to read time entries")?;

        let fillers = fill_gaps(&time_entries, args.target_seconds(), &args.template())
            .context("Failed to build filler entries")?;
        info!("{} days need filler entries", fillers.len());

        if args.dry_run {
            return Ok(fillers);
        }

        let mut created = 0;
        for filler in &fillers {
            match self.toggl_client.create_time_entry(filler).await {
                Ok(()) => created += 1,
                Err(err) => error!("Failed to create filler at {}: {:#}", filler.start(), err),
            }
        }
        info!("Created {} of {} filler entries", created, fillers.len());

        Ok(fillers)
    }
}
