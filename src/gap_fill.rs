use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use log::debug;

use crate::aggregate::{daily_totals, latest_stop};
use crate::error::RoundingError;
use crate::time_entry::{EntryMetadata, TimeEntry};

/// 1日の目標時間(秒)。
pub const DEFAULT_TARGET_SECONDS: i64 = 8 * 60 * 60;

/// 穴埋め用エントリーに付与する固定の情報。
#[derive(Clone, Debug, PartialEq)]
pub struct FillerTemplate {
    pub workspace_id: i64,
    pub project_id: i64,
    pub description: String,
}

impl FillerTemplate {
    fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            workspace_id: Some(self.workspace_id),
            project_id: Some(self.project_id),
            ..Default::default()
        }
    }
}

/// 日毎の合計時間が目標に満たない日について、穴埋め用エントリーを作成する。
///
/// 穴埋め用エントリーはその日の最も遅い終了時刻から不足時間分とし、
/// 取得したエントリーと同じく15分単位に丸める。そのため穴埋めされる時間は
/// 不足時間と一致しない場合がある。
///
/// # Arguments
///
/// * `totals` - 日毎の合計時間(秒)
/// * `entries` - 起点となる終了時刻を探すtime entry
/// * `target_seconds` - 1日の目標時間(秒)
/// * `template` - 穴埋め用エントリーの固定情報
///
/// # Errors
///
/// 不足がある日に終了したエントリーがない場合は`RoundingError::NoAnchor`を返す。
/// 終了時刻が日時の範囲を超える場合は`RoundingError::OutOfRange`を返す。
pub fn fill_day_gaps(
    totals: &BTreeMap<NaiveDate, i64>,
    entries: &[TimeEntry],
    target_seconds: i64,
    template: &FillerTemplate,
) -> Result<Vec<TimeEntry>, RoundingError> {
    totals
        .iter()
        .filter(|(_, total)| **total < target_seconds)
        .map(|(date, total)| {
            let shortfall = target_seconds
                .checked_sub(*total)
                .ok_or(RoundingError::OutOfRange {
                    date: *date,
                    shortfall: target_seconds,
                })?;
            let anchor =
                latest_stop(*date, entries).ok_or(RoundingError::NoAnchor { date: *date })?;
            debug!(
                "{}: total {}s, shortfall {}s, anchor {}",
                date, total, shortfall, anchor
            );

            let stop = Duration::try_seconds(shortfall)
                .and_then(|shortfall| anchor.checked_add_signed(shortfall))
                .ok_or(RoundingError::OutOfRange {
                    date: *date,
                    shortfall,
                })?;

            Ok(TimeEntry::from_instants(
                anchor,
                Some(stop),
                template.description.clone(),
                vec![],
                template.metadata(),
            ))
        })
        .collect()
}

/// time entryを日毎に集計し、目標に満たない日の穴埋め用エントリーを作成する。
///
/// 作成するのは穴埋め用エントリーのみで、元のエントリーは含まない。
pub fn fill_gaps(
    entries: &[TimeEntry],
    target_seconds: i64,
    template: &FillerTemplate,
) -> Result<Vec<TimeEntry>, RoundingError> {
    fill_day_gaps(&daily_totals(entries), entries, target_seconds, template)
}
