use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;

use crate::error::RoundingError;
use crate::rounding::{normalize_instant, normalize_timestamp};

/// Toggl APIから取得したままのタイムエントリー。
///
/// `start`以外は欠けていても受け付け、未知のフィールドは無視する。
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawTimeEntry {
    pub id: Option<i64>,
    pub workspace_id: Option<i64>,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub user_id: Option<i64>,
    pub billable: Option<bool>,
    pub description: Option<String>,
    pub start: String,
    pub stop: Option<String>,
    pub tags: Option<Vec<String>>,
    pub tag_ids: Option<Vec<i64>>,
}

/// 検証せずにそのまま引き継ぐ識別子などの情報。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryMetadata {
    pub id: Option<i64>,
    pub workspace_id: Option<i64>,
    pub project_id: Option<i64>,
    pub task_id: Option<i64>,
    pub user_id: Option<i64>,
    pub billable: Option<bool>,
    pub tag_ids: Option<Vec<i64>>,
}

/// タイムエントリーの計測状態。
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Timing {
    /// 計測中で終了時刻がない。
    Running { start: DateTime<FixedOffset> },
    /// 計測が終了している。
    Stopped {
        start: DateTime<FixedOffset>,
        stop: DateTime<FixedOffset>,
    },
}

impl Timing {
    pub fn start(&self) -> DateTime<FixedOffset> {
        match self {
            Timing::Running { start } | Timing::Stopped { start, .. } => *start,
        }
    }

    pub fn stop(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Timing::Running { .. } => None,
            Timing::Stopped { stop, .. } => Some(*stop),
        }
    }

    /// 終了時刻と開始時刻の差(秒)。計測中の場合は`None`。
    ///
    /// 丸めによって開始と終了が逆転した場合は負の値になる。
    pub fn duration(&self) -> Option<i64> {
        match self {
            Timing::Running { .. } => None,
            Timing::Stopped { start, stop } => Some((*stop - *start).num_seconds()),
        }
    }
}

/// 開始・終了時刻を15分単位に丸めたタイムエントリー。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub timing: Timing,
    pub description: String,
    pub tags: Vec<String>,
    pub metadata: EntryMetadata,
}

impl TimeEntry {
    /// 日時から新しい`TimeEntry`を返す。
    ///
    /// 開始・終了時刻はそれぞれ独立に秒以下を切り捨ててから15分単位に丸める。
    ///
    /// # Arguments
    ///
    /// * `start` - 開始時刻
    /// * `stop` - 終了時刻。計測中の場合は`None`
    /// * `description` - 説明
    /// * `tags` - タグ
    /// * `metadata` - そのまま引き継ぐ識別子
    pub fn from_instants(
        start: DateTime<FixedOffset>,
        stop: Option<DateTime<FixedOffset>>,
        description: String,
        tags: Vec<String>,
        metadata: EntryMetadata,
    ) -> Self {
        let start = normalize_instant(start);
        let timing = match stop {
            Some(stop) => Timing::Stopped {
                start,
                stop: normalize_instant(stop),
            },
            None => Timing::Running { start },
        };

        Self {
            timing,
            description,
            tags,
            metadata,
        }
    }

    /// APIから取得したタイムエントリーを正規化する。
    ///
    /// 開始・終了時刻がパースできない場合はエラーを返す。
    pub fn from_raw(raw: &RawTimeEntry) -> Result<Self, RoundingError> {
        let start = normalize_timestamp(&raw.start)?;
        let timing = match raw.stop.as_deref() {
            Some(stop) => Timing::Stopped {
                start,
                stop: normalize_timestamp(stop)?,
            },
            None => Timing::Running { start },
        };

        Ok(Self {
            timing,
            description: raw.description.clone().unwrap_or_default(),
            tags: raw.tags.clone().unwrap_or_default(),
            metadata: EntryMetadata {
                id: raw.id,
                workspace_id: raw.workspace_id,
                project_id: raw.project_id,
                task_id: raw.task_id,
                user_id: raw.user_id,
                billable: raw.billable,
                tag_ids: raw.tag_ids.clone(),
            },
        })
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.timing.start()
    }

    pub fn stop(&self) -> Option<DateTime<FixedOffset>> {
        self.timing.stop()
    }

    pub fn duration(&self) -> Option<i64> {
        self.timing.duration()
    }

    /// 開始時刻が属する日付。開始時刻自身のオフセットでの日付とする。
    pub fn day(&self) -> NaiveDate {
        self.start().date_naive()
    }
}

/// 取得したタイムエントリーをまとめて正規化する。
///
/// 1件でもパースに失敗した場合はそのエラーを返す。
pub fn normalize(raw_entries: &[RawTimeEntry]) -> Result<Vec<TimeEntry>, RoundingError> {
    raw_entries.iter().map(TimeEntry::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone};

    use super::{normalize, RawTimeEntry, TimeEntry, Timing};
    use crate::error::RoundingError;

    fn raw(start: &str, stop: Option<&str>) -> RawTimeEntry {
        RawTimeEntry {
            start: start.to_string(),
            stop: stop.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_raw_rounds_both_boundaries() {
        let entry =
            TimeEntry::from_raw(&raw("2024-03-09T09:00:37Z", Some("2024-03-09T17:08:00Z")))
                .unwrap();

        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(
            entry.timing,
            Timing::Stopped {
                start: utc.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap(),
                stop: utc.with_ymd_and_hms(2024, 3, 9, 17, 15, 0).unwrap(),
            }
        );
        assert_eq!(entry.duration(), Some(8 * 3600 + 15 * 60));
    }

    #[test]
    fn test_from_raw_running_has_no_duration() {
        let entry = TimeEntry::from_raw(&raw("2024-03-09T09:22:00Z", None)).unwrap();

        assert!(matches!(entry.timing, Timing::Running { .. }));
        assert_eq!(entry.stop(), None);
        assert_eq!(entry.duration(), None);
    }

    /// 丸め後の差分は元の長さと一致しなくてよい。
    #[test]
    fn test_from_raw_rounding_changes_length() {
        let entry =
            TimeEntry::from_raw(&raw("2024-03-09T09:08:00Z", Some("2024-03-09T09:14:00Z")))
                .unwrap();

        assert_eq!(entry.duration(), Some(0));

        let entry =
            TimeEntry::from_raw(&raw("2024-03-09T09:22:00Z", Some("2024-03-09T09:23:00Z")))
                .unwrap();

        assert_eq!(entry.duration(), Some(15 * 60));
    }

    #[test]
    fn test_from_raw_passes_metadata_through() {
        let input = RawTimeEntry {
            id: Some(42),
            workspace_id: Some(7),
            project_id: Some(8),
            task_id: Some(9),
            user_id: Some(10),
            billable: Some(true),
            description: Some("Review".to_string()),
            tags: Some(vec!["dev".to_string()]),
            tag_ids: Some(vec![1, 2]),
            ..raw("2024-03-09T09:00:00Z", Some("2024-03-09T10:00:00Z"))
        };

        let entry = TimeEntry::from_raw(&input).unwrap();

        assert_eq!(entry.description, "Review");
        assert_eq!(entry.tags, vec!["dev".to_string()]);
        assert_eq!(entry.metadata.id, Some(42));
        assert_eq!(entry.metadata.workspace_id, Some(7));
        assert_eq!(entry.metadata.project_id, Some(8));
        assert_eq!(entry.metadata.task_id, Some(9));
        assert_eq!(entry.metadata.user_id, Some(10));
        assert_eq!(entry.metadata.billable, Some(true));
        assert_eq!(entry.metadata.tag_ids, Some(vec![1, 2]));
    }

    #[test]
    fn test_from_raw_invalid_stop() {
        let err = TimeEntry::from_raw(&raw("2024-03-09T09:00:00Z", Some("not a time")))
            .unwrap_err();

        assert!(matches!(err, RoundingError::Parse { .. }));
    }

    /// 日付は開始時刻自身のオフセットで決まる。
    #[test]
    fn test_day_uses_entry_offset() {
        let entry = TimeEntry::from_raw(&raw("2024-03-09T23:30:00-05:00", None)).unwrap();

        assert_eq!(entry.day(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn test_normalize() {
        let entries = normalize(&[
            raw("2024-03-09T09:00:00Z", Some("2024-03-09T10:00:00Z")),
            raw("2024-03-09T10:07:00Z", None),
        ])
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].duration(), Some(3600));
        assert_eq!(entries[1].duration(), None);
    }

    #[test]
    fn test_normalize_fails_on_invalid_entry() {
        let result = normalize(&[
            raw("2024-03-09T09:00:00Z", Some("2024-03-09T10:00:00Z")),
            raw("broken", None),
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_toggl_response() {
        let json = r#"{
            "id": 3333,
            "workspace_id": 876389,
            "project_id": null,
            "task_id": null,
            "billable": false,
            "start": "2024-03-09T09:00:37+00:00",
            "stop": null,
            "duration": -1709974837,
            "description": null,
            "tags": null,
            "tag_ids": null,
            "duronly": true,
            "at": "2024-03-09T09:00:38+00:00",
            "server_deleted_at": null,
            "user_id": 1,
            "uid": 1,
            "wid": 876389
        }"#;

        let raw: RawTimeEntry = serde_json::from_str(json).unwrap();

        assert_eq!(raw.id, Some(3333));
        assert_eq!(raw.workspace_id, Some(876389));
        assert_eq!(raw.stop, None);
        assert_eq!(raw.description, None);
    }
}
