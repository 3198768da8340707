use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::time_entry::TimeEntry;

/// 日毎の合計時間(秒)を計算する。
///
/// 日付は開始時刻で決める。終了していないtime entryは集計対象外とし、
/// 終了したエントリーが1件もない日は結果に含まれない。
pub fn daily_totals(entries: &[TimeEntry]) -> BTreeMap<NaiveDate, i64> {
    entries
        .iter()
        .filter_map(|entry| entry.duration().map(|duration| (entry.day(), duration)))
        .fold(BTreeMap::new(), |mut accumulate, (day, duration)| {
            *accumulate.entry(day).or_insert(0) += duration;
            accumulate
        })
}

/// 指定した日に開始したtime entryのうち、最も遅い終了時刻を返す。
///
/// 終了したエントリーがない場合は`None`を返す。
pub fn latest_stop(day: NaiveDate, entries: &[TimeEntry]) -> Option<DateTime<FixedOffset>> {
    entries
        .iter()
        .filter(|entry| entry.day() == day)
        .filter_map(TimeEntry::stop)
        .max()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

    use super::{daily_totals, latest_stop};
    use crate::time_entry::{EntryMetadata, TimeEntry};

    fn at(d: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, d, h, m, 0)
            .unwrap()
    }

    fn entry(start: DateTime<FixedOffset>, stop: Option<DateTime<FixedOffset>>) -> TimeEntry {
        TimeEntry::from_instants(start, stop, String::new(), vec![], EntryMetadata::default())
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_daily_totals_sums_same_day() {
        let entries = [
            entry(at(9, 9, 0), Some(at(9, 10, 0))),
            entry(at(9, 13, 0), Some(at(9, 13, 30))),
        ];

        let totals = daily_totals(&entries);

        assert_eq!(totals.len(), 1);
        assert_eq!(totals[&day(9)], 5400);
    }

    #[test]
    fn test_daily_totals_splits_days() {
        let entries = [
            entry(at(10, 9, 0), Some(at(10, 17, 0))),
            entry(at(9, 9, 0), Some(at(9, 12, 0))),
        ];

        let totals = daily_totals(&entries);

        assert_eq!(
            totals.into_iter().collect::<Vec<_>>(),
            vec![(day(9), 3 * 3600), (day(10), 8 * 3600)]
        );
    }

    #[test]
    fn test_daily_totals_skips_running() {
        let entries = [
            entry(at(9, 9, 0), Some(at(9, 10, 0))),
            entry(at(9, 11, 0), None),
            entry(at(10, 9, 0), None),
        ];

        let totals = daily_totals(&entries);

        assert_eq!(totals.get(&day(9)), Some(&3600));
        assert_eq!(totals.get(&day(10)), None);
    }

    /// 日を跨ぐエントリーは開始日に計上する。
    #[test]
    fn test_daily_totals_uses_start_day() {
        let entries = [entry(at(9, 23, 0), Some(at(10, 1, 0)))];

        let totals = daily_totals(&entries);

        assert_eq!(totals[&day(9)], 2 * 3600);
    }

    #[test]
    fn test_latest_stop() {
        let entries = [
            entry(at(9, 13, 0), Some(at(9, 15, 0))),
            entry(at(9, 9, 0), Some(at(9, 17, 30))),
            entry(at(9, 18, 0), None),
            entry(at(10, 9, 0), Some(at(10, 20, 0))),
        ];

        assert_eq!(latest_stop(day(9), &entries), Some(at(9, 17, 30)));
    }

    #[test]
    fn test_latest_stop_none() {
        let entries = [
            entry(at(9, 9, 0), None),
            entry(at(10, 9, 0), Some(at(10, 10, 0))),
        ];

        assert_eq!(latest_stop(day(9), &entries), None);
        assert_eq!(latest_stop(day(11), &entries), None);
    }
}
