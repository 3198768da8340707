use chrono::{DateTime, Duration, FixedOffset, Timelike};

use crate::error::RoundingError;

/// 丸めの単位(分)。
const QUARTER_MINUTES: i64 = 15;

/// 丸めで切り捨てる上限(分)。これを超えると次の区切りに切り上げる。
const ROUND_DOWN_LIMIT: i64 = 7;

/// タイムスタンプ文字列をタイムゾーン付きの日時に変換する。
///
/// RFC 3339 形式を基本とし、日付と時刻の区切りが空白の形式も受け付ける。
pub fn parse_timestamp(input: &str) -> Result<DateTime<FixedOffset>, RoundingError> {
    DateTime::parse_from_rfc3339(input)
        .or_else(|_| DateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .map_err(|source| RoundingError::Parse {
            input: input.to_string(),
            source,
        })
}

/// 秒以下を切り捨てる。
pub fn truncate_seconds(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    dt - Duration::seconds(i64::from(dt.second()))
        - Duration::nanoseconds(i64::from(dt.nanosecond()))
}

/// 最も近い15分区切りに丸める。
///
/// 区切りから7分までは切り捨て、8分以降は次の区切りに切り上げる。
/// 切り上げで60分になった場合は時、日、月、年へ繰り上がる。
/// 表現できる日時の上限を超える場合は丸めずに返す。
pub fn round_to_quarter_hour(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let minute = i64::from(dt.minute());
    let target = (minute + ROUND_DOWN_LIMIT) / QUARTER_MINUTES * QUARTER_MINUTES;
    dt.checked_add_signed(Duration::minutes(target - minute))
        .unwrap_or(dt)
}

/// 秒以下を切り捨ててから15分区切りに丸める。
pub fn normalize_instant(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    round_to_quarter_hour(truncate_seconds(dt))
}

/// タイムスタンプ文字列をパースし、正規化した日時を返す。
pub fn normalize_timestamp(input: &str) -> Result<DateTime<FixedOffset>, RoundingError> {
    parse_timestamp(input).map(normalize_instant)
}
