use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// 処理対象期間を返す。
///
/// 現在時刻から`days`日前の00:00:00(UTC)から現在時刻までとする。
pub fn days_back_range(days: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let end_at = now();
    let start_at = Duration::try_days(days)
        .and_then(|days| end_at.checked_sub_signed(days))
        .with_context(|| format!("{} days back from {} is out of range", days, end_at))?
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .context("Failed to set hour, minute, and second")?
        .and_utc();

    Ok((start_at, end_at))
}
