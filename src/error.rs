use chrono::NaiveDate;
use thiserror::Error;

/// 丸め処理と穴埋め処理で発生するエラー。
#[derive(Debug, Error)]
pub enum RoundingError {
    /// タイムスタンプとして解釈できない文字列が渡された。
    #[error("failed to parse timestamp: {input}")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// 不足時間があるが、起点となる終了時刻がその日に存在しない。
    #[error("no stopped time entry to anchor a filler on {date}")]
    NoAnchor { date: NaiveDate },

    /// 穴埋め用エントリーの終了時刻が表現できる日時の範囲を超えた。
    #[error("filler on {date} overflows with a shortfall of {shortfall} seconds")]
    OutOfRange { date: NaiveDate, shortfall: i64 },
}
