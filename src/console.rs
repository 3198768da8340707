use std::io::Write;

use anyhow::{Context, Result};
use chrono::Local;

use crate::time_entry::TimeEntry;

/// Consoleにtime entryを表示するためのtrait。
pub trait ConsolePresenter {
    /// タイムエントリーを表示する。
    ///
    /// # Arguments
    ///
    /// * `time_entries` - 表示するタイムエントリー
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()>;
}

/// タイムエントリーをMarkdownのlist形式で表示する。
pub struct ConsoleMarkdownList<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdownList<'a, W> {
    /// 新しい`ConsoleMarkdownList`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdownList<'a, W> {
    // time entryを開始時刻順にlist形式で表示する。
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()> {
        let mut sorted_entries = time_entries.to_vec();
        sorted_entries.sort_by_key(TimeEntry::start);

        for entry in sorted_entries {
            let start = entry.start().with_timezone(&Local);
            let end_str = entry
                .stop()
                .map(|stop| stop.with_timezone(&Local).format("%H:%M").to_string())
                .unwrap_or_else(|| "now".to_string());
            let duration_str = entry
                .duration()
                .map(|duration| format!(" ({:.2}h)", duration as f64 / 3600.0))
                .unwrap_or_default();
            writeln!(
                self.writer,
                "- {} {} ~ {}: {}{}",
                start.format("%Y-%m-%d"),
                start.format("%H:%M"),
                end_str,
                entry.description,
                duration_str
            )
            .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
        }

        Ok(())
    }
}
