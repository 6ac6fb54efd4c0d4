use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::datetime;

/// ステータス変更を表すフィールド名
pub const STATUS_FIELD: &str = "status";

/// changelogの1エントリ（1回の更新操作）
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogEntry {
    /// 変更が発生した日時
    pub timestamp: DateTime<FixedOffset>,
    /// 変更されたフィールドの一覧
    pub items: Vec<FieldChange>,
}

/// 1フィールドの変更内容（表示値）
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub from_value: Option<String>,
    pub to_value: Option<String>,
}

impl FieldChange {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            from_value: None,
            to_value: None,
        }
    }

    /// ステータス変更を作成
    pub fn status(from: Option<&str>, to: &str) -> Self {
        Self {
            field: STATUS_FIELD.to_string(),
            from_value: from.map(str::to_string),
            to_value: Some(to.to_string()),
        }
    }

    pub fn with_values(mut self, from: Option<String>, to: Option<String>) -> Self {
        self.from_value = from;
        self.to_value = to;
        self
    }

    pub fn is_status_change(&self) -> bool {
        self.field == STATUS_FIELD
    }
}

/// 日付の選択方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occurrence {
    /// 最初にそのステータスへ遷移した日
    First,
    /// 最後にそのステータスへ遷移した日
    Last,
}

impl Occurrence {
    pub fn from_use_first(use_first: bool) -> Self {
        if use_first { Occurrence::First } else { Occurrence::Last }
    }
}

/// ステータス名ごとの遷移日時（changelogの走査順）
///
/// 並べ替えや重複除去は行わない。同じステータスへ複数回遷移した場合はすべて残る。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusHistory {
    transitions: HashMap<String, Vec<DateTime<FixedOffset>>>,
}

impl StatusHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// changelogエントリからステータス履歴を構築
    pub fn extract(entries: &[ChangelogEntry]) -> Self {
        let mut history = Self::new();

        for entry in entries {
            for item in entry.items.iter().filter(|i| i.is_status_change()) {
                let Some(status) = item.to_value.as_deref() else {
                    continue;
                };
                history.record(status, entry.timestamp);
            }
        }

        history
    }

    /// 遷移を1件追加
    pub fn record(&mut self, status: &str, timestamp: DateTime<FixedOffset>) {
        let dates = self.transitions.entry(status.to_string()).or_insert_with(|| {
            debug!("First transition into '{}'", status);
            Vec::new()
        });
        debug!("Adding {} to '{}'", timestamp, status);
        dates.push(timestamp);
    }

    /// 指定ステータスへの遷移日時（走査順）
    pub fn transitions(&self, status: &str) -> &[DateTime<FixedOffset>] {
        self.transitions
            .get(status)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, status: &str) -> bool {
        self.transitions.contains_key(status)
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// 方針に従ってステータスの遷移日時を1つ選ぶ
    pub fn select_timestamp(
        &self,
        status: &str,
        occurrence: Occurrence,
    ) -> Option<DateTime<FixedOffset>> {
        let dates = self.transitions(status);
        let selected = match occurrence {
            Occurrence::First => dates.first(),
            Occurrence::Last => dates.last(),
        };

        match selected {
            Some(dt) => {
                debug!("'{}' includes these dates: {:?}", status, dates);
                Some(*dt)
            }
            None => {
                debug!("No dates found for '{}'", status);
                None
            }
        }
    }

    /// 方針に従って遷移日（暦日）を選ぶ
    pub fn select(&self, status: &str, occurrence: Occurrence) -> Option<NaiveDate> {
        self.select_timestamp(status, occurrence)
            .map(|dt| datetime::calendar_date(&dt))
    }

    /// `YYYY-MM-DD` 形式で遷移日を選ぶ
    pub fn select_formatted(&self, status: &str, occurrence: Occurrence) -> Option<String> {
        self.select_timestamp(status, occurrence)
            .map(|dt| datetime::format_date(&dt))
    }
}
