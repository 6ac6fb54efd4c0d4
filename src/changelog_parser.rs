use crate::datetime::parse_jira_datetime;
use crate::history::{ChangelogEntry, FieldChange};
use crate::Error;
use serde_json::Value;
use tracing::warn;

/// changelogの解析結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedChangelog {
    /// 有効なエントリ（元の順序のまま）
    pub entries: Vec<ChangelogEntry>,
    /// 不正なため読み飛ばした変更項目の数
    pub skipped_items: usize,
}

/// JIRAのchangelogを解析して型付きのエントリを生成するパーサー
pub struct ChangelogParser;

impl ChangelogParser {
    /// JIRAのchangelog JSONを解析
    ///
    /// `histories`（課題取得時のexpand）と `values`（changelog APIのページ）のどちらも受け付ける。
    /// 不正な項目はその項目だけを読み飛ばし、件数を `skipped_items` に数える。
    pub fn parse_changelog(changelog_json: &Value) -> Result<ParsedChangelog, Error> {
        let histories_array = changelog_json
            .get("histories")
            .or_else(|| changelog_json.get("values"))
            .and_then(|h| h.as_array())
            .ok_or_else(|| Error::InvalidData("No histories array in changelog".to_string()))?;

        let mut parsed = ParsedChangelog::default();

        for history_entry in histories_array {
            let items = history_entry.get("items").and_then(|i| i.as_array());

            let timestamp = history_entry
                .get("created")
                .and_then(|c| c.as_str())
                .and_then(|c| parse_jira_datetime(c).ok());

            let (Some(timestamp), Some(items)) = (timestamp, items) else {
                let lost = items.map(|i| i.len()).unwrap_or(1);
                warn!(
                    "Skipping history entry without valid created/items ({} item(s))",
                    lost
                );
                parsed.skipped_items += lost;
                continue;
            };

            let mut changes = Vec::with_capacity(items.len());
            for item in items {
                match Self::parse_item(item) {
                    Some(change) => changes.push(change),
                    None => {
                        warn!("Skipping malformed changelog item: {}", item);
                        parsed.skipped_items += 1;
                    }
                }
            }

            parsed.entries.push(ChangelogEntry {
                timestamp,
                items: changes,
            });
        }

        Ok(parsed)
    }

    /// 変更項目を1件解析（ステータス変更は遷移先の表示値が必須）
    fn parse_item(item: &Value) -> Option<FieldChange> {
        let field_name = item.get("field").and_then(|f| f.as_str())?;

        let from_display = item
            .get("fromString")
            .and_then(|f| f.as_str())
            .map(|s| s.to_string());

        let to_display = item
            .get("toString")
            .and_then(|t| t.as_str())
            .map(|s| s.to_string());

        let change = FieldChange::new(field_name).with_values(from_display, to_display);
        if change.is_status_change() && change.to_value.is_none() {
            return None;
        }

        Some(change)
    }
}
