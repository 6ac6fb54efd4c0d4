use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::config_store::StatusConfig;
use crate::history::StatusHistory;
use crate::models::IssueDescriptor;

/// 課題の記述情報の列（この順で出力する）
pub const DESCRIPTOR_COLUMNS: [&str; 5] = ["key", "summary", "type", "status", "created"];

/// レポートの1行（課題1件）
///
/// 記述情報の列のあとに、ステータス設定の順で日付列が続く。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub descriptor: IssueDescriptor,
    /// (ステータス名, 遷移日)
    pub dates: Vec<(String, Option<String>)>,
}

impl ReportRow {
    /// 課題の記述情報と選択した遷移日から行を組み立てる
    pub fn assemble(
        descriptor: IssueDescriptor,
        history: &StatusHistory,
        config: &StatusConfig,
    ) -> Self {
        let dates = config
            .rules()
            .iter()
            .map(|rule| {
                (
                    rule.name.clone(),
                    history.select_formatted(&rule.name, rule.occurrence()),
                )
            })
            .collect();

        Self { descriptor, dates }
    }

    /// 列名と値の組を列順で返す
    pub fn fields(&self) -> Vec<(&str, Option<&str>)> {
        let d = &self.descriptor;
        let mut fields: Vec<(&str, Option<&str>)> = vec![
            (DESCRIPTOR_COLUMNS[0], Some(d.key.as_str())),
            (DESCRIPTOR_COLUMNS[1], Some(d.summary.as_str())),
            (DESCRIPTOR_COLUMNS[2], Some(d.issue_type.as_str())),
            (DESCRIPTOR_COLUMNS[3], Some(d.status.as_str())),
            (DESCRIPTOR_COLUMNS[4], Some(d.created.as_str())),
        ];
        fields.extend(
            self.dates
                .iter()
                .map(|(name, date)| (name.as_str(), date.as_deref())),
        );
        fields
    }

    /// 値だけを列順で返す
    pub fn values(&self) -> Vec<Option<&str>> {
        self.fields().into_iter().map(|(_, v)| v).collect()
    }

    /// ステータス列の値
    pub fn date(&self, status: &str) -> Option<&str> {
        self.dates
            .iter()
            .find(|(name, _)| name == status)
            .and_then(|(_, date)| date.as_deref())
    }
}

impl Serialize for ReportRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let fields = self.fields();
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in fields {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// 実行全体のレポート
///
/// 列構成はステータス設定から一度だけ決め、全行で共通にする。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    columns: Vec<String>,
    rows: Vec<ReportRow>,
}

impl Report {
    pub fn new(config: &StatusConfig) -> Self {
        let columns = DESCRIPTOR_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(config.rules().iter().map(|r| r.name.clone()))
            .collect();

        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// 行を追加（取得順のまま、並べ替えや重複除去はしない）
    pub fn push(&mut self, row: ReportRow) {
        debug_assert_eq!(row.dates.len() + DESCRIPTOR_COLUMNS.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn extend(&mut self, rows: impl IntoIterator<Item = ReportRow>) {
        for row in rows {
            self.push(row);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
