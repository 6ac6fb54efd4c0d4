use chrono::{DateTime, FixedOffset, NaiveDate};

/// レポートで使用する日付フォーマット
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// JIRAの日時文字列をパース
///
/// JIRAは `2024-01-15T10:30:00.000+0000` 形式（コロンなしのオフセット）を返すため、
/// RFC3339で失敗した場合はこちらの形式で再試行する。オフセットは変換せずそのまま保持する。
pub fn parse_jira_datetime(s: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z"))
}

/// タイムスタンプの暦日（タイムスタンプ自身のオフセット基準）
pub fn calendar_date(dt: &DateTime<FixedOffset>) -> NaiveDate {
    dt.date_naive()
}

/// 暦日を `YYYY-MM-DD` 形式で出力
pub fn format_date(dt: &DateTime<FixedOffset>) -> String {
    calendar_date(dt).format(DATE_FORMAT).to_string()
}

/// serdeで `DateTime<FixedOffset>` をJIRA形式として読み書きする
pub mod jira_format {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_jira_datetime(&raw).map_err(serde::de::Error::custom)
    }
}
