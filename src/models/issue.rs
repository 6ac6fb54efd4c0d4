use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::datetime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub id: String,
    pub key: String,
    #[serde(rename = "self")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueFields {
    pub summary: String,
    #[serde(rename = "issuetype")]
    pub issue_type: IssueType,
    pub status: Status,
    #[serde(with = "datetime::jira_format")]
    pub created: DateTime<FixedOffset>,
}

/// レポート行の元になる課題の記述情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDescriptor {
    pub key: String,
    pub summary: String,
    pub issue_type: String,
    pub status: String,
    /// 作成日（`YYYY-MM-DD`）
    pub created: String,
}

impl Issue {
    /// 課題の記述情報を取り出す
    pub fn descriptor(&self) -> IssueDescriptor {
        IssueDescriptor {
            key: self.key.clone(),
            summary: self.fields.summary.clone(),
            issue_type: self.fields.issue_type.name.clone(),
            status: self.fields.status.name.clone(),
            created: datetime::format_date(&self.fields.created),
        }
    }
}

use super::{IssueType, Status};
