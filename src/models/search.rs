use super::Issue;
use serde::{Deserialize, Serialize};

/// レポートに必要な課題フィールド
pub const REPORT_FIELDS: [&str; 4] = ["summary", "issuetype", "status", "created"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchParams {
    #[serde(rename = "startAt")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<u32>,

    #[serde(rename = "maxResults")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "startAt")]
    #[serde(default)]
    pub start_at: u32,

    #[serde(rename = "maxResults")]
    #[serde(default)]
    pub max_results: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,

    pub issues: Vec<Issue>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// レポート用のフィールドだけを要求するパラメータ
    pub fn for_report(start_at: u32, max_results: u32) -> Self {
        Self::new()
            .start_at(start_at)
            .max_results(max_results)
            .fields(REPORT_FIELDS.iter().map(|f| f.to_string()).collect())
    }

    pub fn start_at(mut self, start_at: u32) -> Self {
        self.start_at = Some(start_at);
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_params_builder() {
        let params = SearchParams::new()
            .start_at(0)
            .max_results(50)
            .fields(vec!["summary".to_string(), "status".to_string()]);

        assert_eq!(params.start_at, Some(0));
        assert_eq!(params.max_results, Some(50));
        assert!(params.fields.is_some());
    }

    #[test]
    fn test_search_params_for_report() {
        let params = SearchParams::for_report(100, 25);

        let json = serde_json::to_value(&params).unwrap();

        assert_eq!(json["startAt"], 100);
        assert_eq!(json["maxResults"], 25);
        assert_eq!(json["fields"], json!(["summary", "issuetype", "status", "created"]));
    }

    #[test]
    fn test_search_result_deserialization() {
        let json_data = json!({
            "startAt": 0,
            "maxResults": 50,
            "total": 123,
            "issues": [
                {
                    "id": "10000",
                    "key": "TEST-1",
                    "self": "https://example.atlassian.net/rest/api/3/issue/10000",
                    "fields": {
                        "summary": "Test Issue",
                        "issuetype": { "id": "1", "name": "Bug" },
                        "status": { "id": "1", "name": "To Do" },
                        "created": "2024-01-01T00:00:00.000+0000"
                    }
                }
            ]
        });

        let result: SearchResult = serde_json::from_value(json_data).unwrap();

        assert_eq!(result.start_at, 0);
        assert_eq!(result.max_results, 50);
        assert_eq!(result.total, Some(123));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].key, "TEST-1");
    }
}
