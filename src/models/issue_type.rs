use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtask: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_type_deserialization() {
        let json_data = json!({
            "id": "1",
            "name": "Bug",
            "self": "https://example.atlassian.net/rest/api/3/issuetype/1",
            "description": "A problem or error",
            "subtask": false,
            "iconUrl": "https://example.atlassian.net/images/icons/bug.png"
        });

        let issue_type: IssueType = serde_json::from_value(json_data).unwrap();

        assert_eq!(issue_type.id, Some("1".to_string()));
        assert_eq!(issue_type.name, "Bug");
        assert_eq!(issue_type.subtask, Some(false));
    }
}
