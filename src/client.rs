use crate::error::Result;
use url::Url;
use std::sync::Arc;
use reqwest::{Client, header};
use base64::Engine;

/// changelog APIの1ページあたりの取得件数
pub const CHANGELOG_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub enum Auth {
    Basic { username: String, api_token: String },
    Bearer { token: String },
}

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub auth: Auth,
}

impl JiraConfig {
    pub fn new(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        // Validate URL
        let _ = Url::parse(&base_url)
            .map_err(|_| crate::error::Error::InvalidConfiguration("Invalid base URL".to_string()))?;

        Ok(Self {
            base_url,
            auth,
        })
    }

    /// 環境変数から設定を作成
    ///
    /// `JIRA_BEARER_TOKEN` があればBearer認証、なければ `JIRA_USER` と `JIRA_API_TOKEN` でBasic認証。
    pub fn from_env() -> Result<Self> {
        use std::env;

        let base_url = env::var("JIRA_URL")
            .map_err(|_| crate::error::Error::ConfigurationMissing("JIRA_URL not found in environment".to_string()))?;

        if let Ok(token) = env::var("JIRA_BEARER_TOKEN") {
            return Self::new(base_url, Auth::Bearer { token });
        }

        let username = env::var("JIRA_USER")
            .map_err(|_| crate::error::Error::ConfigurationMissing("JIRA_USER not found in environment".to_string()))?;

        let api_token = env::var("JIRA_API_TOKEN")
            .map_err(|_| crate::error::Error::ConfigurationMissing("JIRA_API_TOKEN not found in environment".to_string()))?;

        let auth = Auth::Basic { username, api_token };

        Self::new(base_url, auth)
    }
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    pub(crate) client: Client,
    pub(crate) config: Arc<JiraConfig>,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        // 認証ヘッダーを追加
        match &config.auth {
            Auth::Basic { username, api_token } => {
                let auth_value = format!("{}:{}", username, api_token);
                let encoded = base64::engine::general_purpose::STANDARD.encode(auth_value.as_bytes());
                headers.insert(
                    header::AUTHORIZATION,
                    header::HeaderValue::from_str(&format!("Basic {}", encoded))
                        .map_err(|_| crate::error::Error::InvalidConfiguration("Invalid auth header".to_string()))?,
                );
            }
            Auth::Bearer { token } => {
                headers.insert(
                    header::AUTHORIZATION,
                    header::HeaderValue::from_str(&format!("Bearer {}", token))
                        .map_err(|_| crate::error::Error::InvalidConfiguration("Invalid auth header".to_string()))?,
                );
            }
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| crate::error::Error::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    pub(crate) async fn get<T>(&self, endpoint: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url, endpoint);

        let response = self.client
            .get(&url)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(crate::error::Error::ApiError { status, message });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub(crate) async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let url = format!("{}{}", self.config.base_url, endpoint);

        let response = self.client
            .post(&url)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(crate::error::Error::ApiError { status, message });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub async fn search_issues(
        &self,
        jql: &str,
        params: crate::models::SearchParams,
    ) -> Result<crate::models::SearchResult> {
        let mut body = serde_json::json!({
            "jql": jql
        });

        // SearchParamsの値をリクエストボディにマージ
        if let Some(start_at) = params.start_at {
            body["startAt"] = start_at.into();
        }
        if let Some(max_results) = params.max_results {
            body["maxResults"] = max_results.into();
        }
        if let Some(fields) = params.fields {
            body["fields"] = fields.into();
        }

        self.post("/rest/api/3/search", &body).await
    }

    /// 課題の変更履歴をすべて取得
    ///
    /// `expand=changelog` は先頭の一部しか返さないため、残りはchangelog APIで順に取得して
    /// `{"histories": [...]}` の形にまとめて返す。
    pub async fn get_issue_changelog(&self, issue_key: &str) -> Result<serde_json::Value> {
        let key = urlencoding::encode(issue_key);
        let issue: serde_json::Value = self
            .get(&format!("/rest/api/3/issue/{}?expand=changelog&fields=created", key))
            .await?;

        let changelog = issue.get("changelog").ok_or_else(|| {
            crate::error::Error::InvalidData(format!("No changelog returned for {}", issue_key))
        })?;
        let mut histories = changelog
            .get("histories")
            .and_then(|h| h.as_array())
            .cloned()
            .ok_or_else(|| {
                crate::error::Error::InvalidData(format!("No histories array in changelog for {}", issue_key))
            })?;
        let total = changelog
            .get("total")
            .and_then(|t| t.as_u64())
            .map(|t| t as usize)
            .unwrap_or(histories.len());

        while histories.len() < total {
            let page: serde_json::Value = self
                .get(&format!(
                    "/rest/api/3/issue/{}/changelog?startAt={}&maxResults={}",
                    key,
                    histories.len(),
                    CHANGELOG_PAGE_SIZE
                ))
                .await?;
            let values = page
                .get("values")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            if values.is_empty() {
                break;
            }
            histories.extend(values);
        }

        Ok(serde_json::json!({ "histories": histories }))
    }
}
