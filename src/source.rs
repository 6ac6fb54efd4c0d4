use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::JiraClient;
use crate::models::{Issue, SearchParams, SearchResult};
use crate::Error;

/// 課題と変更履歴の取得元
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// クエリに一致する課題を `offset` から最大 `limit` 件取得
    ///
    /// 結果にはサーバーが実際に使ったページサイズと総件数も含まれる。
    async fn fetch_issues(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<SearchResult, Error>;

    /// 課題の変更履歴（JIRAのchangelog JSON）を取得
    async fn fetch_changelog(&self, issue_key: &str) -> Result<Value, Error>;
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn fetch_issues(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> Result<SearchResult, Error> {
        self.search_issues(query, SearchParams::for_report(offset, limit)).await
    }

    async fn fetch_changelog(&self, issue_key: &str) -> Result<Value, Error> {
        self.get_issue_changelog(issue_key).await
    }
}

/// 検索結果をページ単位で順に取得する
///
/// サーバーが総件数を返す場合は、その件数に達するまで取得する。
/// 返さない場合は、取得件数がページサイズ（サーバーが縮めた値を優先）に満たないラウンドで終了する。
/// `max_rounds` を指定した場合は、そのラウンド数で打ち切る。
pub struct IssuePager<'a, S: IssueSource + ?Sized> {
    source: &'a S,
    query: &'a str,
    page_size: u32,
    max_rounds: Option<u32>,
    offset: u32,
    rounds: u32,
    finished: bool,
}

impl<'a, S: IssueSource + ?Sized> IssuePager<'a, S> {
    pub fn new(source: &'a S, query: &'a str, page_size: u32) -> Result<Self, Error> {
        if page_size == 0 {
            return Err(Error::InvalidInput("Page size must be greater than zero".to_string()));
        }

        Ok(Self {
            source,
            query,
            page_size,
            max_rounds: None,
            offset: 0,
            rounds: 0,
            finished: false,
        })
    }

    pub fn max_rounds(mut self, max_rounds: Option<u32>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// 実行済みのラウンド数
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// 次のページを取得（終了後は `None`）
    pub async fn next_batch(&mut self) -> Result<Option<Vec<Issue>>, Error> {
        if self.finished {
            return Ok(None);
        }

        if let Some(cap) = self.max_rounds {
            if self.rounds >= cap {
                warn!(
                    "Stopping after {} round(s); more issues may match '{}'",
                    cap, self.query
                );
                self.finished = true;
                return Ok(None);
            }
        }

        let page = self
            .source
            .fetch_issues(self.query, self.offset, self.page_size)
            .await?;
        let batch = page.issues;
        let served = batch.len() as u32;
        self.rounds += 1;
        self.offset += served;
        debug!(
            "Round {}: fetched {} issue(s), next offset {}",
            self.rounds, served, self.offset
        );

        // サーバー側の上限でページサイズが縮められることがある
        let page_limit = match page.max_results {
            0 => self.page_size,
            server_max => server_max.min(self.page_size),
        };
        if page_limit < self.page_size {
            debug!(
                "Server limited the page size to {} (requested {})",
                page_limit, self.page_size
            );
        }

        let exhausted = match page.total {
            Some(total) => self.offset >= total,
            None => served < page_limit,
        };
        if served == 0 || exhausted {
            self.finished = true;
        }

        if batch.is_empty() {
            return Ok(None);
        }
        Ok(Some(batch))
    }
}
