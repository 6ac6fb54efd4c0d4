use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::changelog_parser::ChangelogParser;
use crate::config_store::{RunConfig, StatusConfig};
use crate::history::StatusHistory;
use crate::models::Issue;
use crate::report::{Report, ReportRow};
use crate::source::{IssuePager, IssueSource};
use crate::Error;

/// 1回の実行の統計
#[derive(Debug, Clone)]
pub struct ReportStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// 取得したラウンド数
    pub rounds: u32,
    /// レポートに含めた課題数
    pub issue_count: usize,
    /// 不正なため読み飛ばしたchangelog項目の数
    pub skipped_items: usize,
}

impl ReportStats {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            rounds: 0,
            issue_count: 0,
            skipped_items: 0,
        }
    }

    /// 処理時間（秒）
    pub fn duration_seconds(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

/// 検索から課題ごとの遷移日レポートを作成するサービス
///
/// 課題は1件ずつ、ページは1ラウンドずつ順番に処理する。
/// 取得に失敗した時点で実行全体を失敗とし、途中までのレポートは返さない。
pub struct ReportService {
    statuses: StatusConfig,
    page_size: u32,
    max_rounds: Option<u32>,
}

impl ReportService {
    pub fn new(statuses: StatusConfig, run_config: &RunConfig) -> Result<Self, Error> {
        run_config.validate()?;

        Ok(Self {
            statuses,
            page_size: run_config.page_size,
            max_rounds: run_config.max_rounds,
        })
    }

    pub fn statuses(&self) -> &StatusConfig {
        &self.statuses
    }

    /// クエリを実行してレポートを作成
    pub async fn run<S>(&self, source: &S, query: &str) -> Result<(Report, ReportStats), Error>
    where
        S: IssueSource + ?Sized,
    {
        info!("Running query: '{}'", query);

        let mut stats = ReportStats::new();
        let mut report = Report::new(&self.statuses);
        let mut pager = IssuePager::new(source, query, self.page_size)?.max_rounds(self.max_rounds);

        while let Some(batch) = pager.next_batch().await? {
            for issue in &batch {
                let (row, skipped) = self.build_row(source, issue).await?;
                stats.skipped_items += skipped;
                report.push(row);
            }
        }

        stats.rounds = pager.rounds();
        stats.issue_count = report.len();
        stats.end_time = Utc::now();

        info!("Found {} issue(s)", stats.issue_count);
        if stats.skipped_items > 0 {
            warn!("Skipped {} malformed changelog item(s)", stats.skipped_items);
        }

        Ok((report, stats))
    }

    /// 課題1件分の行を組み立てる（戻り値の2つ目は読み飛ばした項目数）
    async fn build_row<S>(&self, source: &S, issue: &Issue) -> Result<(ReportRow, usize), Error>
    where
        S: IssueSource + ?Sized,
    {
        let descriptor = issue.descriptor();
        debug!("Issue details: {:?}", descriptor);

        let changelog = source.fetch_changelog(&issue.key).await?;
        let parsed = ChangelogParser::parse_changelog(&changelog)?;
        let history = StatusHistory::extract(&parsed.entries);

        Ok((
            ReportRow::assemble(descriptor, &history, &self.statuses),
            parsed.skipped_items,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_store::StatusRule;
    use crate::models::SearchResult;
    use crate::source::tests::{MockSource, issue};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    fn statuses() -> StatusConfig {
        StatusConfig::new(vec![
            StatusRule::new("In Progress", true),
            StatusRule::new("Done", false),
        ])
        .unwrap()
    }

    fn service(page_size: u32) -> ReportService {
        ReportService::new(statuses(), &RunConfig::new().page_size(page_size)).unwrap()
    }

    #[tokio::test]
    async fn test_run_selects_dates_per_issue() {
        // Given: In Progress → Done → In Progress と遷移した課題
        let source = MockSource::new(vec![issue("PROJ-1")]).with_changelog(
            "PROJ-1",
            json!({
                "histories": [
                    { "created": "2024-01-01T10:00:00.000+0000", "items": [{ "field": "status", "toString": "In Progress" }] },
                    { "created": "2024-01-10T10:00:00.000+0000", "items": [{ "field": "status", "toString": "Done" }] },
                    { "created": "2024-01-12T10:00:00.000+0000", "items": [{ "field": "status", "toString": "In Progress" }] }
                ]
            }),
        );

        // When
        let (report, stats) = service(50).run(&source, "project = PROJ").await.unwrap();

        // Then
        assert_eq!(report.len(), 1);
        let row = &report.rows()[0];
        assert_eq!(row.descriptor.key, "PROJ-1");
        assert_eq!(row.descriptor.created, "2024-01-01");
        assert_eq!(row.date("In Progress"), Some("2024-01-01"));
        assert_eq!(row.date("Done"), Some("2024-01-10"));
        assert_eq!(stats.issue_count, 1);
        assert_eq!(stats.rounds, 1);
    }

    #[tokio::test]
    async fn test_run_accumulates_batches_in_order() {
        // Given: ページサイズ2で3件（2ラウンド）
        let source = MockSource::new(vec![issue("PROJ-3"), issue("PROJ-1"), issue("PROJ-2")]);

        let (report, stats) = service(2).run(&source, "q").await.unwrap();

        let keys: Vec<&str> = report.rows().iter().map(|r| r.descriptor.key.as_str()).collect();
        assert_eq!(keys, vec!["PROJ-3", "PROJ-1", "PROJ-2"]);
        assert_eq!(stats.rounds, 2);
        assert!(report.rows().iter().all(|r| r.date("Done").is_none()));
    }

    #[tokio::test]
    async fn test_run_counts_skipped_items() {
        let source = MockSource::new(vec![issue("PROJ-1")]).with_changelog(
            "PROJ-1",
            json!({
                "histories": [
                    { "created": "2024-01-01T10:00:00.000+0000", "items": [{ "field": "status" }, { "toString": "Done" }] }
                ]
            }),
        );

        let (report, stats) = service(50).run(&source, "q").await.unwrap();

        assert_eq!(stats.skipped_items, 2);
        assert_eq!(report.rows()[0].date("Done"), None);
    }

    struct FailingChangelogSource;

    #[async_trait]
    impl IssueSource for FailingChangelogSource {
        async fn fetch_issues(
            &self,
            _query: &str,
            offset: u32,
            limit: u32,
        ) -> Result<SearchResult, Error> {
            Ok(SearchResult {
                start_at: offset,
                max_results: limit,
                total: Some(1),
                issues: vec![issue("PROJ-1")],
            })
        }

        async fn fetch_changelog(&self, _issue_key: &str) -> Result<Value, Error> {
            Err(Error::ApiError {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_run_fails_on_changelog_error() {
        let result = service(50).run(&FailingChangelogSource, "q").await;

        assert!(matches!(result, Err(Error::ApiError { status: 500, .. })));
    }

    #[test]
    fn test_new_rejects_invalid_run_config() {
        let result = ReportService::new(statuses(), &RunConfig::new().page_size(0));

        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }
}
