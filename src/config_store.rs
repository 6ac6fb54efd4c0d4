use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::history::Occurrence;
use crate::output::{Destination, OutputFormat};
use crate::report::DESCRIPTOR_COLUMNS;
use crate::Error;

/// ステータス設定ファイルの既定名
pub const STATUS_CONFIG_FILE: &str = "statuses.json";

/// 1回の検索で取得する課題数の既定値
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// レポート列にするステータスと日付の選び方
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRule {
    pub name: String,
    pub use_first: bool,
}

impl StatusRule {
    pub fn new(name: impl Into<String>, use_first: bool) -> Self {
        Self {
            name: name.into(),
            use_first,
        }
    }

    pub fn occurrence(&self) -> Occurrence {
        Occurrence::from_use_first(self.use_first)
    }
}

/// 設定ファイルの形式
///
/// 配列形式 `[{"name": "Done", "use_first": false}]` と
/// オブジェクト形式 `{"Done": false}`（記述順を保持）を受け付ける。
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStatusConfig {
    List(Vec<StatusRule>),
    Map(serde_json::Map<String, serde_json::Value>),
}

/// レポートの日付列の定義（順序付き）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusConfig {
    rules: Vec<StatusRule>,
}

impl StatusConfig {
    /// 検証済みの設定を作成
    pub fn new(rules: Vec<StatusRule>) -> Result<Self, Error> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if rule.name.trim().is_empty() {
                return Err(Error::InvalidConfiguration(
                    "Status name cannot be empty".to_string(),
                ));
            }
            if DESCRIPTOR_COLUMNS.contains(&rule.name.as_str()) {
                return Err(Error::InvalidConfiguration(format!(
                    "Status '{}' collides with a report column",
                    rule.name
                )));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(Error::InvalidConfiguration(format!(
                    "Status '{}' is configured more than once",
                    rule.name
                )));
            }
        }

        if rules.is_empty() {
            warn!("No statuses configured; the report will have no date columns");
        }

        Ok(Self { rules })
    }

    /// JSON文字列から設定を読み込む
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let raw: RawStatusConfig = serde_json::from_str(json).map_err(|e| {
            Error::InvalidConfiguration(format!("Invalid status configuration: {}", e))
        })?;

        let rules = match raw {
            RawStatusConfig::List(rules) => rules,
            RawStatusConfig::Map(map) => map
                .into_iter()
                .map(|(name, value)| match value.as_bool() {
                    Some(use_first) => Ok(StatusRule::new(name, use_first)),
                    None => Err(Error::InvalidConfiguration(format!(
                        "Status '{}' must map to true (first) or false (last)",
                        name
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        Self::new(rules)
    }

    pub fn rules(&self) -> &[StatusRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// 1回の実行に必要な設定
///
/// ログレベルや出力先はグローバルな状態に持たず、この構造体で受け渡す。
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub output_format: OutputFormat,
    pub destination: Destination,
    pub verbose: bool,
    /// 1ラウンドあたりの取得件数
    pub page_size: u32,
    /// 取得ラウンド数の上限（Noneなら全件取得するまで続ける）
    pub max_rounds: Option<u32>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self {
            output_format: OutputFormat::Table,
            destination: Destination::Stdout,
            verbose: false,
            page_size: DEFAULT_PAGE_SIZE,
            max_rounds: None,
        }
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn max_rounds(mut self, max_rounds: Option<u32>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// 取得開始前に設定を検証
    pub fn validate(&self) -> Result<(), Error> {
        if self.page_size == 0 {
            return Err(Error::InvalidConfiguration(
                "Page size must be greater than zero".to_string(),
            ));
        }
        if self.max_rounds == Some(0) {
            return Err(Error::InvalidConfiguration(
                "Round cap must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// ステータス設定の読み込み元の抽象化トレイト
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// ステータス設定を読み込み
    async fn load_status_config(&self) -> Result<StatusConfig, Error>;
}

/// JSONファイルベースの設定ストア
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 設定ファイルを探す
    ///
    /// 明示指定 → カレントディレクトリの `statuses.json` → `<config_dir>/jira-history/statuses.json` の順。
    pub fn locate(explicit: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }

        let local = PathBuf::from(STATUS_CONFIG_FILE);
        if local.exists() {
            return Ok(Self::new(local));
        }

        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::ConfigurationMissing(format!(
                "{} not found and no config directory available",
                STATUS_CONFIG_FILE
            ))
        })?;
        Ok(Self::new(config_dir.join("jira-history").join(STATUS_CONFIG_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load_status_config(&self) -> Result<StatusConfig, Error> {
        debug!("Loading status configuration from {}", self.path.display());

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigurationMissing(format!(
                    "Status configuration not found: {}",
                    self.path.display()
                ))
            } else {
                Error::IoError(e)
            }
        })?;

        StatusConfig::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_status_config_from_list() {
        let config = StatusConfig::from_json_str(
            r#"[
                {"name": "In Progress", "use_first": true},
                {"name": "Done", "use_first": false}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            config.rules(),
            &[
                StatusRule::new("In Progress", true),
                StatusRule::new("Done", false)
            ]
        );
        assert_eq!(config.rules()[1].occurrence(), Occurrence::Last);
    }

    #[test]
    fn test_status_config_from_map_keeps_order() {
        let config = StatusConfig::from_json_str(
            r#"{"Open": true, "In Review": true, "Closed": false, "Blocked": true}"#,
        )
        .unwrap();

        let names: Vec<&str> = config.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Open", "In Review", "Closed", "Blocked"]);
        assert!(!config.rules()[2].use_first);
    }

    #[test]
    fn test_status_config_rejects_non_bool_map_value() {
        let result = StatusConfig::from_json_str(r#"{"Done": "last"}"#);

        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_status_config_rejects_duplicates() {
        let result = StatusConfig::new(vec![
            StatusRule::new("Done", true),
            StatusRule::new("Done", false),
        ]);

        match result {
            Err(Error::InvalidConfiguration(msg)) => assert!(msg.contains("more than once")),
            other => panic!("Expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn test_status_config_rejects_descriptor_column_names() {
        let result = StatusConfig::new(vec![StatusRule::new("status", true)]);
        assert!(result.is_err());

        // 大文字小文字は区別する
        let result = StatusConfig::new(vec![StatusRule::new("Status", true)]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_status_config_rejects_empty_name() {
        assert!(StatusConfig::new(vec![StatusRule::new("  ", true)]).is_err());
    }

    #[test]
    fn test_status_config_invalid_json() {
        let result = StatusConfig::from_json_str("not json");

        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_run_config_validation() {
        assert!(RunConfig::new().validate().is_ok());
        assert!(RunConfig::new().page_size(0).validate().is_err());
        assert!(RunConfig::new().max_rounds(Some(0)).validate().is_err());
        assert!(RunConfig::new().max_rounds(Some(3)).validate().is_ok());
    }

    #[tokio::test]
    async fn test_file_config_store_loads_object_form() {
        // Given: オブジェクト形式の設定ファイル
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("statuses.json");
        std::fs::write(&path, r#"{"In Progress": true, "Done": false}"#).unwrap();
        let store = FileConfigStore::new(&path);

        // When
        let loaded = store.load_status_config().await.unwrap();

        // Then: 記述順のまま読み込まれる
        assert_eq!(
            loaded.rules(),
            &[
                StatusRule::new("In Progress", true),
                StatusRule::new("Done", false)
            ]
        );
    }

    #[tokio::test]
    async fn test_file_config_store_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileConfigStore::new(temp_dir.path().join("missing.json"));

        let result = store.load_status_config().await;

        assert!(matches!(result, Err(Error::ConfigurationMissing(_))));
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let store = FileConfigStore::locate(Some(Path::new("/tmp/custom.json"))).unwrap();

        assert_eq!(store.path(), Path::new("/tmp/custom.json"));
    }
}
