//! レポートの出力フォーマットと出力先
//!
//! 表・JSON・区切り文字（CSV/TSV）の3形式に対応する。
//! 同じレポートと形式からは常に同じバイト列を生成する。

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tabled::{builder::Builder, settings::Style};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::report::Report;
use crate::Error;

/// 区切り文字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Comma,
    Tab,
}

impl Separator {
    pub fn as_char(&self) -> char {
        match self {
            Separator::Comma => ',',
            Separator::Tab => '\t',
        }
    }
}

/// 出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Delimited(Separator),
}

impl OutputFormat {
    /// 形式に対応するフォーマッターを作成
    pub fn formatter(&self) -> Box<dyn ReportFormatter> {
        match self {
            OutputFormat::Table => Box::new(TableFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
            OutputFormat::Delimited(separator) => Box::new(DelimitedFormatter::new(*separator)),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Delimited(Separator::Comma)),
            "tsv" => Ok(OutputFormat::Delimited(Separator::Tab)),
            other => Err(Error::InvalidConfiguration(format!(
                "Unknown output format '{}' (expected table, json, csv or tsv)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Delimited(Separator::Comma) => "csv",
            OutputFormat::Delimited(Separator::Tab) => "tsv",
        };
        f.write_str(name)
    }
}

/// レポートを文字列に整形するトレイト
pub trait ReportFormatter {
    fn format(&self, report: &Report) -> Result<String, Error>;
}

/// 整列した表形式
pub struct TableFormatter;

impl ReportFormatter for TableFormatter {
    fn format(&self, report: &Report) -> Result<String, Error> {
        if report.is_empty() {
            return Ok("No data.".to_string());
        }

        let mut builder = Builder::default();
        builder.push_record(report.columns().iter().cloned());
        for row in report.rows() {
            builder.push_record(
                row.values()
                    .into_iter()
                    .map(|v| v.unwrap_or_default().to_string()),
            );
        }

        let mut table = builder.build();
        table.with(Style::psql());

        Ok(table.to_string())
    }
}

/// オブジェクトの配列としてのJSON（日付なしは `null`）
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &Report) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(report.rows())?)
    }
}

/// ヘッダー行付きの区切り文字形式
pub struct DelimitedFormatter {
    separator: Separator,
}

impl DelimitedFormatter {
    pub fn new(separator: Separator) -> Self {
        Self { separator }
    }

    fn push_line<'a>(&self, out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
        let sep = self.separator.as_char();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push(sep);
            }
            out.push_str(&escape_field(field, sep));
        }
        out.push('\n');
    }
}

impl ReportFormatter for DelimitedFormatter {
    fn format(&self, report: &Report) -> Result<String, Error> {
        let mut out = String::new();
        self.push_line(&mut out, report.columns().iter().map(String::as_str));
        for row in report.rows() {
            self.push_line(
                &mut out,
                row.values().into_iter().map(|v| v.unwrap_or_default()),
            );
        }
        Ok(out)
    }
}

/// 区切り文字・引用符・改行を含む値をダブルクォートで囲む
fn escape_field(field: &str, sep: char) -> Cow<'_, str> {
    let needs_quotes = field
        .chars()
        .any(|c| c == sep || c == '"' || c == '\n' || c == '\r');

    if needs_quotes {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// レポートを指定形式で整形
pub fn render(report: &Report, format: OutputFormat) -> Result<String, Error> {
    debug!("Rendering {} row(s) as {}", report.len(), format);
    format.formatter().format(report)
}

/// 出力先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Destination::File(path),
            None => Destination::Stdout,
        }
    }

    /// 整形済みのレポートを書き出す
    pub async fn write(&self, text: &str) -> Result<(), Error> {
        match self {
            Destination::Stdout => {
                let mut stdout = tokio::io::stdout();
                write_to(&mut stdout, text).await
            }
            Destination::File(path) => write_file(path, text).await,
        }
    }
}

/// ストリームへ一括で書き出す（末尾に改行を保証）
pub async fn write_to<W>(writer: &mut W, text: &str) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await?;
    if !text.ends_with('\n') {
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    Ok(())
}

/// 同じディレクトリの一時ファイルに書いてからリネームする
async fn write_file(path: &Path, text: &str) -> Result<(), Error> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Not a file path: {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    let outcome = write_and_rename(&temp_path, path, text).await;
    if outcome.is_err() {
        let _ = fs::remove_file(&temp_path).await;
    }
    outcome?;

    info!("Wrote report to {}", path.display());
    Ok(())
}

async fn write_and_rename(temp_path: &Path, path: &Path, text: &str) -> std::io::Result<()> {
    fs::write(temp_path, text).await?;
    fs::rename(temp_path, path).await
}
