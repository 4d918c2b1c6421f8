//! 程序入口：初始化日志，按子命令读写JSON存储
//!
//! ```text
//! json_locale_store [--log | --log-dir DIR] get <FILE> <KEY> [--default JSON] [--verify JSON]
//! json_locale_store set <FILE> <KEY> <JSON>
//! json_locale_store locales <DIR>
//! json_locale_store text <DIR> <LOCALE> <KEY>
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::Level;

use json_locale_store::utils::logging::{init_file_logging, init_stderr_logging};
use json_locale_store::vm::constants::{
    DEFAULT_LOG_EXPIRATION_DAYS, LOG_DIR, STATUS_SHUTTING_DOWN, STATUS_STARTED,
};
use json_locale_store::{ConfigStore, LocaleStore, LogPattern, PatternFormat, Verification};

#[derive(Debug, Parser)]
#[command(name = "json_locale_store", version, about = "JSON文件键值存储与多语言文本工具")]
struct Cli {
    /// 输出DEBUG级别日志
    #[arg(long, short)]
    verbose: bool,

    /// 日志写入 ./logs/ 目录；与 --log-dir 均未给出时日志输出到标准错误
    #[arg(long)]
    log: bool,

    /// 写入日志文件的目录（优先于 --log）
    #[arg(long, env = "JLS_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// 日志文件保留天数
    #[arg(long, default_value_t = DEFAULT_LOG_EXPIRATION_DAYS, env = "JLS_LOG_EXPIRATION_DAYS")]
    log_expiration_days: i64,

    /// logging / log4j2 / level-emphasized，或含 {time} {thread} {level} {content} 的模板
    #[arg(long)]
    log_pattern: Option<LogPattern>,

    /// 日志行中显示线程名（默认格式总是显示）
    #[arg(long)]
    log_thread: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 读取键值；缺失或校验失败时写回默认值
    Get {
        file: PathBuf,
        key: String,
        /// 默认值（JSON；无法解析时按字符串处理）
        #[arg(long)]
        default: Option<String>,
        /// 校验规则，如 {"types":["string"],"one_of":["auto","manual"]}
        #[arg(long)]
        verify: Option<String>,
    },
    /// 设置键值并写回文件
    Set {
        file: PathBuf,
        key: String,
        /// 新值（JSON；无法解析时按字符串处理）
        value: String,
    },
    /// 列出语言目录中的语言
    Locales { dir: PathBuf },
    /// 切换到指定语言并读取翻译文本
    Text {
        dir: PathBuf,
        locale: String,
        key: String,
    },
}

/// 命令行参数优先按JSON解析，失败时作为字符串
fn json_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_value(value: &Value) -> Result<()> {
    match value {
        Value::String(s) => println!("{s}"),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Get { file, key, default, verify } => {
            let verification = match verify {
                Some(raw) => serde_json::from_str::<Verification>(&raw)
                    .with_context(|| format!("校验规则无效: {raw}"))?,
                None => Verification::default(),
            };
            let mut store = ConfigStore::open(&file)
                .with_context(|| format!("无法打开 {}", file.display()))?;
            let value = store.search(&key, default.as_deref().map(json_arg), &verification)?;
            print_value(&value)
        }
        Command::Set { file, key, value } => {
            let mut store = ConfigStore::open(&file)
                .with_context(|| format!("无法打开 {}", file.display()))?;
            store.edit(key, json_arg(&value))?;
            Ok(())
        }
        Command::Locales { dir } => {
            for locale in LocaleStore::available_locales(&dir)? {
                println!("{locale}");
            }
            Ok(())
        }
        Command::Text { dir, locale, key } => {
            let mut store = LocaleStore::open_preferred(&locale, &dir)
                .with_context(|| format!("无法打开语言目录 {}", dir.display()))?;
            let text = store.get_text(&key)?;
            print_value(&text)
        }
    }
}

impl Cli {
    /// 实际使用的日志目录；`None` 表示输出到标准错误
    fn log_dir(&self) -> Option<PathBuf> {
        match (&self.log_dir, self.log) {
            (Some(dir), _) => Some(dir.clone()),
            (None, true) => Some(PathBuf::from(LOG_DIR)),
            (None, false) => None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_dir = cli.log_dir();
    // 启动时间：日志文件命名与过期判断均以此为准
    let started_at = Local::now().naive_local();

    let max_level = if cli.verbose {
        Level::DEBUG
    } else if log_dir.is_some() {
        Level::INFO
    } else {
        Level::WARN
    };

    match &log_dir {
        Some(dir) => {
            let format = PatternFormat::new(cli.log_pattern.clone(), cli.log_thread);
            let path = init_file_logging(dir, started_at, cli.log_expiration_days, format, max_level)
                .with_context(|| format!("无法初始化日志目录 {}", dir.display()))?;
            tracing::debug!("日志文件: {}", path.display());
        }
        None => init_stderr_logging(max_level),
    }
    tracing::info!("{}", STATUS_STARTED);

    let result = run(cli.command);
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }

    tracing::info!("{}", STATUS_SHUTTING_DOWN);
    result
}
