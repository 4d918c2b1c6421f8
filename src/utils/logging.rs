//! Logging: 按启动时间命名的日志文件、过期清理、自定义行格式
//!
//! 启动时间由调用方显式传入；清理与文件命名都以它为准，不读取全局时钟。

use std::{
    fmt::{self, Write as _},
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{Local, NaiveDateTime};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        format::{FormatEvent, FormatFields, Writer},
        FmtContext,
    },
    registry::LookupSpan,
};

use crate::vm::constants::{
    DEFAULT_THREAD_NAME, LOG_FILE_TIME_FORMAT, LOG_LINE_TIME_FORMAT, LOG_SUFFIX, PRESET_LEVEL_EMPHASIZED,
    PRESET_LOG4J2, PRESET_LOGGING,
};

/// 日志行格式
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogPattern {
    Logging,
    #[default]
    Log4j2,
    LevelEmphasized,
    Custom(String),
}

impl LogPattern {
    pub fn template(&self) -> &str {
        match self {
            LogPattern::Logging => PRESET_LOGGING,
            LogPattern::Log4j2 => PRESET_LOG4J2,
            LogPattern::LevelEmphasized => PRESET_LEVEL_EMPHASIZED,
            LogPattern::Custom(s) => s,
        }
    }
}

impl std::str::FromStr for LogPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logging" => Ok(LogPattern::Logging),
            "log4j2" => Ok(LogPattern::Log4j2),
            "level-emphasized" => Ok(LogPattern::LevelEmphasized),
            other if other.contains('{') => Ok(LogPattern::Custom(other.to_string())),
            other => Err(format!(
                "未知日志格式: {other}（可选 logging / log4j2 / level-emphasized 或含占位符的模板）"
            )),
        }
    }
}

/// 填充 `{time}` `{thread}` `{level}` `{content}`，未知占位符输出为空
pub fn render_pattern(template: &str, time: &str, thread: &str, level: &str, content: &str) -> String {
    let mut out = String::with_capacity(template.len() + content.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        match &after[..end] {
            "time" => out.push_str(time),
            "thread" => out.push_str(thread),
            "level" => out.push_str(level),
            "content" => out.push_str(content),
            _ => {}
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// 按模板输出日志行的事件格式化器
#[derive(Debug, Clone, Default)]
pub struct PatternFormat {
    pattern: LogPattern,
    show_thread: bool,
}

impl PatternFormat {
    /// 默认格式（Log4j2）总是显示线程名
    pub fn new(pattern: Option<LogPattern>, show_thread: bool) -> Self {
        match pattern {
            Some(pattern) => Self { pattern, show_thread },
            None => Self { pattern: LogPattern::Log4j2, show_thread: true },
        }
    }
}

impl<S, N> FormatEvent<S, N> for PatternFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let mut content = String::new();
        ctx.format_fields(Writer::new(&mut content), event)?;

        let time = Local::now().format(LOG_LINE_TIME_FORMAT).to_string();
        let current = std::thread::current();
        let thread = if self.show_thread {
            current.name().unwrap_or(DEFAULT_THREAD_NAME)
        } else {
            ""
        };
        let level = level_name(event.metadata().level());

        let line = render_pattern(self.pattern.template(), &time, thread, level, &content);
        writeln!(writer, "{line}")
    }
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARN",
        Level::ERROR => "ERROR",
    }
}

/// 日志文件路径：`<dir>/<启动时间>.txt`
pub fn log_file_path(dir: &Path, started_at: NaiveDateTime) -> PathBuf {
    dir.join(format!("{}{}", started_at.format(LOG_FILE_TIME_FORMAT), LOG_SUFFIX))
}

/// 删除相对 `started_at` 已存在不少于 `expiration_days` 天的日志，返回被删除的文件
///
/// 文件名无法解析为时间的 `.txt` 文件保持不动。
pub fn remove_expired_logs(
    dir: &Path,
    started_at: NaiveDateTime,
    expiration_days: i64,
) -> io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(stem) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(LOG_SUFFIX))
        else {
            continue;
        };
        let Ok(created) = NaiveDateTime::parse_from_str(stem, LOG_FILE_TIME_FORMAT) else {
            continue;
        };
        if (started_at - created).num_days() >= expiration_days {
            fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}

/// 创建日志目录、清理过期日志，并以追加模式打开本次运行的日志文件
pub fn open_log_file(
    dir: &Path,
    started_at: NaiveDateTime,
    expiration_days: i64,
) -> io::Result<(PathBuf, File)> {
    fs::create_dir_all(dir)?;
    remove_expired_logs(dir, started_at, expiration_days)?;
    let path = log_file_path(dir, started_at);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// 安装写入日志文件的全局订阅者
pub fn init_file_logging(
    dir: &Path,
    started_at: NaiveDateTime,
    expiration_days: i64,
    format: PatternFormat,
    max_level: Level,
) -> io::Result<PathBuf> {
    let (path, file) = open_log_file(dir, started_at, expiration_days)?;
    let _ = tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_max_level(max_level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .event_format(format)
        .try_init();
    Ok(path)
}

/// 安装输出到标准错误的订阅者
pub fn init_stderr_logging(max_level: Level) {
    let _ = tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .try_init();
}
