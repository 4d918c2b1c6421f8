//! 常量定义（消除魔法值）：存储、多语言、日志与命令行输出共用

// === 存储 ===
/// 未提供默认值时写回的内容
pub const EMPTY_DEFAULT: &str = "";
/// 文件缺失时创建的占位内容（可被解析为空对象）
pub const EMPTY_DOCUMENT_PLACEHOLDER: &str = "{\n}";

// === 多语言 ===
/// 语言不受支持时回退的语言标识
pub const DEFAULT_LOCALE: &str = "en";
/// 语言文件后缀
pub const JSON_SUFFIX: &str = ".json";

// === 日志 ===
pub const LOG_DIR: &str = "./logs/";
pub const LOG_SUFFIX: &str = ".txt";
/// 日志文件名中的时间格式
pub const LOG_FILE_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";
/// 日志行中的时间格式
pub const LOG_LINE_TIME_FORMAT: &str = "%H:%M:%S";
pub const DEFAULT_LOG_EXPIRATION_DAYS: i64 = 30;
pub const DEFAULT_THREAD_NAME: &str = "main";

pub const PRESET_LOGGING: &str = "{time} - {level} - {content}";
pub const PRESET_LOG4J2: &str = "[{time}] [{thread}/{level}] {content}";
pub const PRESET_LEVEL_EMPHASIZED: &str = "{level} - {time} >>> {content}";

// === 命令行输出 ===
pub const STATUS_STARTED: &str = "The program service is running normally...";
pub const STATUS_SHUTTING_DOWN: &str = "Shutting down...";
