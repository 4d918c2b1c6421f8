//! JSON文件键值存储库
//!
//! 提供以JSON文件为后端的配置存储（带校验的读取与默认值回写）、
//! 按语言切换的多语言存储、字典查询辅助，以及带过期清理的日志文件

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::config_store::{ConfigStore, StoreError, ValueKind, Verification, VerificationFailure};
pub use model::locale_store::LocaleStore;
pub use utils::logging::{LogPattern, PatternFormat};
