//! LocaleStore：按语言切换的 ConfigStore，每种语言对应目录下的 `<locale>.json`

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::model::config_store::{ConfigStore, StoreError, ValueKind, Verification};
use crate::utils::fs::list_stems_with_suffix;
use crate::vm::constants::{DEFAULT_LOCALE, JSON_SUFFIX};

#[derive(Debug)]
pub struct LocaleStore {
    store: ConfigStore,
    locale: String,
    lang_dir: PathBuf,
    supported_locales: Vec<String>,
}

impl LocaleStore {
    /// 打开 `lang_dir/<locale>.json`，并扫描目录得到支持的语言列表
    pub fn open(locale: &str, lang_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let lang_dir = lang_dir.as_ref().to_path_buf();
        let store = ConfigStore::open(locale_file(&lang_dir, locale))?;
        let supported_locales = Self::available_locales(&lang_dir)?;
        Ok(Self {
            store,
            locale: locale.to_string(),
            lang_dir,
            supported_locales,
        })
    }

    /// 先扫描语言列表，再直接打开 `preferred`（不受支持时打开默认语言），
    /// 不会触碰其他语言文件
    pub fn open_preferred(preferred: &str, lang_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let lang_dir = lang_dir.as_ref();
        let supported = Self::available_locales(lang_dir)?;
        Self::open(resolve_locale(&supported, preferred), lang_dir)
    }

    /// 扫描目录中的 `*.json` 文件，去掉后缀得到语言列表（排序）
    pub fn available_locales(lang_dir: &Path) -> Result<Vec<String>, StoreError> {
        list_stems_with_suffix(lang_dir, JSON_SUFFIX)
            .map_err(|e| StoreError::Locale(format!("{}: {e}", lang_dir.display())))
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn lang_dir(&self) -> &Path {
        &self.lang_dir
    }

    pub fn supported_locales(&self) -> &[String] {
        &self.supported_locales
    }

    pub fn is_supported(&self, locale: &str) -> bool {
        self.supported_locales.iter().any(|l| l == locale)
    }

    /// 切换语言；不受支持时回退到默认语言。
    ///
    /// 新的文档与语言列表全部构建成功后才替换当前状态，
    /// 内存中未写回的内容随旧文档一起丢弃。
    pub fn set_locale(&mut self, new_locale: &str) -> Result<(), StoreError> {
        let locale = resolve_locale(&self.supported_locales, new_locale);
        let reloaded = Self::open(locale, &self.lang_dir)?;
        *self = reloaded;
        tracing::info!("当前语言: {}", self.locale);
        Ok(())
    }

    /// 读取翻译文本：值必须是字符串或字符串列表（多个变体），否则重置为空字符串
    pub fn get_text(&mut self, key: &str) -> Result<Value, StoreError> {
        let check = Verification::new().types([ValueKind::Array, ValueKind::String]);
        self.store.search(key, None, &check)
    }

    pub fn search(
        &mut self,
        key: &str,
        default_value: Option<Value>,
        verification: &Verification,
    ) -> Result<Value, StoreError> {
        self.store.search(key, default_value, verification)
    }

    pub fn edit(&mut self, key: impl Into<String>, new_value: Value) -> Result<(), StoreError> {
        self.store.edit(key, new_value)
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }
}

fn resolve_locale<'a>(supported: &[String], requested: &'a str) -> &'a str {
    if supported.iter().any(|l| l == requested) {
        requested
    } else {
        tracing::info!("语言 {} 不受支持，回退到 {}", requested, DEFAULT_LOCALE);
        DEFAULT_LOCALE
    }
}

fn locale_file(lang_dir: &Path, locale: &str) -> PathBuf {
    lang_dir.join(format!("{locale}{JSON_SUFFIX}"))
}
