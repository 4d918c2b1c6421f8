//! ConfigStore：以单个JSON文件为后端的键值存储
//!
//! 构造时整体加载文件；每次修改后整体覆盖写回（键排序、两空格缩进），
//! 不做增量写入，也不加文件锁，同一路径多个实例时以最后一次写入为准。

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::utils::fs::{absolutize, create_placeholder_file, read_json_file, write_json_file};
use crate::vm::constants::EMPTY_DEFAULT;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO失败: {0}")]
    Io(#[from] io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("顶层不是JSON对象: {}", .0.display())]
    NotAnObject(PathBuf),
    #[error("语言目录错误: {0}")]
    Locale(String),
}

/// JSON 值类型（用于类型校验）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl ValueKind {
    pub fn of(v: &Value) -> Self {
        match v {
            Value::Object(_) => ValueKind::Object,
            Value::Array(_) => ValueKind::Array,
            Value::String(_) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::Bool(_) => ValueKind::Bool,
            Value::Null => ValueKind::Null,
        }
    }
}

/// 校验失败的环节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationFailure {
    /// 类型不在允许列表中
    TypeNotAllowed,
    /// 类型在禁止列表中
    TypeForbidden,
    /// 值不在候选列表中
    NotOneOf,
    /// 值在排除列表中
    Excluded,
}

/// 读取时对已存值的可选校验，按字段顺序依次检查，首个失败即停止
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Verification {
    pub types: Option<Vec<ValueKind>>,
    pub not_types: Option<Vec<ValueKind>>,
    pub one_of: Option<Vec<Value>>,
    pub none_of: Option<Vec<Value>>,
}

impl Verification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(mut self, kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        self.types = Some(kinds.into_iter().collect());
        self
    }

    pub fn not_types(mut self, kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        self.not_types = Some(kinds.into_iter().collect());
        self
    }

    pub fn one_of(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.one_of = Some(values.into_iter().collect());
        self
    }

    pub fn none_of(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.none_of = Some(values.into_iter().collect());
        self
    }

    pub fn check(&self, value: &Value) -> Result<(), VerificationFailure> {
        let kind = ValueKind::of(value);
        if let Some(types) = &self.types {
            if !types.contains(&kind) {
                return Err(VerificationFailure::TypeNotAllowed);
            }
        }
        if let Some(not_types) = &self.not_types {
            if not_types.contains(&kind) {
                return Err(VerificationFailure::TypeForbidden);
            }
        }
        if let Some(one_of) = &self.one_of {
            if !one_of.iter().any(|v| values_equal(v, value)) {
                return Err(VerificationFailure::NotOneOf);
            }
        }
        if let Some(none_of) = &self.none_of {
            if none_of.iter().any(|v| values_equal(v, value)) {
                return Err(VerificationFailure::Excluded);
            }
        }
        Ok(())
    }
}

/// JSON值相等判断：数字按数值比较（`1` 与 `1.0` 相等），容器逐元素比较
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        // 整数之间精确比较，含浮点时按浮点比较
        (Value::Number(x), Value::Number(y)) if x.is_f64() || y.is_f64() => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

#[derive(Debug)]
pub struct ConfigStore {
    file_path: PathBuf,
    document: Map<String, Value>,
}

impl ConfigStore {
    /// 打开（或创建）JSON文件，相对路径基于当前工作目录
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file_path = absolutize(path.as_ref())?;
        let document = load_or_create(&file_path)?;
        Ok(Self { file_path, document })
    }

    /// 丢弃内存中的文档，重新从文件加载
    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.document = load_or_create(&self.file_path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }

    /// 读取 `key` 的值。
    ///
    /// 键不存在或已存值未通过 `verification` 时，写回默认值并返回它；
    /// `default_value` 为 `None` 时写回并返回空字符串。
    pub fn search(
        &mut self,
        key: &str,
        default_value: Option<Value>,
        verification: &Verification,
    ) -> Result<Value, StoreError> {
        match self.document.get(key) {
            Some(value) => match verification.check(value) {
                Ok(()) => return Ok(value.clone()),
                Err(failure) => {
                    tracing::warn!(key, ?failure, "存储值未通过校验，重置为默认值");
                }
            },
            None => tracing::debug!(key, "键不存在，写入默认值"),
        }
        self.save_default_value(key, default_value)
    }

    /// 将默认值写回文档并返回实际写入的值
    pub fn save_default_value(
        &mut self,
        key: &str,
        default_value: Option<Value>,
    ) -> Result<Value, StoreError> {
        let value = default_value.unwrap_or_else(|| Value::String(EMPTY_DEFAULT.to_string()));
        self.edit(key, value.clone())?;
        Ok(value)
    }

    /// 无条件设置 `key` 并立即整体写回文件
    pub fn edit(&mut self, key: impl Into<String>, new_value: Value) -> Result<(), StoreError> {
        self.document.insert(key.into(), new_value);
        self.write_json()
    }

    /// 将当前文档整体覆盖写入文件
    pub fn write_json(&self) -> Result<(), StoreError> {
        write_json_file(&self.file_path, &self.document)?;
        tracing::debug!("JSON文件已保存到: {}", self.file_path.display());
        Ok(())
    }
}

fn load_or_create(path: &Path) -> Result<Map<String, Value>, StoreError> {
    match read_json_file(path) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::NotAnObject(path.to_path_buf())),
        Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            create_placeholder_file(path)?;
            tracing::info!("已创建空JSON文件: {}", path.display());
            Ok(Map::new())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::{tempdir, NamedTempFile};
    use std::io::Write;

    /// 创建临时JSON文件用于测试
    fn create_test_json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("创建临时文件失败");
        file.write_all(content.as_bytes()).expect("写入临时文件失败");
        file
    }

    fn file_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_open_missing_file_creates_placeholder() {
        let dir = tempdir().expect("创建临时目录失败");
        let path = dir.path().join("cfg.json");

        let store = ConfigStore::open(&path).expect("打开应该成功");

        assert!(store.document().is_empty(), "新建文档应为空");
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n}");
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_search_missing_key_persists_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let mut store = ConfigStore::open(&path).unwrap();

        let value = store.search("volume", Some(json!(75)), &Verification::new()).unwrap();

        assert_eq!(value, json!(75));
        assert_eq!(file_json(&path), json!({"volume": 75}));
        // 再次读取（无校验）应返回已持久化的默认值
        let again = store.search("volume", Some(json!(0)), &Verification::new()).unwrap();
        assert_eq!(again, json!(75));
    }

    #[test]
    fn test_search_without_default_persists_empty_string() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let mut store = ConfigStore::open(&path).unwrap();

        let value = store.search("title", None, &Verification::new()).unwrap();

        assert_eq!(value, json!(""));
        assert_eq!(file_json(&path), json!({"title": ""}));
    }

    #[test]
    fn test_explicit_error_default_is_real_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let mut store = ConfigStore::open(&path).unwrap();

        let value = store.search("status", Some(json!("Error")), &Verification::new()).unwrap();

        assert_eq!(value, json!("Error"));
        assert_eq!(file_json(&path), json!({"status": "Error"}));
    }

    #[test]
    fn test_search_one_of_resets_invalid_value() {
        let temp_file = create_test_json_file(r#"{"mode": "turbo", "other": 1}"#);
        let mut store = ConfigStore::open(temp_file.path()).unwrap();

        let check = Verification::new().one_of([json!("auto"), json!("manual")]);
        let value = store.search("mode", Some(json!("auto")), &check).unwrap();

        assert_eq!(value, json!("auto"));
        assert_eq!(file_json(temp_file.path()), json!({"mode": "auto", "other": 1}));
    }

    #[test]
    fn test_search_type_mismatch_resets_value() {
        let temp_file = create_test_json_file(r#"{"volume": "loud"}"#);
        let mut store = ConfigStore::open(temp_file.path()).unwrap();

        let check = Verification::new().types([ValueKind::Number]);
        let value = store.search("volume", Some(json!(50)), &check).unwrap();

        assert_eq!(value, json!(50));
        assert_eq!(store.get("volume"), Some(&json!(50)));
        // 重置后再次读取返回默认值而不是原来的错误值
        assert_eq!(store.search("volume", None, &check).unwrap(), json!(50));
    }

    #[test]
    fn test_search_not_types_and_none_of() {
        let temp_file = create_test_json_file(r#"{"a": null, "b": "root", "c": "guest"}"#);
        let mut store = ConfigStore::open(temp_file.path()).unwrap();

        let not_null = Verification::new().not_types([ValueKind::Null]);
        assert_eq!(store.search("a", Some(json!(false)), &not_null).unwrap(), json!(false));

        let not_root = Verification::new().none_of([json!("root")]);
        assert_eq!(store.search("b", None, &not_root).unwrap(), json!(""));
        assert_eq!(store.search("c", None, &not_root).unwrap(), json!("guest"));
    }

    #[test]
    fn test_search_valid_value_is_untouched() {
        let content = r#"{"items": [1, 2], "name": "ok"}"#;
        let temp_file = create_test_json_file(content);
        let mut store = ConfigStore::open(temp_file.path()).unwrap();

        let check = Verification::new()
            .types([ValueKind::Array, ValueKind::String])
            .not_types([ValueKind::Null]);
        assert_eq!(store.search("items", None, &check).unwrap(), json!([1, 2]));
        assert_eq!(store.search("name", None, &check).unwrap(), json!("ok"));

        // 未发生写回，文件保持原样
        assert_eq!(fs::read_to_string(temp_file.path()).unwrap(), content);
    }

    #[test]
    fn test_verification_short_circuits_in_order() {
        let check = Verification::new()
            .types([ValueKind::String])
            .not_types([ValueKind::Number])
            .one_of([json!("x")])
            .none_of([json!(1)]);

        assert_eq!(check.check(&json!(1)), Err(VerificationFailure::TypeNotAllowed));
        assert_eq!(check.check(&json!("y")), Err(VerificationFailure::NotOneOf));
        assert_eq!(check.check(&json!("x")), Ok(()));

        let excluded = Verification::new().not_types([ValueKind::Bool]).none_of([json!("x")]);
        assert_eq!(excluded.check(&json!(true)), Err(VerificationFailure::TypeForbidden));
        assert_eq!(excluded.check(&json!("x")), Err(VerificationFailure::Excluded));
    }

    #[test]
    fn test_membership_compares_numbers_by_value() {
        let temp_file = create_test_json_file(r#"{"rate": 1.0, "level": [2.0, {"n": 3}], "bad": 0}"#);
        let mut store = ConfigStore::open(temp_file.path()).unwrap();

        let one = Verification::new().one_of([json!(1), json!(5)]);
        assert_eq!(store.search("rate", Some(json!(5)), &one).unwrap(), json!(1.0));

        let nested = Verification::new().one_of([json!([2, {"n": 3.0}])]);
        assert_eq!(store.search("level", None, &nested).unwrap(), json!([2.0, {"n": 3}]));

        let not_zero = Verification::new().none_of([json!(0.0)]);
        assert_eq!(store.search("bad", Some(json!(1)), &not_zero).unwrap(), json!(1));

        // 布尔值与数字不相等
        assert!(!values_equal(&json!(true), &json!(1)));
        assert!(!values_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn test_open_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let result = ConfigStore::open(dir.path());
        assert!(matches!(result, Err(StoreError::Io(_))), "目录不是JSON文件，应返回IO错误");
    }

    #[test]
    fn test_verification_from_json() {
        let check: Verification =
            serde_json::from_value(json!({"types": ["string", "array"], "none_of": [""]})).unwrap();
        assert_eq!(check.types, Some(vec![ValueKind::String, ValueKind::Array]));
        assert_eq!(check.none_of, Some(vec![json!("")]));
        assert!(check.one_of.is_none());

        let unknown = serde_json::from_value::<Verification>(json!({"kinds": []}));
        assert!(unknown.is_err(), "未知字段应被拒绝");
    }

    #[test]
    fn test_edit_round_trip_through_fresh_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        {
            let mut store = ConfigStore::open(&path).unwrap();
            store.edit("zoom", json!(1.5)).unwrap();
            store.edit("alpha", json!({"nested": [true, null]})).unwrap();
        }

        let reopened = ConfigStore::open(&path).unwrap();
        assert_eq!(reopened.get("zoom"), Some(&json!(1.5)));
        assert_eq!(reopened.get("alpha"), Some(&json!({"nested": [true, null]})));

        let text = fs::read_to_string(&path).unwrap();
        let alpha = text.find("\"alpha\"").unwrap();
        let zoom = text.find("\"zoom\"").unwrap();
        assert!(alpha < zoom, "写出的键应按顺序排列");
        assert!(text.contains("\n  \"zoom\": 1.5"), "应使用两空格缩进");
    }

    #[test]
    fn test_reload_discards_unsaved_state() {
        let temp_file = create_test_json_file(r#"{"k": 1}"#);
        let mut store = ConfigStore::open(temp_file.path()).unwrap();

        fs::write(temp_file.path(), r#"{"k": 2}"#).unwrap();
        store.reload().unwrap();

        assert_eq!(store.get("k"), Some(&json!(2)));
    }

    #[test]
    fn test_malformed_json_propagates_and_keeps_file() {
        let content = r#"{"broken": "#;
        let temp_file = create_test_json_file(content);

        let result = ConfigStore::open(temp_file.path());

        assert!(matches!(result, Err(StoreError::Parse(_))), "无效JSON应返回解析错误");
        assert_eq!(fs::read_to_string(temp_file.path()).unwrap(), content, "原文件不应被覆盖");
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let temp_file = create_test_json_file("[1, 2, 3]");
        let result = ConfigStore::open(temp_file.path());
        assert!(matches!(result, Err(StoreError::NotAnObject(_))));
    }

    #[test]
    fn test_write_failure_propagates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("cfg.json");

        let result = ConfigStore::open(&path);
        assert!(matches!(result, Err(StoreError::Io(_))), "父目录不存在时应返回IO错误");
    }
}
