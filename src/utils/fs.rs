//! IO helper: safe file read/write for JSON

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::model::config_store::StoreError;
use crate::vm::constants::EMPTY_DOCUMENT_PLACEHOLDER;

/// 从文件读取JSON数据
pub fn read_json_file(p: &Path) -> Result<Value, StoreError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    // 读取阶段的IO错误（如路径是目录）按IO错误上报，而不是解析错误
    let v: Value = serde_json::from_reader(rdr).map_err(|e| {
        if e.is_io() {
            StoreError::Io(e.into())
        } else {
            StoreError::Parse(e)
        }
    })?;
    Ok(v)
}

/// 将JSON对象整体覆盖写入文件：键排序、两空格缩进
pub fn write_json_file(p: &Path, document: &Map<String, Value>) -> Result<(), StoreError> {
    // 显式排序，不依赖 serde_json 的 Map 实现
    let ordered: BTreeMap<&String, &Value> = document.iter().collect();
    let mut w = BufWriter::new(File::create(p)?);
    serde_json::to_writer_pretty(&mut w, &ordered)?;
    w.flush()?;
    Ok(())
}

/// 文件不存在时写入空对象占位内容
pub fn create_placeholder_file(p: &Path) -> Result<(), StoreError> {
    fs::write(p, EMPTY_DOCUMENT_PLACEHOLDER)?;
    Ok(())
}

/// 列出目录中以 `suffix` 结尾的条目名（去掉后缀，排序）
///
/// 只跳过真实目录；符号链接无论指向何处都保留。
pub fn list_stems_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<String>, StoreError> {
    let mut stems = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(stem) = name.strip_suffix(suffix) {
            stems.push(stem.to_string());
        }
    }
    stems.sort();
    Ok(stems)
}

/// 相对路径基于当前工作目录转为绝对路径（不要求文件存在）
pub fn absolutize(p: &Path) -> Result<PathBuf, StoreError> {
    if p.is_absolute() {
        Ok(p.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(p))
    }
}
