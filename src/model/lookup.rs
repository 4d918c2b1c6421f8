//! 字典查询辅助：针对值为定长数组的 JSON 对象，按位置或按值反查键

use serde_json::{Map, Value};

/// 取每个条目数组中第 `order` 个元素；数组不够长（或不是数组）时用 `completion` 补齐
pub fn values_at(map: &Map<String, Value>, order: usize, completion: &Value) -> Vec<Value> {
    map.values()
        .map(|v| element_at(v, order).unwrap_or(completion).clone())
        .collect()
}

/// 值整体等于 `target` 的所有键
pub fn keys_by_value<'a>(map: &'a Map<String, Value>, target: &Value) -> Vec<&'a str> {
    map.iter()
        .filter(|(_, v)| *v == target)
        .map(|(k, _)| k.as_str())
        .collect()
}

/// 数组第 `order` 个元素等于 `target` 的所有键
pub fn keys_by_value_at<'a>(
    map: &'a Map<String, Value>,
    target: &Value,
    order: usize,
) -> Vec<&'a str> {
    map.iter()
        .filter(|(_, v)| element_at(v, order) == Some(target))
        .map(|(k, _)| k.as_str())
        .collect()
}

fn element_at(v: &Value, order: usize) -> Option<&Value> {
    v.as_array().and_then(|items| items.get(order))
}
