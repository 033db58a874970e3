//! Variant Key & Combination Generator
//!
//! 变体键是组合的身份：对 (attributeId, valueId) 集合按 (attribute, value)
//! 排序后用固定分隔符拼接 valueId。集合相等的输入 (无论顺序、无论重复)
//! 产生相同的键。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::core::{AppError, AppResult};
use crate::db::models::VariantPair;

/// 键分隔符
pub const KEY_SEPARATOR: &str = "|";

/// 计算 pair 集合的规范键
///
/// 重复提交的 pair 会被去重；输入顺序不影响结果
pub fn canonical_key(pairs: &[VariantPair]) -> String {
    let mut sorted: Vec<(String, String)> = pairs
        .iter()
        .map(|p| (p.attribute.to_string(), p.value.to_string()))
        .collect();
    sorted.sort();
    sorted.dedup();
    sorted
        .into_iter()
        .map(|(_, value)| value)
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// 一个组合轴：属性 + 该属性参与组合的值列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationAxis {
    pub attribute: RecordId,
    pub values: Vec<RecordId>,
}

/// 枚举出的一个组合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combination {
    pub attributes: Vec<VariantPair>,
    pub variant_key: String,
}

/// 笛卡尔积枚举全部组合
///
/// - 空轴列表 -> 空结果 (成功)
/// - 某个轴没有值 -> 校验错误 (拒绝，而不是静默丢弃该轴)
/// - 轴内重复的值只计一次 (按键去重)
pub fn generate_combinations(axes: &[CombinationAxis]) -> AppResult<Vec<Combination>> {
    if axes.is_empty() {
        return Ok(vec![]);
    }
    for axis in axes {
        if axis.values.is_empty() {
            return Err(AppError::validation(format!(
                "attribute {} supplies no values",
                axis.attribute
            )));
        }
    }

    let mut tuples: Vec<Vec<VariantPair>> = vec![vec![]];
    for axis in axes {
        let mut next = Vec::with_capacity(tuples.len() * axis.values.len());
        for tuple in &tuples {
            for value in &axis.values {
                let mut extended = tuple.clone();
                extended.push(VariantPair {
                    attribute: axis.attribute.clone(),
                    value: value.clone(),
                });
                next.push(extended);
            }
        }
        tuples = next;
    }

    let mut seen = HashSet::new();
    let mut combinations = Vec::with_capacity(tuples.len());
    for pairs in tuples {
        let variant_key = canonical_key(&pairs);
        if seen.insert(variant_key.clone()) {
            combinations.push(Combination {
                attributes: pairs,
                variant_key,
            });
        }
    }
    Ok(combinations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(key: &str) -> RecordId {
        RecordId::from_table_key("attribute", key)
    }

    fn val(key: &str) -> RecordId {
        RecordId::from_table_key("attribute_value", key)
    }

    fn pair(a: &str, v: &str) -> VariantPair {
        VariantPair {
            attribute: attr(a),
            value: val(v),
        }
    }

    #[test]
    fn test_canonical_key_is_permutation_invariant() {
        let forward = canonical_key(&[pair("color", "red"), pair("size", "m")]);
        let reversed = canonical_key(&[pair("size", "m"), pair("color", "red")]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_canonical_key_ignores_duplicate_pairs() {
        let plain = canonical_key(&[pair("color", "red"), pair("size", "m")]);
        let doubled = canonical_key(&[
            pair("color", "red"),
            pair("size", "m"),
            pair("color", "red"),
        ]);
        assert_eq!(plain, doubled);
    }

    #[test]
    fn test_generate_combinations_cartesian_product() {
        let axes = vec![
            CombinationAxis {
                attribute: attr("color"),
                values: vec![val("red"), val("blue")],
            },
            CombinationAxis {
                attribute: attr("size"),
                values: vec![val("m"), val("l")],
            },
        ];
        let combos = generate_combinations(&axes).expect("generation should succeed");
        assert_eq!(combos.len(), 4);

        let keys: HashSet<_> = combos.iter().map(|c| c.variant_key.clone()).collect();
        assert_eq!(keys.len(), 4, "all keys distinct");
        assert!(keys.contains(&canonical_key(&[pair("color", "red"), pair("size", "l")])));
    }

    #[test]
    fn test_generate_combinations_empty_axis_rejected() {
        let axes = vec![CombinationAxis {
            attribute: attr("color"),
            values: vec![],
        }];
        let err = generate_combinations(&axes).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_generate_combinations_no_axes_is_empty_success() {
        let combos = generate_combinations(&[]).expect("empty axes is not an error");
        assert!(combos.is_empty());
    }

    #[test]
    fn test_generate_combinations_dedupes_repeated_values() {
        let axes = vec![CombinationAxis {
            attribute: attr("color"),
            values: vec![val("red"), val("red"), val("blue")],
        }];
        let combos = generate_combinations(&axes).expect("generation should succeed");
        assert_eq!(combos.len(), 2);
    }
}
