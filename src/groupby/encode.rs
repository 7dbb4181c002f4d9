//! キー列ごとのコード化
//!
//! 各キー列を、キーの順序を保つ行ごとの整数コードに変換します。
//! カテゴリカルキーは水準の位置を、それ以外のキーは観測された値の密な順位を使います。
//! 欠損値はそのキーの最後のコードになります。

use std::cmp::Ordering;

use log::trace;
use rayon::prelude::*;

use crate::column::{KeyVector, StringCategorical, MISSING_CODE};
use crate::config::GroupingConfig;
use crate::error::{Error, Result};

/// 解決済みのグループ化キー（名前と値）
pub type NamedKey<'a> = (&'a str, &'a KeyVector);

/// 1つのキー列のコード
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyCodes {
    /// 行ごとのコード（`[0, cardinality)`）
    pub codes: Vec<u32>,
    /// このキーのコードの数
    pub cardinality: usize,
    /// 各コードを最初に持つ行（カテゴリカルキーでは空）
    pub representatives: Vec<usize>,
}

/// 1つのキー列をコード化
pub(crate) fn encode_key(key: &KeyVector) -> KeyCodes {
    match key {
        KeyVector::Categorical(cat) => encode_categorical(cat),
        KeyVector::Int64(values) => rank_codes(values, |a, b| a.cmp(b)),
        KeyVector::Float64(values) => {
            let normalized: Vec<_> = values.iter().map(|v| v.normalized()).collect();
            rank_codes(&normalized, |a, b| a.total_cmp_na_last(b))
        }
        KeyVector::String(values) => rank_codes(values, |a, b| a.cmp(b)),
        KeyVector::Boolean(values) => rank_codes(values, |a, b| a.cmp(b)),
    }
}

/// 各キーの長さが`n_rows`と一致するか確認
pub(crate) fn check_arity(keys: &[NamedKey<'_>], n_rows: usize) -> Result<()> {
    for (name, values) in keys {
        if values.len() != n_rows {
            return Err(Error::ArityMismatch {
                key: name.to_string(),
                expected: n_rows,
                found: values.len(),
            });
        }
    }
    Ok(())
}

/// 長さを確認した上で全キー列をコード化
pub(crate) fn encode_keys(
    keys: &[NamedKey<'_>],
    n_rows: usize,
    config: &GroupingConfig,
) -> Result<Vec<KeyCodes>> {
    check_arity(keys, n_rows)?;

    if !config.should_parallelize(n_rows, keys.len()) {
        return Ok(keys.iter().map(|(_, values)| encode_key(values)).collect());
    }

    trace!("encoding {} keys over {} rows in parallel", keys.len(), n_rows);
    let encode_all = || {
        keys.par_iter()
            .map(|(_, values)| encode_key(values))
            .collect::<Vec<_>>()
    };

    match config.max_threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| Error::Config(format!("thread pool: {}", e)))?;
            Ok(pool.install(encode_all))
        }
        None => Ok(encode_all()),
    }
}

fn encode_categorical(cat: &StringCategorical) -> KeyCodes {
    let nlevels = cat.nlevels();
    let mut saw_missing = false;
    let codes = cat
        .codes()
        .iter()
        .map(|&code| {
            if code == MISSING_CODE {
                saw_missing = true;
                nlevels as u32
            } else {
                code as u32
            }
        })
        .collect();

    KeyCodes {
        codes,
        cardinality: nlevels + usize::from(saw_missing),
        representatives: Vec::new(),
    }
}

/// `cmp`による各値の密な順位
fn rank_codes<T, F>(values: &[T], cmp: F) -> KeyCodes
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut order: Vec<usize> = (0..values.len()).collect();
    // 安定ソートなので各値の先頭行が最初の出現行
    order.sort_by(|&a, &b| cmp(&values[a], &values[b]));

    let mut codes = vec![0u32; values.len()];
    let mut representatives = Vec::new();
    let mut prev: Option<usize> = None;

    for &row in &order {
        let is_new = match prev {
            Some(p) => cmp(&values[p], &values[row]) != Ordering::Equal,
            None => true,
        };
        if is_new {
            representatives.push(row);
        }
        codes[row] = (representatives.len() - 1) as u32;
        prev = Some(row);
    }

    KeyCodes {
        codes,
        cardinality: representatives.len(),
        representatives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::na::NA;

    #[test]
    fn string_codes_follow_natural_order() {
        let key = KeyVector::from_strs(vec!["b", "a", "c", "a"]);
        let enc = encode_key(&key);
        assert_eq!(enc.codes, vec![1, 0, 2, 0]);
        assert_eq!(enc.cardinality, 3);
        assert_eq!(enc.representatives, vec![1, 0, 2]);
    }

    #[test]
    fn missing_values_rank_last() {
        let key = KeyVector::Float64(vec![NA::NA, NA::Value(2.0), NA::Value(f64::NAN), NA::Value(-1.0)]);
        let enc = encode_key(&key);
        assert_eq!(enc.codes, vec![2, 1, 2, 0]);
        assert_eq!(enc.cardinality, 3);
    }

    #[test]
    fn categorical_codes_use_level_order() {
        let key = KeyVector::categorical(vec!["c", "a"], vec!["c", "b", "a"]).unwrap();
        let enc = encode_key(&key);
        assert_eq!(enc.codes, vec![0, 2]);
        assert_eq!(enc.cardinality, 3);
    }

    #[test]
    fn length_mismatch_names_the_key() {
        let key = KeyVector::from_i64(vec![1, 2]);
        let err = encode_keys(&[("k", &key)], 3, &GroupingConfig::default()).unwrap_err();
        match err {
            Error::ArityMismatch { key, expected, found } => {
                assert_eq!(key, "k");
                assert_eq!(expected, 3);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
