//! グループのラベル表
//!
//! ラベル表の`i`行目はグループ`i`のキーの組を保持します。

use super::encode::{check_arity, encode_keys, KeyCodes, NamedKey};
use super::ids::GroupIds;
use super::DropPolicy;
use crate::column::{KeyValue, KeyVector, StringCategorical, MISSING_CODE};
use crate::config::GroupingConfig;
use crate::error::{Error, Result};

/// 各グループのキーの値（キーごとに1列）
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    names: Vec<String>,
    columns: Vec<KeyVector>,
    n_rows: usize,
}

impl LabelTable {
    /// 列も行もない表
    pub fn empty() -> Self {
        LabelTable {
            names: Vec::new(),
            columns: Vec::new(),
            n_rows: 0,
        }
    }

    /// 列がなく1行だけの表（グループ化されていないデータの唯一のグループ用）
    pub fn single() -> Self {
        LabelTable {
            names: Vec::new(),
            columns: Vec::new(),
            n_rows: 1,
        }
    }

    fn from_columns(names: Vec<String>, columns: Vec<KeyVector>, n_rows: usize) -> Self {
        LabelTable {
            names,
            columns,
            n_rows,
        }
    }

    /// 表が表すグループ数
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// キー名（キー順）
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[KeyVector] {
        &self.columns
    }

    pub fn column(&self, i: usize) -> Option<&KeyVector> {
        self.columns.get(i)
    }

    /// グループ`i`のキーの組
    pub fn row(&self, i: usize) -> Option<Vec<KeyValue>> {
        if i >= self.n_rows {
            return None;
        }
        self.columns.iter().map(|c| c.get(i)).collect()
    }

    /// グループ順の全てのキーの組
    pub fn rows(&self) -> Vec<Vec<KeyValue>> {
        (0..self.n_rows).filter_map(|i| self.row(i)).collect()
    }
}

/// 同じキー・同じ方針で割り当てたIDに対するラベル表を構築
///
/// 各キーの長さはIDの数と一致しなければなりません（`ArityMismatch`）。
pub fn build_labels(keys: &[NamedKey<'_>], ids: &GroupIds, policy: DropPolicy) -> Result<LabelTable> {
    if keys.is_empty() {
        return Ok(LabelTable::empty());
    }
    check_arity(keys, ids.len())?;
    match policy {
        DropPolicy::ObservedOnly => observed_labels(keys, ids),
        DropPolicy::FullCrossProduct => {
            let encodings = encode_keys(keys, ids.len(), &GroupingConfig::default())?;
            cross_product_labels(keys, &encodings, ids.n_groups())
        }
    }
}

/// 各グループをそのIDを持つ最初の行でラベル付け
pub(crate) fn observed_labels(keys: &[NamedKey<'_>], ids: &GroupIds) -> Result<LabelTable> {
    let mut first = vec![usize::MAX; ids.n_groups()];
    for (row, &id) in ids.ids().iter().enumerate() {
        if first[id] == usize::MAX {
            first[id] = row;
        }
    }
    if let Some(missing) = first.iter().position(|&r| r == usize::MAX) {
        return Err(Error::Consistency(format!(
            "group {} has no rows; observed-only ids must be dense",
            missing
        )));
    }

    let names = keys.iter().map(|(name, _)| name.to_string()).collect();
    let columns = keys
        .iter()
        .map(|(_, values)| label_values(values, &first))
        .collect();
    Ok(LabelTable::from_columns(names, columns, first.len()))
}

/// 水準の全組み合わせ（最初のキーが最も遅く変化）
pub(crate) fn cross_product_labels(
    keys: &[NamedKey<'_>],
    encodings: &[KeyCodes],
    n_groups: usize,
) -> Result<LabelTable> {
    let expected = encodings
        .iter()
        .try_fold(1usize, |acc, enc| acc.checked_mul(enc.cardinality));
    if expected != Some(n_groups) {
        return Err(Error::Consistency(format!(
            "group count {} does not match the cross-product of key levels {:?}",
            n_groups, expected
        )));
    }

    let mut names = Vec::with_capacity(keys.len());
    let mut columns = Vec::with_capacity(keys.len());
    let mut stride = n_groups;

    for ((name, values), enc) in keys.iter().zip(encodings) {
        let card = enc.cardinality;
        stride = if card == 0 { 0 } else { stride / card };
        let codes: Vec<usize> = (0..n_groups).map(|i| (i / stride) % card).collect();

        names.push(name.to_string());
        columns.push(level_column(values, enc, &codes)?);
    }

    Ok(LabelTable::from_columns(names, columns, n_groups))
}

/// 各コードに対応する水準を持つラベル列
fn level_column(values: &KeyVector, enc: &KeyCodes, codes: &[usize]) -> Result<KeyVector> {
    match values {
        KeyVector::Categorical(cat) => {
            let nlevels = cat.nlevels();
            let level_codes = codes
                .iter()
                .map(|&c| if c == nlevels { MISSING_CODE } else { c as i32 })
                .collect();
            let labels = StringCategorical::from_codes(level_codes, cat.categories().to_vec())?;
            Ok(KeyVector::Categorical(labels))
        }
        _ => {
            let rows: Vec<usize> = codes.iter().map(|&c| enc.representatives[c]).collect();
            Ok(label_values(values, &rows))
        }
    }
}

/// 指定した行の値を取り出す（浮動小数点はNaNを欠損値に、-0.0を0.0に正規化）
fn label_values(values: &KeyVector, rows: &[usize]) -> KeyVector {
    match values {
        KeyVector::Float64(v) => {
            KeyVector::Float64(rows.iter().map(|&r| v[r].normalized()).collect())
        }
        other => other.take(rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groupby::ids::assign_ids;
    use crate::na::NA;

    #[test]
    fn cross_product_nests_first_key_slowest() {
        let a = KeyVector::categorical(vec!["x"], vec!["x", "y"]).unwrap();
        let b = KeyVector::categorical(vec!["q"], vec!["p", "q", "r"]).unwrap();
        let keys = [("a", &a), ("b", &b)];
        let ids = assign_ids(&keys, 1, DropPolicy::FullCrossProduct).unwrap();
        assert_eq!(ids.ids(), &[1]);

        let labels = build_labels(&keys, &ids, DropPolicy::FullCrossProduct).unwrap();
        assert_eq!(labels.n_rows(), 6);
        let rows: Vec<String> = labels
            .rows()
            .iter()
            .map(|r| format!("{}{}", r[0], r[1]))
            .collect();
        assert_eq!(rows, vec!["xp", "xq", "xr", "yp", "yq", "yr"]);
    }

    #[test]
    fn short_key_is_an_arity_error() {
        let full = KeyVector::from_i64(vec![1, 2, 1, 3]);
        let ids = assign_ids(&[("k", &full)], 4, DropPolicy::ObservedOnly).unwrap();
        let short = KeyVector::from_i64(vec![1, 2]);

        for policy in [DropPolicy::ObservedOnly, DropPolicy::FullCrossProduct] {
            match build_labels(&[("k", &short)], &ids, policy) {
                Err(Error::ArityMismatch { key, expected, found }) => {
                    assert_eq!(key, "k");
                    assert_eq!(expected, 4);
                    assert_eq!(found, 2);
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn float_labels_are_normalized() {
        let key = KeyVector::Float64(vec![
            NA::Value(f64::NAN),
            NA::Value(-0.0),
            NA::Value(1.0),
            NA::NA,
        ]);
        let keys = [("f", &key)];

        for policy in [DropPolicy::ObservedOnly, DropPolicy::FullCrossProduct] {
            let ids = assign_ids(&keys, 4, policy).unwrap();
            let labels = build_labels(&keys, &ids, policy).unwrap();
            assert_eq!(
                labels.column(0),
                Some(&KeyVector::Float64(vec![NA::Value(0.0), NA::Value(1.0), NA::NA]))
            );
            // NaNを含んでも同じ入力からは等しいラベル表になる
            assert_eq!(labels, build_labels(&keys, &ids, policy).unwrap());
        }
    }

    #[test]
    fn zero_keys_give_empty_table() {
        let ids = GroupIds::new(vec![], 0).unwrap();
        let labels = build_labels(&[], &ids, DropPolicy::ObservedOnly).unwrap();
        assert_eq!(labels.n_rows(), 0);
        assert_eq!(labels.n_columns(), 0);
    }
}
