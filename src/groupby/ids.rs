//! 複合グループID
//!
//! キーごとのコードを左から順に混合基数の数値へ畳み込みます。最初のキーが最上位桁になるため、
//! 複合値の数値順はキーの組の辞書式順序と一致します。観測された組み合わせのみの場合は、
//! 実際に現れた値の中での密な順位に置き換えます。

use log::trace;

use super::encode::{encode_keys, KeyCodes, NamedKey};
use super::DropPolicy;
use crate::config::GroupingConfig;
use crate::error::{Error, Result};

/// 全組み合わせで生成できるグループ数の絶対的な上限
///
/// 実際の上限は`GroupingConfig::max_groups`で、この値以下でなければなりません。
pub const MAX_GROUPS: u64 = u32::MAX as u64;

/// 行ごとの複合IDとグループ数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIds {
    ids: Vec<usize>,
    n_groups: usize,
}

impl GroupIds {
    /// 計算済みのIDを包む（全IDが`n_groups`未満であることを確認）
    pub fn new(ids: Vec<usize>, n_groups: usize) -> Result<Self> {
        if let Some(&bad) = ids.iter().find(|&&id| id >= n_groups) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: n_groups,
            });
        }
        Ok(Self { ids, n_groups })
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn into_ids(self) -> Vec<usize> {
        self.ids
    }
}

/// キー列の各行に複合IDを割り当てる
///
/// 各キーはちょうど`n_rows`個の値を持つ必要があります。
/// [`DropPolicy::ObservedOnly`]では観測された組に対して密なID、
/// [`DropPolicy::FullCrossProduct`]では全水準の組み合わせの中での順位がIDになります。
pub fn assign_ids(keys: &[NamedKey<'_>], n_rows: usize, policy: DropPolicy) -> Result<GroupIds> {
    assign_ids_with(keys, n_rows, policy, &GroupingConfig::default())
}

/// 設定（並列化・グループ数の上限）を指定してIDを割り当てる
pub fn assign_ids_with(
    keys: &[NamedKey<'_>],
    n_rows: usize,
    policy: DropPolicy,
    config: &GroupingConfig,
) -> Result<GroupIds> {
    if keys.is_empty() {
        return Err(Error::InvalidInput(
            "id assignment needs at least one key".to_string(),
        ));
    }
    config.validate()?;
    let encodings = encode_keys(keys, n_rows, config)?;
    combine_codes(keys, &encodings, n_rows, policy, config.max_groups)
}

pub(crate) fn combine_codes(
    keys: &[NamedKey<'_>],
    encodings: &[KeyCodes],
    n_rows: usize,
    policy: DropPolicy,
    max_groups: u64,
) -> Result<GroupIds> {
    let mut composite = vec![0u64; n_rows];
    let mut radix: u64 = 1;

    for ((name, _), enc) in keys.iter().zip(encodings) {
        let card = enc.cardinality as u64;

        let next = match radix.checked_mul(card) {
            Some(next) if policy == DropPolicy::ObservedOnly || next <= max_groups => next,
            _ if policy == DropPolicy::FullCrossProduct => {
                return Err(Error::TooManyGroups {
                    key: name.to_string(),
                    levels: enc.cardinality,
                });
            }
            _ => {
                // 再度密にして基数をn_rows以下に戻す
                trace!("composite radix overflow at key '{}', densifying", name);
                let (dense, distinct) = densify(&composite, radix);
                composite = dense.into_iter().map(|id| id as u64).collect();
                radix = distinct as u64;
                radix.checked_mul(card).ok_or_else(|| Error::TooManyGroups {
                    key: name.to_string(),
                    levels: enc.cardinality,
                })?
            }
        };

        for (slot, &code) in composite.iter_mut().zip(&enc.codes) {
            *slot = *slot * card + u64::from(code);
        }
        radix = next;
    }

    match policy {
        DropPolicy::ObservedOnly => {
            let (ids, n_groups) = densify(&composite, radix);
            Ok(GroupIds { ids, n_groups })
        }
        DropPolicy::FullCrossProduct => Ok(GroupIds {
            ids: composite.into_iter().map(|c| c as usize).collect(),
            n_groups: radix as usize,
        }),
    }
}

/// 各値を異なる値の中での順位に置き換える
///
/// 基数が行数に比べて小さければバケット走査、そうでなければ異なる値のソートを使います。
fn densify(values: &[u64], radix: u64) -> (Vec<usize>, usize) {
    let n = values.len() as u64;
    if radix <= n.saturating_mul(2).max(1024) {
        let mut rank = vec![usize::MAX; radix as usize];
        for &v in values {
            rank[v as usize] = 0;
        }
        let mut next = 0usize;
        for slot in rank.iter_mut() {
            if *slot == 0 {
                *slot = next;
                next += 1;
            }
        }
        let ids = values.iter().map(|&v| rank[v as usize]).collect();
        (ids, next)
    } else {
        let mut distinct = values.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        let ids = values
            .iter()
            .map(|v| distinct.binary_search(v).unwrap_or_default())
            .collect();
        (ids, distinct.len())
    }
}
