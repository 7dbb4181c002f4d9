//! データセットのグループ化ビュー
//!
//! `GroupedView`はグループ化するデータセット（`D`が参照なら借用）、グループ化キー、
//! ドロップ方針を保持します。ラベルと索引は最初のアクセスで構築され（`Lazy` → `Materialized`）、
//! 以後は再利用されます。ビューを通じてキー・方針・データセットを変更すると`Lazy`に戻ります。
//! ビューの外でデータセットの行数が変わった場合、保存された索引は古くなり、
//! [`GroupedView::rebuild`]するまで全てのアクセスが失敗します。

use std::borrow::Cow;
use std::collections::HashSet;

use log::{debug, warn};

use super::encode::{encode_keys, NamedKey};
use super::ids::combine_codes;
use super::index::{build_index, GroupIndex};
use super::labels::{cross_product_labels, observed_labels, LabelTable};
use super::{DropPolicy, GroupKey};
use crate::column::KeyVector;
use crate::config::GroupingConfig;
use crate::dataframe::{DataSource, Ungroup};
use crate::error::{Error, Result};

/// グループ化ビューの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// キーと方針のみ設定済み（ラベルと索引は未構築）
    Lazy,
    /// データセットに対してラベルと索引を構築済み
    Materialized,
}

#[derive(Debug, Clone)]
struct Materialized {
    labels: LabelTable,
    index: GroupIndex,
    ids: Vec<usize>,
    // 索引を構築した時点の行数
    n_rows: usize,
}

#[derive(Debug, Clone)]
enum State {
    Lazy,
    Materialized(Materialized),
}

/// 1つ以上のキーでグループ化されたデータセット
#[derive(Debug, Clone)]
pub struct GroupedView<D: DataSource> {
    data: D,
    keys: Vec<GroupKey>,
    policy: DropPolicy,
    config: GroupingConfig,
    state: State,
}

impl<D: DataSource> GroupedView<D> {
    /// `data`を`keys`でグループ化
    ///
    /// `drop = true`なら観測された組み合わせのみ、`drop = false`ならカテゴリ水準の全組み合わせを
    /// グループとします。`lazy = true`ならラベルと索引は最初のアクセス時に構築します。
    pub fn build(data: D, keys: Vec<GroupKey>, drop: bool, lazy: bool) -> Result<Self> {
        let config = GroupingConfig::default().with_drop(drop).with_lazy(lazy);
        Self::build_with_config(data, keys, config)
    }

    /// 方針と構築方法を`config`から取って`data`をグループ化
    pub fn build_with_config(data: D, keys: Vec<GroupKey>, config: GroupingConfig) -> Result<Self> {
        config.validate()?;
        validate_keys(&data, &keys, &[])?;

        if config.reject_empty && data.row_count() == 0 {
            return Err(Error::EmptyDataset(format!(
                "cannot group by {:?}",
                keys.iter().map(GroupKey::name).collect::<Vec<_>>()
            )));
        }

        let lazy = config.lazy;
        let mut view = GroupedView {
            data,
            keys,
            policy: DropPolicy::from_drop(config.drop),
            config,
            state: State::Lazy,
        };
        if !lazy {
            view.materialize()?;
        }
        Ok(view)
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.state, State::Lazy)
    }

    pub fn state(&self) -> ViewState {
        match self.state {
            State::Lazy => ViewState::Lazy,
            State::Materialized(_) => ViewState::Materialized,
        }
    }

    /// グループ化キーが設定されているか
    pub fn is_grouped(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    /// グループ化キーの名前
    pub fn group_vars(&self) -> Vec<&str> {
        self.keys.iter().map(GroupKey::name).collect()
    }

    pub fn drop_policy(&self) -> DropPolicy {
        self.policy
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    pub fn dataset(&self) -> &D {
        &self.data
    }

    /// データセットへの可変参照（ビューは`Lazy`に戻る）
    pub fn dataset_mut(&mut self) -> &mut D {
        self.state = State::Lazy;
        &mut self.data
    }

    /// 既存のキーの後ろにキーを追加
    pub fn add_keys(&mut self, keys: Vec<GroupKey>) -> Result<()> {
        validate_keys(&self.data, &keys, &self.keys)?;
        if !keys.is_empty() {
            self.keys.extend(keys);
            self.state = State::Lazy;
        }
        Ok(())
    }

    /// ドロップ方針を変更（変わった場合は`Lazy`に戻る）
    pub fn set_drop(&mut self, drop: bool) {
        let policy = DropPolicy::from_drop(drop);
        if policy != self.policy {
            self.policy = policy;
            self.state = State::Lazy;
        }
    }

    /// `Lazy`ならラベルと索引を構築
    pub fn materialize(&mut self) -> Result<()> {
        let current = self.data.row_count();
        if let State::Materialized(m) = &self.state {
            if m.n_rows == current {
                return Ok(());
            }
            warn!(
                "grouped index built for {} rows, dataset now has {} rows",
                m.n_rows, current
            );
            return Err(Error::StaleIndex {
                expected: m.n_rows,
                found: current,
            });
        }

        let built = self.compute()?;
        self.state = State::Materialized(built);
        Ok(())
    }

    /// 現在のデータセットに対してラベルと索引を再構築
    ///
    /// 失敗した場合、ビューは以前の状態のままです。
    pub fn rebuild(&mut self) -> Result<()> {
        let built = self.compute()?;
        self.state = State::Materialized(built);
        Ok(())
    }

    /// グループ数
    pub fn group_count(&mut self) -> Result<usize> {
        Ok(self.materialized()?.labels.n_rows())
    }

    /// 各グループのサイズ（ラベル順）
    pub fn group_sizes(&mut self) -> Result<Vec<usize>> {
        Ok(self.materialized()?.index.sizes())
    }

    pub fn labels(&mut self) -> Result<&LabelTable> {
        Ok(&self.materialized()?.labels)
    }

    pub fn index(&mut self) -> Result<&GroupIndex> {
        Ok(&self.materialized()?.index)
    }

    /// 各行のグループID
    pub fn group_ids(&mut self) -> Result<&[usize]> {
        Ok(&self.materialized()?.ids)
    }

    /// グループ`i`の行位置
    pub fn group_rows(&mut self, i: usize) -> Result<&[usize]> {
        let index = &self.materialized()?.index;
        index.group(i).ok_or(Error::IndexOutOfBounds {
            index: i,
            size: index.n_groups(),
        })
    }

    /// 行`row`のグループID
    pub fn group_of_row(&mut self, row: usize) -> Result<usize> {
        let ids = &self.materialized()?.ids;
        ids.get(row).copied().ok_or(Error::IndexOutOfBounds {
            index: row,
            size: ids.len(),
        })
    }

    /// キー・方針・ラベル・索引を破棄してデータセットを返す
    pub fn ungroup(self) -> D {
        self.data
    }

    fn materialized(&mut self) -> Result<&Materialized> {
        self.materialize()?;
        match &self.state {
            State::Materialized(m) => Ok(m),
            State::Lazy => Err(Error::Consistency(
                "grouped view is still lazy after materialization".to_string(),
            )),
        }
    }

    fn compute(&self) -> Result<Materialized> {
        let n_rows = self.data.row_count();

        if self.keys.is_empty() {
            // グループ化されていないデータは全行を含む1グループ
            let index = GroupIndex::single(n_rows);
            return Ok(Materialized {
                labels: LabelTable::single(),
                index,
                ids: vec![0; n_rows],
                n_rows,
            });
        }

        let resolved = self
            .keys
            .iter()
            .map(|key| resolve_key(&self.data, key))
            .collect::<Result<Vec<Cow<'_, KeyVector>>>>()?;
        let named: Vec<NamedKey<'_>> = self
            .keys
            .iter()
            .zip(&resolved)
            .map(|(key, values)| (key.name(), values.as_ref()))
            .collect();

        let encodings = encode_keys(&named, n_rows, &self.config)?;
        let ids = combine_codes(
            &named,
            &encodings,
            n_rows,
            self.policy,
            self.config.max_groups,
        )?;
        let labels = match self.policy {
            DropPolicy::ObservedOnly => observed_labels(&named, &ids)?,
            DropPolicy::FullCrossProduct => {
                cross_product_labels(&named, &encodings, ids.n_groups())?
            }
        };
        let index = build_index(ids.ids(), ids.n_groups())?;

        debug!(
            "grouped {} rows by {:?} ({:?}): {} groups",
            n_rows,
            self.group_vars(),
            self.policy,
            index.n_groups()
        );

        Ok(Materialized {
            labels,
            index,
            ids: ids.into_ids(),
            n_rows,
        })
    }
}

impl<D: DataSource> Ungroup for GroupedView<D> {
    type Output = D;

    fn ungroup(self) -> D {
        self.data
    }
}

fn resolve_key<'a, D: DataSource>(data: &'a D, key: &'a GroupKey) -> Result<Cow<'a, KeyVector>> {
    match key {
        GroupKey::Column(name) => data
            .column(name)
            .ok_or_else(|| Error::UnknownKey(name.clone())),
        GroupKey::Derived { values, .. } => Ok(Cow::Borrowed(values)),
    }
}

/// 新しいキーが解決でき、長さが行数と一致し、名前が重複しないことを確認
fn validate_keys<D: DataSource>(data: &D, keys: &[GroupKey], existing: &[GroupKey]) -> Result<()> {
    let mut seen: HashSet<&str> = existing.iter().map(GroupKey::name).collect();
    let n_rows = data.row_count();

    for key in keys {
        if !seen.insert(key.name()) {
            return Err(Error::DuplicateColumnName(key.name().to_string()));
        }
        match key {
            GroupKey::Column(name) => {
                if data.column(name).is_none() {
                    return Err(Error::UnknownKey(name.clone()));
                }
            }
            GroupKey::Derived { name, values } => {
                if values.len() != n_rows {
                    return Err(Error::ArityMismatch {
                        key: name.clone(),
                        expected: n_rows,
                        found: values.len(),
                    });
                }
            }
        }
    }
    Ok(())
}
