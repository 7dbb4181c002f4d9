//! グループ化索引
//!
//! キー列 → 行ごとのグループID → {ラベル表, 索引} → `GroupedView` の順に構築します。

mod encode;
mod ids;
mod index;
mod labels;
mod view;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::KeyVector;
use crate::config::GroupingConfig;
use crate::dataframe::DataSource;
use crate::error::Result;

pub use encode::NamedKey;
pub use ids::{assign_ids, assign_ids_with, GroupIds, MAX_GROUPS};
pub use index::{build_index, GroupIndex};
pub use labels::{build_labels, LabelTable};
pub use view::{GroupedView, ViewState};

/// どのキーの組み合わせをグループとするか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DropPolicy {
    /// 実際に現れた組み合わせのみ
    ObservedOnly,
    /// カテゴリカルキーの水準の全組み合わせ（行のないグループも含む）
    FullCrossProduct,
}

impl DropPolicy {
    /// `drop = true`なら観測された組み合わせのみ
    pub fn from_drop(drop: bool) -> Self {
        if drop {
            DropPolicy::ObservedOnly
        } else {
            DropPolicy::FullCrossProduct
        }
    }

    pub fn drops_unobserved(&self) -> bool {
        *self == DropPolicy::ObservedOnly
    }
}

/// グループ化キーの指定
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// データセットの列名
    Column(String),
    /// 外部で計算された行ごとの値
    Derived { name: String, values: KeyVector },
}

impl GroupKey {
    pub fn column(name: impl Into<String>) -> Self {
        GroupKey::Column(name.into())
    }

    pub fn derived(name: impl Into<String>, values: KeyVector) -> Self {
        GroupKey::Derived {
            name: name.into(),
            values,
        }
    }

    /// キー名
    pub fn name(&self) -> &str {
        match self {
            GroupKey::Column(name) => name,
            GroupKey::Derived { name, .. } => name,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for GroupKey {
    fn from(name: &str) -> Self {
        GroupKey::Column(name.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(name: String) -> Self {
        GroupKey::Column(name)
    }
}

/// データセットに対するグループ化の拡張
pub trait GroupByExt: DataSource + Sized {
    /// デフォルト設定でグループ化
    fn group_by<I, K>(self, keys: I) -> Result<GroupedView<Self>>
    where
        I: IntoIterator<Item = K>,
        K: Into<GroupKey>,
    {
        self.group_by_with(keys, &GroupingConfig::default())
    }

    /// 設定を指定してグループ化
    fn group_by_with<I, K>(self, keys: I, config: &GroupingConfig) -> Result<GroupedView<Self>>
    where
        I: IntoIterator<Item = K>,
        K: Into<GroupKey>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        GroupedView::build_with_config(self, keys, config.clone())
    }
}

impl<D: DataSource> GroupByExt for D {}
