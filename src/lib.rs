//! grouprs: grouping index over tabular data
//!
//! キー列から行ごとのグループID、グループのラベル表、グループ → 行位置の索引を構築し、
//! 遅延／即時の構築方針を持つ`GroupedView`として公開します。

pub mod column;
pub mod config;
pub mod dataframe;
pub mod error;
pub mod groupby;
pub mod na;

// Re-export commonly used types
pub use column::{Categorical, KeyValue, KeyVector, StringCategorical};
pub use config::GroupingConfig;
pub use dataframe::{DataFrame, DataSource, Ungroup};
pub use error::{Error, Result};
pub use groupby::{
    assign_ids, assign_ids_with, build_index, build_labels, DropPolicy, GroupByExt, GroupIds,
    GroupIndex, GroupKey, GroupedView, LabelTable, ViewState,
};
pub use na::NA;

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
