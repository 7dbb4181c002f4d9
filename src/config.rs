//! グループ化の設定
//!
//! 新しいグループ化ビューのドロップ方針と構築方針の既定値、キー列の並列コード化、
//! グループ数の上限を扱います。コードで構築するほか、TOML/YAML/JSONから読み込んだり、
//! `GROUPRS_*`環境変数で上書きしたりできます。

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::groupby::MAX_GROUPS;

/// キー列を並列にコード化する行数の閾値
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 50_000;

/// 全組み合わせで許すグループ数の既定の上限
pub const DEFAULT_MAX_GROUPS: u64 = 1 << 26;

/// グループ化ビュー構築の設定
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// 観測された組み合わせのみ（`true`）か、水準の全組み合わせか
    pub drop: bool,
    /// 最初のアクセスまでラベルと索引を構築しない
    pub lazy: bool,
    /// 並列コード化を行う最小行数
    pub parallel_threshold: usize,
    /// 使用する最大スレッド数（Noneの場合はrayonの既定値）
    pub max_threads: Option<usize>,
    /// 0行のデータセットを`EmptyDataset`で拒否する
    pub reject_empty: bool,
    /// 全組み合わせのグループ数の上限（超えると`TooManyGroups`）
    pub max_groups: u64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            drop: true,
            lazy: false,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            max_threads: None,
            reject_empty: false,
            max_groups: DEFAULT_MAX_GROUPS,
        }
    }
}

impl GroupingConfig {
    /// 既定値で設定を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ドロップ方針を設定
    pub fn with_drop(mut self, drop: bool) -> Self {
        self.drop = drop;
        self
    }

    /// 遅延構築するかを設定
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// 並列コード化の閾値を設定
    pub fn with_parallel_threshold(mut self, rows: usize) -> Self {
        self.parallel_threshold = rows;
        self
    }

    /// 最大スレッド数を設定
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = Some(max_threads);
        self
    }

    /// 0行のデータセットを拒否するかを設定
    pub fn with_reject_empty(mut self, reject_empty: bool) -> Self {
        self.reject_empty = reject_empty;
        self
    }

    /// 全組み合わせのグループ数の上限を設定
    pub fn with_max_groups(mut self, max_groups: u64) -> Self {
        self.max_groups = max_groups;
        self
    }

    /// 使用するスレッド数を取得
    pub fn threads(&self) -> usize {
        match self.max_threads {
            Some(n) => n,
            None => rayon::current_num_threads(),
        }
    }

    /// キー列のコード化を並列に行うべきか判定
    pub fn should_parallelize(&self, rows: usize, keys: usize) -> bool {
        keys > 1 && rows >= self.parallel_threshold && self.threads() > 1
    }

    /// 設定値の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        if self.max_threads == Some(0) {
            return Err(Error::Config("max_threads must be at least 1".to_string()));
        }
        if self.max_groups == 0 || self.max_groups > MAX_GROUPS {
            return Err(Error::Config(format!(
                "max_groups must be between 1 and {}, got {}",
                MAX_GROUPS, self.max_groups
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// ファイルから設定を読み込む（形式は拡張子で判定）
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            Some("json") => Self::from_json_str(&contents),
            other => Err(Error::Config(format!(
                "unsupported config file extension: {:?}",
                other
            ))),
        }
    }

    /// 既定値に`GROUPRS_*`環境変数を重ねた設定
    pub fn from_env() -> Result<Self> {
        Self::default().overlay_env()
    }

    /// この設定に`GROUPRS_*`環境変数を重ねる
    pub fn overlay_env(mut self) -> Result<Self> {
        if let Some(v) = read_env("GROUPRS_DROP")? {
            self.drop = v;
        }
        if let Some(v) = read_env("GROUPRS_LAZY")? {
            self.lazy = v;
        }
        if let Some(v) = read_env("GROUPRS_PARALLEL_THRESHOLD")? {
            self.parallel_threshold = v;
        }
        if let Some(v) = read_env("GROUPRS_MAX_THREADS")? {
            self.max_threads = Some(v);
        }
        if let Some(v) = read_env("GROUPRS_REJECT_EMPTY")? {
            self.reject_empty = v;
        }
        if let Some(v) = read_env("GROUPRS_MAX_GROUPS")? {
            self.max_groups = v;
        }
        self.validate()?;
        Ok(self)
    }
}

fn read_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("invalid value for {}: {:?}", name, raw))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(Error::Config(format!("{} is not valid unicode", name)))
        }
    }
}
