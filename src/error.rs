use thiserror::Error;

/// エラー型の定義
#[derive(Error, Debug)]
pub enum Error {
    #[error("グループ化キーが見つかりません: {0}")]
    UnknownKey(String),

    #[error("キー '{key}' の長さがデータセットの行数と一致しません: 期待値 {expected}, 実際 {found}")]
    ArityMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("インデックスが古くなっています: 構築時の行数 {expected}, 現在の行数 {found}")]
    StaleIndex { expected: usize, found: usize },

    #[error("データセットに行がありません: {0}")]
    EmptyDataset(String),

    #[error("グループ数が上限を超えています: キー '{key}' の時点で {levels} 水準の積がオーバーフローします")]
    TooManyGroups { key: String, levels: usize },

    #[error("列名が重複しています: {0}")]
    DuplicateColumnName(String),

    #[error("インデックスが範囲外です: インデックス {index}, サイズ {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("データ一貫性エラー: {0}")]
    Consistency(String),

    #[error("無効な入力です: {0}")]
    InvalidInput(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("入出力エラー")]
    Io(#[source] std::io::Error),

    #[error("JSONエラー")]
    Json(#[source] serde_json::Error),

    #[error("TOMLエラー")]
    Toml(#[source] toml::de::Error),

    #[error("YAMLエラー")]
    Yaml(#[source] serde_yaml::Error),
}

/// Resultの型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml(err)
    }
}
