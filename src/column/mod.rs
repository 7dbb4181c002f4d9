//! グループ化キーとして使う列の表現

mod categorical;

use std::fmt;

use crate::error::Result;
use crate::na::NA;

pub use categorical::{Categorical, StringCategorical, MISSING_CODE};

/// グループ化キーとなる列
///
/// データセットの1列、または外部で計算された行ごとの値。
/// 欠損値は`NA::NA`（カテゴリカルではコード-1）で表します。
#[derive(Debug, Clone, PartialEq)]
pub enum KeyVector {
    Int64(Vec<NA<i64>>),
    Float64(Vec<NA<f64>>),
    String(Vec<NA<String>>),
    Boolean(Vec<NA<bool>>),
    Categorical(StringCategorical),
}

/// キー列の1要素
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    Int64(i64),
    Float64(f64),
    String(String),
    Boolean(bool),
    NA,
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int64(v) => write!(f, "{}", v),
            KeyValue::Float64(v) => write!(f, "{}", v),
            KeyValue::String(v) => write!(f, "{}", v),
            KeyValue::Boolean(v) => write!(f, "{}", v),
            KeyValue::NA => write!(f, "NA"),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl KeyVector {
    /// 整数列を作成
    pub fn from_i64(values: Vec<i64>) -> Self {
        KeyVector::Int64(values.into_iter().map(NA::Value).collect())
    }

    /// 浮動小数点列を作成
    pub fn from_f64(values: Vec<f64>) -> Self {
        KeyVector::Float64(values.into_iter().map(NA::Value).collect())
    }

    /// 文字列列を作成
    pub fn from_strs<S: Into<String>>(values: Vec<S>) -> Self {
        KeyVector::String(values.into_iter().map(|s| NA::Value(s.into())).collect())
    }

    /// 真偽値列を作成
    pub fn from_bools(values: Vec<bool>) -> Self {
        KeyVector::Boolean(values.into_iter().map(NA::Value).collect())
    }

    /// 水準を指定してカテゴリカル列を作成
    pub fn categorical<S: Into<String>>(values: Vec<S>, levels: Vec<S>) -> Result<Self> {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let levels: Vec<String> = levels.into_iter().map(Into::into).collect();
        Ok(KeyVector::Categorical(StringCategorical::from_values(
            values,
            Some(levels),
        )?))
    }

    /// 列の長さ
    pub fn len(&self) -> usize {
        match self {
            KeyVector::Int64(v) => v.len(),
            KeyVector::Float64(v) => v.len(),
            KeyVector::String(v) => v.len(),
            KeyVector::Boolean(v) => v.len(),
            KeyVector::Categorical(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 位置`row`の値を取得
    pub fn get(&self, row: usize) -> Option<KeyValue> {
        if row >= self.len() {
            return None;
        }
        let value = match self {
            KeyVector::Int64(v) => match v[row] {
                NA::Value(x) => KeyValue::Int64(x),
                NA::NA => KeyValue::NA,
            },
            KeyVector::Float64(v) => match v[row].normalized() {
                NA::Value(x) => KeyValue::Float64(x),
                NA::NA => KeyValue::NA,
            },
            KeyVector::String(v) => match &v[row] {
                NA::Value(x) => KeyValue::String(x.clone()),
                NA::NA => KeyValue::NA,
            },
            KeyVector::Boolean(v) => match v[row] {
                NA::Value(x) => KeyValue::Boolean(x),
                NA::NA => KeyValue::NA,
            },
            KeyVector::Categorical(c) => match c.get(row) {
                Some(x) => KeyValue::String(x.clone()),
                None => KeyValue::NA,
            },
        };
        Some(value)
    }

    /// 指定した位置の行を順に取り出した新しい列
    pub fn take(&self, positions: &[usize]) -> KeyVector {
        fn gather<T: Clone>(values: &[T], positions: &[usize]) -> Vec<T> {
            positions.iter().map(|&p| values[p].clone()).collect()
        }

        match self {
            KeyVector::Int64(v) => KeyVector::Int64(gather(v, positions)),
            KeyVector::Float64(v) => KeyVector::Float64(gather(v, positions)),
            KeyVector::String(v) => KeyVector::String(gather(v, positions)),
            KeyVector::Boolean(v) => KeyVector::Boolean(gather(v, positions)),
            KeyVector::Categorical(c) => KeyVector::Categorical(c.take(positions)),
        }
    }

    /// 全要素を`KeyValue`として取り出す
    pub fn to_values(&self) -> Vec<KeyValue> {
        (0..self.len()).filter_map(|r| self.get(r)).collect()
    }
}

impl From<StringCategorical> for KeyVector {
    fn from(cat: StringCategorical) -> Self {
        KeyVector::Categorical(cat)
    }
}
