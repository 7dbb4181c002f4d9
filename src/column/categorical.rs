use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::na::NA;

/// 欠損値を表すコード
pub const MISSING_CODE: i32 = -1;

/// カテゴリカルデータを表現する構造体
///
/// 取り得る水準（カテゴリ）とその順序は外部から与えられ、
/// 実際にデータに現れるかどうかとは無関係に保持されます。
/// グループ化ではこの水準順がキーの並び順になります。
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical<T>
where
    T: Debug + Clone + Eq + Hash + Display + Ord,
{
    /// 各行の水準コード（-1は欠損値）
    codes: Vec<i32>,

    /// 水準のリスト（この順序が並び順）
    categories: Vec<T>,

    /// 水準から整数コードへのマップ
    category_map: HashMap<T, i32>,
}

impl<T> Categorical<T>
where
    T: Debug + Clone + Eq + Hash + Display + Ord,
{
    /// 新しいカテゴリカルデータを作成
    ///
    /// # 引数
    /// * `values` - 元のデータ値（NAを含んでもよい）
    /// * `categories` - 水準のリスト（指定がない場合は観測値を昇順に並べたもの）
    pub fn new(values: Vec<NA<T>>, categories: Option<Vec<T>>) -> Result<Self> {
        let categories = match categories {
            Some(cats) => cats,
            None => {
                let mut observed: Vec<T> = values
                    .iter()
                    .filter_map(|v| v.value().cloned())
                    .collect();
                observed.sort();
                observed.dedup();
                observed
            }
        };
        let category_map = Self::build_map(&categories)?;

        let mut codes = Vec::with_capacity(values.len());
        for value in values {
            match value {
                NA::Value(val) => match category_map.get(&val) {
                    Some(&code) => codes.push(code),
                    None => {
                        return Err(Error::Consistency(format!(
                            "値 '{:?}' はカテゴリに含まれていません",
                            val
                        )));
                    }
                },
                NA::NA => codes.push(MISSING_CODE),
            }
        }

        Ok(Categorical {
            codes,
            categories,
            category_map,
        })
    }

    /// 欠損値を含まない値のベクトルから作成
    pub fn from_values(values: Vec<T>, categories: Option<Vec<T>>) -> Result<Self> {
        Self::new(values.into_iter().map(NA::Value).collect(), categories)
    }

    /// コードから直接Categoricalを作成
    pub fn from_codes(codes: Vec<i32>, categories: Vec<T>) -> Result<Self> {
        let category_map = Self::build_map(&categories)?;

        let max_code = categories.len() as i32 - 1;
        for &code in &codes {
            if code != MISSING_CODE && (code < 0 || code > max_code) {
                return Err(Error::Consistency(format!(
                    "コード {} は有効範囲外です",
                    code
                )));
            }
        }

        Ok(Categorical {
            codes,
            categories,
            category_map,
        })
    }

    fn build_map(categories: &[T]) -> Result<HashMap<T, i32>> {
        let mut map = HashMap::with_capacity(categories.len());
        for (i, cat) in categories.iter().enumerate() {
            if map.insert(cat.clone(), i as i32).is_some() {
                return Err(Error::Consistency(format!(
                    "カテゴリ '{:?}' が重複しています",
                    cat
                )));
            }
        }
        Ok(map)
    }

    /// データの長さを取得
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// データが空かどうか
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// 水準の一覧を取得
    pub fn categories(&self) -> &[T] {
        &self.categories
    }

    /// 水準の数
    pub fn nlevels(&self) -> usize {
        self.categories.len()
    }

    /// コードを取得
    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    /// 水準のコードを取得
    pub fn code_of(&self, category: &T) -> Option<i32> {
        self.category_map.get(category).copied()
    }

    /// 特定の位置の値を取得（範囲外または欠損値ならNone）
    pub fn get(&self, index: usize) -> Option<&T> {
        match self.codes.get(index) {
            Some(&code) if code != MISSING_CODE => Some(&self.categories[code as usize]),
            _ => None,
        }
    }

    /// 欠損値を含むかどうか
    pub fn has_missing(&self) -> bool {
        self.codes.iter().any(|&c| c == MISSING_CODE)
    }

    /// 水準を末尾に追加（既存のコードは変わらない）
    pub fn add_categories(&mut self, new_categories: Vec<T>) -> Result<()> {
        let mut category_map = self.category_map.clone();
        let mut categories = self.categories.clone();

        for cat in new_categories {
            if category_map.contains_key(&cat) {
                return Err(Error::Consistency(format!(
                    "カテゴリ '{:?}' は既に存在します",
                    cat
                )));
            }
            category_map.insert(cat.clone(), categories.len() as i32);
            categories.push(cat);
        }

        self.categories = categories;
        self.category_map = category_map;
        Ok(())
    }

    /// 指定した位置の行を取り出す（水準はそのまま保持）
    pub fn take(&self, positions: &[usize]) -> Self {
        Categorical {
            codes: positions.iter().map(|&p| self.codes[p]).collect(),
            categories: self.categories.clone(),
            category_map: self.category_map.clone(),
        }
    }

    /// `NA<T>`ベクトルに変換
    pub fn to_na_vec(&self) -> Vec<NA<T>> {
        self.codes
            .iter()
            .map(|&code| {
                if code == MISSING_CODE {
                    NA::NA
                } else {
                    NA::Value(self.categories[code as usize].clone())
                }
            })
            .collect()
    }
}

/// 文字列カテゴリカルのエイリアス
pub type StringCategorical = Categorical<String>;
