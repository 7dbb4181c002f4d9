//! グループ化の対象となるデータセット
//!
//! グループ化の中核はデータセットの実装に依存しません。
//! 必要なのは行数と名前による列アクセスだけで、それを`DataSource`トレイトで表します。
//! `DataFrame`は列指向の最小限の実装です。

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::column::KeyVector;
use crate::error::{Error, Result};

/// グループ化に必要なデータセットへのアクセス
pub trait DataSource {
    /// 現在の行数
    fn row_count(&self) -> usize;

    /// 名前で列を取得（存在しなければNone）
    fn column(&self, name: &str) -> Option<Cow<'_, KeyVector>>;
}

/// グループ化を解除して素のデータセットに戻す操作
///
/// 素のデータセットに対しては何もしないので、何度適用しても結果は同じです。
pub trait Ungroup {
    type Output;

    fn ungroup(self) -> Self::Output;
}

/// 列指向のDataFrame
#[derive(Clone, PartialEq)]
pub struct DataFrame {
    // 列データ
    columns: Vec<KeyVector>,
    // 列名→インデックスのマッピング
    column_indices: HashMap<String, usize>,
    // 列の順序
    column_names: Vec<String>,
    // 行数
    row_count: usize,
}

impl Debug for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataFrame ({} rows x {} columns: {:?})",
            self.row_count,
            self.columns.len(),
            self.column_names
        )
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl DataFrame {
    /// 新しい空のDataFrameを作成
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            column_indices: HashMap::new(),
            column_names: Vec::new(),
            row_count: 0,
        }
    }

    /// 列を追加
    pub fn add_column(&mut self, name: impl Into<String>, column: KeyVector) -> Result<()> {
        let name = name.into();

        if self.column_indices.contains_key(&name) {
            return Err(Error::DuplicateColumnName(name));
        }

        let column_len = column.len();
        if !self.columns.is_empty() && column_len != self.row_count {
            return Err(Error::ArityMismatch {
                key: name,
                expected: self.row_count,
                found: column_len,
            });
        }

        if self.columns.is_empty() {
            self.row_count = column_len;
        }

        self.column_indices.insert(name.clone(), self.columns.len());
        self.columns.push(column);
        self.column_names.push(name);

        Ok(())
    }

    /// 列を追加したDataFrameを返す（ビルダー形式）
    pub fn with_column(mut self, name: impl Into<String>, column: KeyVector) -> Result<Self> {
        self.add_column(name, column)?;
        Ok(self)
    }

    /// 列の参照を取得
    pub fn get_column(&self, name: &str) -> Option<&KeyVector> {
        self.column_indices.get(name).map(|&idx| &self.columns[idx])
    }

    /// 行数を取得
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// 指定した位置の行だけを持つDataFrameを作成
    pub fn take_rows(&self, positions: &[usize]) -> Result<DataFrame> {
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.row_count) {
            return Err(Error::IndexOutOfBounds {
                index: bad,
                size: self.row_count,
            });
        }

        let mut result = DataFrame::new();
        for (name, column) in self.column_names.iter().zip(&self.columns) {
            result.add_column(name.clone(), column.take(positions))?;
        }
        Ok(result)
    }

    /// 先頭n行
    pub fn head(&self, n: usize) -> Result<DataFrame> {
        let positions: Vec<usize> = (0..n.min(self.row_count)).collect();
        self.take_rows(&positions)
    }
}

impl DataSource for DataFrame {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn column(&self, name: &str) -> Option<Cow<'_, KeyVector>> {
        self.get_column(name).map(Cow::Borrowed)
    }
}

impl Ungroup for DataFrame {
    type Output = DataFrame;

    fn ungroup(self) -> DataFrame {
        self
    }
}

impl<D: DataSource + ?Sized> DataSource for &D {
    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn column(&self, name: &str) -> Option<Cow<'_, KeyVector>> {
        (**self).column(name)
    }
}

// 共有されたデータセット。借用はその場限りなので列は複製して返す
impl<D: DataSource> DataSource for Rc<RefCell<D>> {
    fn row_count(&self) -> usize {
        self.borrow().row_count()
    }

    fn column(&self, name: &str) -> Option<Cow<'_, KeyVector>> {
        self.borrow()
            .column(name)
            .map(|col| Cow::Owned(col.into_owned()))
    }
}
