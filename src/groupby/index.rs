use crate::error::{Error, Result};

/// グループ → 行位置の対応表
///
/// グループ`i`の行位置は`rows[offsets[i]..offsets[i + 1]]`に、元の行順（昇順）で並びます。
/// 行を持たないグループ（水準の全組み合わせの場合のみ）は空のスライスです。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIndex {
    /// 各グループの開始位置（長さはグループ数 + 1）
    offsets: Vec<usize>,
    /// グループ順に並べた行位置
    rows: Vec<usize>,
}

impl GroupIndex {
    /// すべての行を1つのグループにまとめた索引
    pub fn single(n_rows: usize) -> Self {
        GroupIndex {
            offsets: vec![0, n_rows],
            rows: (0..n_rows).collect(),
        }
    }

    /// グループ数
    pub fn n_groups(&self) -> usize {
        self.offsets.len() - 1
    }

    /// 索引に含まれる行数
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// グループ`i`の行位置
    pub fn group(&self, i: usize) -> Option<&[usize]> {
        if i >= self.n_groups() {
            return None;
        }
        Some(&self.rows[self.offsets[i]..self.offsets[i + 1]])
    }

    /// 各グループのサイズ
    pub fn sizes(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// グループ順に行位置のスライスを返すイテレータ
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.rows[w[0]..w[1]])
    }

    /// `Vec<Vec<usize>>`に変換
    pub fn to_vecs(&self) -> Vec<Vec<usize>> {
        self.iter().map(|g| g.to_vec()).collect()
    }
}

/// 行ごとのグループIDから索引を構築
///
/// 1回目の走査で各IDの出現数を数え、2回目の走査で行位置を
/// あらかじめ確保した領域に元の順序のまま配置します（計算量 O(R + G)）。
pub fn build_index(ids: &[usize], n_groups: usize) -> Result<GroupIndex> {
    let mut offsets = vec![0usize; n_groups + 1];
    for &id in ids {
        if id >= n_groups {
            return Err(Error::IndexOutOfBounds {
                index: id,
                size: n_groups,
            });
        }
        offsets[id + 1] += 1;
    }

    for i in 0..n_groups {
        offsets[i + 1] += offsets[i];
    }

    let mut cursor = offsets[..n_groups].to_vec();
    let mut rows = vec![0usize; ids.len()];
    for (row, &id) in ids.iter().enumerate() {
        rows[cursor[id]] = row;
        cursor[id] += 1;
    }

    Ok(GroupIndex { offsets, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_stay_in_original_order() {
        let index = build_index(&[0, 1, 0, 2, 1], 3).unwrap();
        assert_eq!(index.to_vecs(), vec![vec![0, 2], vec![1, 4], vec![3]]);
        assert_eq!(index.sizes(), vec![2, 2, 1]);
        assert_eq!(index.n_rows(), 5);
    }

    #[test]
    fn empty_groups_keep_their_slot() {
        let index = build_index(&[2, 0, 2], 4).unwrap();
        assert_eq!(index.to_vecs(), vec![vec![1], vec![], vec![0, 2], vec![]]);
        assert_eq!(index.group(3), Some(&[][..]));
        assert_eq!(index.group(4), None);
    }

    #[test]
    fn out_of_range_id() {
        assert!(matches!(
            build_index(&[0, 3], 2),
            Err(Error::IndexOutOfBounds { index: 3, size: 2 })
        ));
    }

    #[test]
    fn zero_groups() {
        let index = build_index(&[], 0).unwrap();
        assert_eq!(index.n_groups(), 0);
        assert!(index.sizes().is_empty());
    }
}
