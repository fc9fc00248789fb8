//! Column bitset.

/// Set of column indices already modeled on one recursion path.
///
/// Stored as a fixed number of `u64` words sized to the dataset, so a branch
/// snapshot is a plain word copy and set algebra is word-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompletedSet {
    words: Vec<u64>,
    n_columns: usize,
}

impl CompletedSet {
    /// Empty set over `n_columns` columns.
    pub fn new(n_columns: usize) -> Self {
        Self {
            words: vec![0; n_columns.div_ceil(64)],
            n_columns,
        }
    }

    /// Number of columns the set ranges over.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    /// Add `column`; returns `true` if it was not present.
    ///
    /// # Panics
    ///
    /// Panics if `column >= n_columns`.
    pub fn insert(&mut self, column: usize) -> bool {
        assert!(column < self.n_columns, "column {column} out of range");
        let (word, bit) = (column / 64, column % 64);
        let mask = 1u64 << bit;
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    #[inline]
    pub fn contains(&self, column: usize) -> bool {
        column < self.n_columns && self.words[column / 64] & (1u64 << (column % 64)) != 0
    }

    /// Add every member of `other`.
    pub fn union_with(&mut self, other: &CompletedSet) {
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w |= o;
        }
    }

    /// Keep only members of `other`.
    pub fn intersect_with(&mut self, other: &CompletedSet) {
        for (w, o) in self.words.iter_mut().zip(&other.words) {
            *w &= o;
        }
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Members in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.n_columns).filter(move |&c| self.contains(c))
    }
}

impl Extend<usize> for CompletedSet {
    fn extend<T: IntoIterator<Item = usize>>(&mut self, iter: T) {
        for column in iter {
            self.insert(column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_contains() {
        let mut set = CompletedSet::new(130);
        assert!(set.insert(0));
        assert!(set.insert(129));
        assert!(!set.insert(129));
        assert!(set.contains(129));
        assert!(!set.contains(64));
        assert!(!set.contains(500));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 129]);
    }

    #[test]
    fn clones_are_independent() {
        let mut outer = CompletedSet::new(4);
        outer.insert(1);
        let mut branch = outer.clone();
        branch.insert(3);

        assert!(!outer.contains(3));
        assert!(branch.contains(1));
    }

    #[test]
    fn set_algebra() {
        let mut a = CompletedSet::new(70);
        a.extend([1, 2, 65]);
        let mut b = CompletedSet::new(70);
        b.extend([2, 65, 66]);

        let mut both = a.clone();
        both.intersect_with(&b);
        assert_eq!(both.iter().collect::<Vec<_>>(), vec![2, 65]);

        a.union_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1, 2, 65, 66]);
        assert!(CompletedSet::new(3).is_empty());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn insert_out_of_range_panics() {
        CompletedSet::new(2).insert(2);
    }
}
