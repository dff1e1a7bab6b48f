//! Growable atom-index bitset.
//!
//! Representation flags, hidden atoms, secondary-structure membership and
//! movie state selections are all sets of atom indices. The set carries an
//! explicit logical length so per-branch sets can be sized to the branch's
//! atom count before they are shifted into the merged index space.

/// A set of atom indices backed by 64-bit words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AtomSet {
    words: Vec<u64>,
    len: usize,
}

const WORD: usize = 64;

impl AtomSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set sized for `len` indices.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD)],
            len,
        }
    }

    /// Create a set of logical length `len` holding `indices`.
    #[must_use]
    pub fn from_indices(
        len: usize,
        indices: impl IntoIterator<Item = usize>,
    ) -> Self {
        let mut set = Self::with_len(len);
        for i in indices {
            set.set(i);
        }
        set
    }

    /// Logical length (one past the highest addressable index).
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.len
    }

    /// Grow the logical length to at least `len`.
    pub fn resize(&mut self, len: usize) {
        if len > self.len {
            self.len = len;
            self.words.resize(len.div_ceil(WORD), 0);
        }
    }

    /// Insert `i`, growing the set if needed.
    pub fn set(&mut self, i: usize) {
        self.resize(i + 1);
        self.words[i / WORD] |= 1 << (i % WORD);
    }

    /// Insert every index in `start..end`.
    pub fn set_range(&mut self, start: usize, end: usize) {
        for i in start..end {
            self.set(i);
        }
    }

    /// Remove `i`.
    pub fn clear(&mut self, i: usize) {
        if i < self.len {
            self.words[i / WORD] &= !(1 << (i % WORD));
        }
    }

    /// Remove every index.
    pub fn clear_all(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Whether `i` is in the set.
    #[must_use]
    pub fn get(&self, i: usize) -> bool {
        i < self.len && self.words[i / WORD] & (1 << (i % WORD)) != 0
    }

    /// Number of indices in the set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether no index is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Smallest index in the set.
    #[must_use]
    pub fn first(&self) -> Option<usize> {
        self.iter().next()
    }

    /// Iterate set indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &word)| {
            let mut w = word;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let bit = w.trailing_zeros() as usize;
                w &= w - 1;
                Some(wi * WORD + bit)
            })
        })
    }

    /// In-place union.
    pub fn union_with(&mut self, other: &AtomSet) {
        self.resize(other.len);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
    }

    /// In-place intersection.
    pub fn intersect_with(&mut self, other: &AtomSet) {
        for (i, a) in self.words.iter_mut().enumerate() {
            *a &= other.words.get(i).copied().unwrap_or(0);
        }
    }

    /// Remove every index that is in `other`.
    pub fn and_not(&mut self, other: &AtomSet) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !*b;
        }
    }

    /// Whether the two sets share any index.
    #[must_use]
    pub fn intersects(&self, other: &AtomSet) -> bool {
        self.words.iter().zip(&other.words).any(|(a, b)| a & b != 0)
    }

    /// Copy of the set with every index moved up by `delta`.
    #[must_use]
    pub fn shifted(&self, delta: usize) -> AtomSet {
        if delta == 0 {
            return self.clone();
        }
        let mut out = AtomSet::with_len(self.len + delta);
        for i in self.iter() {
            out.set(i + delta);
        }
        out
    }
}

impl FromIterator<usize> for AtomSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut set = AtomSet::new();
        for i in iter {
            set.set(i);
        }
        set
    }
}
