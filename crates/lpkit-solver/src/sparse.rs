use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error("Invalid vector dimension: {0}")]
    InvalidArgument(i64),
    #[error("Index {index} out of range 1..={dim}")]
    OutOfRange { index: usize, dim: usize },
    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
    #[error("Position index inconsistent at slot {slot}")]
    Inconsistent { slot: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    slot: usize,
    value: f64,
}

/// Sparse vector with fixed dimension and 1-based slots.
///
/// Stored entries live in insertion order; `position[j - 1]` points at the
/// entry for slot `j`, or is `None` for a structural zero. Entries set to
/// zero stay stored until [`SparseVector::clean`] compacts them away.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    position: Vec<Option<usize>>,
    entries: Vec<Entry>,
}

impl SparseVector {
    pub fn new(dim: usize) -> Self {
        Self {
            position: vec![None; dim],
            entries: Vec::new(),
        }
    }

    /// Create a vector from an untyped dimension, rejecting negatives.
    pub fn try_new(dim: i64) -> Result<Self, VectorError> {
        let dim = usize::try_from(dim).map_err(|_| VectorError::InvalidArgument(dim))?;
        Ok(Self::new(dim))
    }

    /// Build a vector by accumulating `(slot, value)` pairs; repeated slots are summed.
    pub fn from_pairs(
        dim: usize,
        pairs: impl IntoIterator<Item = (usize, f64)>,
    ) -> Result<Self, VectorError> {
        let mut v = Self::new(dim);
        for (slot, value) in pairs {
            v.add(slot, value)?;
        }
        Ok(v)
    }

    pub fn dim(&self) -> usize {
        self.position.len()
    }

    /// Number of stored entries, including explicit zeros.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    fn offset(&self, slot: usize) -> Result<Option<usize>, VectorError> {
        if slot == 0 || slot > self.dim() {
            return Err(VectorError::OutOfRange {
                index: slot,
                dim: self.dim(),
            });
        }
        Ok(self.position[slot - 1])
    }

    pub fn get(&self, slot: usize) -> Result<f64, VectorError> {
        Ok(self
            .offset(slot)?
            .map(|k| self.entries[k].value)
            .unwrap_or(0.0))
    }

    /// Store `value` at `slot`. An existing entry is overwritten in place,
    /// even with zero; a zero written to a structural zero stores nothing.
    pub fn set(&mut self, slot: usize, value: f64) -> Result<(), VectorError> {
        match self.offset(slot)? {
            Some(k) => self.entries[k].value = value,
            None if value != 0.0 => {
                self.position[slot - 1] = Some(self.entries.len());
                self.entries.push(Entry { slot, value });
            }
            None => {}
        }
        Ok(())
    }

    /// `v[slot] += delta`
    pub fn add(&mut self, slot: usize, delta: f64) -> Result<(), VectorError> {
        match self.offset(slot)? {
            Some(k) => {
                self.entries[k].value += delta;
                Ok(())
            }
            None => self.set(slot, delta),
        }
    }

    /// Drop every entry; the allocations are kept.
    pub fn clear(&mut self) {
        for entry in &self.entries {
            self.position[entry.slot - 1] = None;
        }
        self.entries.clear();
    }

    /// Remove entries with `|value| <= eps` and compact the storage.
    pub fn clean(&mut self, eps: f64) {
        let position = &mut self.position;
        self.entries.retain(|e| {
            let keep = e.value.abs() > eps;
            if !keep {
                position[e.slot - 1] = None;
            }
            keep
        });
        for (k, entry) in self.entries.iter().enumerate() {
            self.position[entry.slot - 1] = Some(k);
        }
    }

    /// Replace the contents of `self` with those of `src`.
    pub fn copy_from(&mut self, src: &SparseVector) -> Result<(), VectorError> {
        self.ensure_same_dim(src)?;
        self.clear();
        for entry in &src.entries {
            self.position[entry.slot - 1] = Some(self.entries.len());
            self.entries.push(*entry);
        }
        Ok(())
    }

    /// `self := self + a * y` over the union of both supports.
    pub fn linear_combination(&mut self, a: f64, y: &SparseVector) -> Result<(), VectorError> {
        self.ensure_same_dim(y)?;
        if a == 0.0 {
            return Ok(());
        }
        for entry in &y.entries {
            self.add(entry.slot, a * entry.value)?;
        }
        Ok(())
    }

    /// Validate that every stored entry and position slot point at each other.
    pub fn check(&self) -> Result<(), VectorError> {
        for (k, entry) in self.entries.iter().enumerate() {
            if entry.slot == 0 || entry.slot > self.dim() {
                return Err(VectorError::OutOfRange {
                    index: entry.slot,
                    dim: self.dim(),
                });
            }
            if self.position[entry.slot - 1] != Some(k) {
                return Err(VectorError::Inconsistent { slot: entry.slot });
            }
        }
        for (j, pos) in self.position.iter().enumerate() {
            if let Some(k) = *pos {
                if self.entries.get(k).map(|e| e.slot) != Some(j + 1) {
                    return Err(VectorError::Inconsistent { slot: j + 1 });
                }
            }
        }
        Ok(())
    }

    /// Stored `(slot, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().map(|e| (e.slot, e.value))
    }

    fn ensure_same_dim(&self, other: &SparseVector) -> Result<(), VectorError> {
        if self.dim() != other.dim() {
            return Err(VectorError::DimensionMismatch {
                left: self.dim(),
                right: other.dim(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_all_zero() {
        for n in [0, 1, 7] {
            let v = SparseVector::new(n);
            assert_eq!(v.nnz(), 0);
            for j in 1..=n {
                assert_eq!(v.get(j).unwrap(), 0.0);
            }
            v.check().unwrap();
        }
    }

    #[test]
    fn test_negative_dimension() {
        assert_eq!(SparseVector::try_new(-1), Err(VectorError::InvalidArgument(-1)));
        assert_eq!(SparseVector::try_new(3).unwrap().dim(), 3);
    }

    #[test]
    fn test_out_of_range() {
        let mut v = SparseVector::new(3);
        assert!(matches!(v.get(0), Err(VectorError::OutOfRange { index: 0, dim: 3 })));
        assert!(matches!(v.set(4, 1.0), Err(VectorError::OutOfRange { index: 4, dim: 3 })));
    }

    #[test]
    fn test_set_zero_keeps_entry_until_clean() {
        let mut v = SparseVector::new(5);
        v.set(2, 3.5).unwrap();
        assert_eq!(v.get(2).unwrap(), 3.5);
        assert_eq!(v.nnz(), 1);

        v.set(2, 0.0).unwrap();
        assert_eq!(v.get(2).unwrap(), 0.0);
        assert_eq!(v.nnz(), 1);

        // writing zero into a structural zero stores nothing
        v.set(4, 0.0).unwrap();
        assert_eq!(v.nnz(), 1);

        v.clean(0.0);
        assert_eq!(v.nnz(), 0);
        v.check().unwrap();
    }

    #[test]
    fn test_clean_is_idempotent() {
        let mut v = SparseVector::from_pairs(6, [(1, 1e-12), (3, 2.0), (5, -1e-10), (6, -4.0)]).unwrap();
        v.clean(1e-9);
        let once = v.clone();
        v.clean(1e-9);
        assert_eq!(v, once);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.get(3).unwrap(), 2.0);
        assert_eq!(v.get(6).unwrap(), -4.0);
        v.check().unwrap();
    }

    #[test]
    fn test_clear_resets_positions() {
        let mut v = SparseVector::from_pairs(4, [(1, 1.0), (4, 2.0)]).unwrap();
        v.clear();
        assert_eq!(v.nnz(), 0);
        assert_eq!(v.get(4).unwrap(), 0.0);
        v.set(4, 9.0).unwrap();
        assert_eq!(v.nnz(), 1);
        v.check().unwrap();
    }

    #[test]
    fn test_copy_from() {
        let src = SparseVector::from_pairs(3, [(3, 1.5), (1, -2.0)]).unwrap();
        let mut dst = SparseVector::from_pairs(3, [(2, 7.0)]).unwrap();
        dst.copy_from(&src).unwrap();
        assert_eq!(dst.get(2).unwrap(), 0.0);
        assert_eq!(dst.get(3).unwrap(), 1.5);
        assert_eq!(dst.nnz(), 2);
        dst.check().unwrap();

        let mut other = SparseVector::new(4);
        assert!(matches!(
            other.copy_from(&src),
            Err(VectorError::DimensionMismatch { left: 4, right: 3 })
        ));
    }

    #[test]
    fn test_linear_combination() {
        let mut x = SparseVector::from_pairs(4, [(1, 1.0), (2, 2.0)]).unwrap();
        let y = SparseVector::from_pairs(4, [(2, -1.0), (4, 3.0)]).unwrap();

        x.linear_combination(2.0, &y).unwrap();
        assert_eq!(x.get(1).unwrap(), 1.0);
        assert_eq!(x.get(2).unwrap(), 0.0);
        assert_eq!(x.get(4).unwrap(), 6.0);
        // slot 2 summed to an explicit zero and stays stored
        assert_eq!(x.nnz(), 3);
        x.check().unwrap();
    }

    #[test]
    fn test_linear_combination_zero_scale() {
        let mut x = SparseVector::from_pairs(3, [(1, 1.0)]).unwrap();
        let before = x.clone();
        let y = SparseVector::from_pairs(3, [(2, 5.0), (3, 1.0)]).unwrap();
        x.linear_combination(0.0, &y).unwrap();
        assert_eq!(x, before);

        let z = SparseVector::new(2);
        assert!(x.linear_combination(1.0, &z).is_err());
    }

    #[test]
    fn test_from_pairs_sums_repeated_slots() {
        let v = SparseVector::from_pairs(3, [(2, 1.0), (2, 2.5), (1, 1.0)]).unwrap();
        assert_eq!(v.get(2).unwrap(), 3.5);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(2, 3.5), (1, 1.0)]);
    }
}
