//! Fixed-size row grouping for bounded graph writes.

use std::num::NonZeroUsize;

/// Rows per graph write when nothing else is configured.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(size) => size,
    None => unreachable!(),
};

/// Split `rows` into groups of at most `size` rows, preserving order.
///
/// The result is lazy and restartable: iterating it again (or cloning it)
/// yields the same groups. Empty input yields no groups at all.
pub fn chunk<T>(rows: &[T], size: NonZeroUsize) -> Batches<'_, T> {
    Batches { rows, size }
}

/// Row groups produced by [`chunk`].
#[derive(Debug)]
pub struct Batches<'a, T> {
    rows: &'a [T],
    size: NonZeroUsize,
}

// Manual impls: deriving would require `T: Clone`.
impl<T> Clone for Batches<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Batches<'_, T> {}

impl<'a, T> Batches<'a, T> {
    /// Iterate the groups from the start.
    pub fn iter(&self) -> std::slice::Chunks<'a, T> {
        self.rows.chunks(self.size.get())
    }

    /// Number of groups, `ceil(rows / size)`.
    pub fn len(&self) -> usize {
        self.rows.len().div_ceil(self.size.get())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a, T> IntoIterator for Batches<'a, T> {
    type Item = &'a [T];
    type IntoIter = std::slice::Chunks<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &Batches<'a, T> {
    type Item = &'a [T];
    type IntoIter = std::slice::Chunks<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
