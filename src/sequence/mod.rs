//! Persistent (immutable) indexed sequence.
//!
//! This module provides [`PersistentSequence`], an immutable sequence with
//! fast access to both ends and logarithmic random access, based on 2-3
//! finger trees annotated with subtree sizes, as described in Hinze &
//! Paterson's "Finger Trees: A Simple General-purpose Data Structure"
//! (2006) and Haskell's `Data.Sequence`.
//!
//! # Overview
//!
//! `PersistentSequence` provides:
//!
//! - amortized O(1) `push_front`, `push_back`, `pop_front`, `pop_back`
//! - O(1) `front`, `back`, `len` and `is_empty`
//! - O(log(min(i, n - i))) `get`, `set`, `insert`, `remove` and `split`
//! - O(log(min(n, m))) `concat`
//! - O(log n) contiguous `slice`
//!
//! All operations return new sequences without modifying the original,
//! and structural sharing keeps the untouched parts common to every
//! version.
//!
//! # Structure
//!
//! A finger tree is either empty, a single node, or a *deep* tree: a
//! digit of 1-4 nodes on each end with a nested middle tree whose nodes
//! are one level deeper. The digits are the "fingers" that make both
//! ends cheap; the middle makes everything else logarithmic. Every
//! branch caches the number of elements below it, which turns positional
//! descent into a counting walk.
//!
//! # Examples
//!
//! ```rust
//! use perseq::PersistentSequence;
//!
//! let sequence: PersistentSequence<i32> = (1..=3).collect();
//! let extended = sequence.push_back(4);
//!
//! // Structural sharing: the original sequence is preserved
//! assert_eq!(sequence.len(), 3);
//! assert_eq!(extended.len(), 4);
//! assert_eq!(extended.back(), Some(&4));
//! ```
//!
//! # References
//!
//! - Hinze & Paterson, "Finger Trees: A Simple General-purpose Data
//!   Structure" (2006)
//! - Haskell `containers`, `Data.Sequence`

use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::ops::RangeBounds;

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer used for structural sharing.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`, making
/// sequences shareable across threads. When disabled (default), it is
/// `std::rc::Rc`, which is faster but single-threaded.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod bounds;
mod digit;
mod error;
mod iter;
mod node;
mod tree;

pub use error::SequenceError;
pub use iter::PersistentSequenceIntoIterator;
pub use iter::PersistentSequenceIterator;
pub use iter::PersistentSequenceReverseIterator;

use bounds::{clamp_index, clip_range, resolve_index, stepped_bounds};
use node::Node;
use tree::Tree;

// =============================================================================
// PersistentSequence Definition
// =============================================================================

/// A persistent (immutable) indexed sequence.
///
/// Every update returns a new sequence; old versions stay valid and
/// share structure with their descendants. Negative indices are accepted
/// where documented and count from the back, so `-1` names the last
/// element.
///
/// # Time Complexity
///
/// | Operation | Complexity |
/// |-----------|------------|
/// | `new`, `singleton` | O(1) |
/// | `len`, `is_empty`, `front`, `back` | O(1) |
/// | `push_front`, `push_back` | amortized O(1) |
/// | `pop_front`, `pop_back` | amortized O(1) |
/// | `get`, `set`, `insert`, `remove` | O(log(min(i, n - i))) |
/// | `split`, `split_at`, `take_front`, `drop_front` | O(log(min(i, n - i))) |
/// | `concat` | O(log(min(n, m))) |
/// | `slice` | O(log n) |
/// | `repeat(k)` | O(log k · log n) |
/// | `reverse`, `map` | O(n) |
/// | `iter` | O(1) to create, O(n) to drain |
///
/// # Examples
///
/// ```rust
/// use perseq::PersistentSequence;
///
/// let sequence: PersistentSequence<i32> = (1..=5).collect();
/// assert_eq!(sequence.get(2), Some(&3));
///
/// let (left, middle, right) = sequence.split(2).unwrap();
/// assert_eq!(middle, 3);
/// assert_eq!(left.to_vec(), vec![1, 2]);
/// assert_eq!(right.to_vec(), vec![4, 5]);
/// ```
pub struct PersistentSequence<T> {
    tree: Tree<T>,
}

impl<T> Clone for PersistentSequence<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

// =============================================================================
// Construction
// =============================================================================

impl<T> PersistentSequence<T> {
    /// Creates a new empty sequence.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = PersistentSequence::new();
    /// assert!(sequence.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { tree: Tree::Empty }
    }

    /// Creates a sequence containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(value: T) -> Self {
        Self {
            tree: Tree::Single(Node::leaf(value)),
        }
    }

    /// Builds a sequence from exactly `length` values of an iterator,
    /// packing the tree bottom-up in one pass. Values beyond `length`
    /// are not consumed.
    ///
    /// This is faster than repeated [`push_back`](Self::push_back) when
    /// the length is known up front; `collect()` uses it internally.
    ///
    /// # Panics
    ///
    /// Panics if the iterator yields fewer than `length` values.
    #[must_use]
    pub fn from_sized(length: usize, values: impl IntoIterator<Item = T>) -> Self {
        let mut values = values.into_iter();
        Self {
            tree: Tree::from_values(length, 0, &mut values),
        }
    }

    /// Creates a sequence from a slice of cloneable values.
    #[must_use]
    pub fn from_slice(values: &[T]) -> Self
    where
        T: Clone,
    {
        Self::from_sized(values.len(), values.iter().cloned())
    }
}

// =============================================================================
// Queries
// =============================================================================

impl<T> PersistentSequence<T> {
    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if the sequence contains no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns a reference to the first element, if any.
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.tree.front().map(|node| node.value())
    }

    /// Returns a reference to the last element, if any.
    #[inline]
    #[must_use]
    pub fn back(&self) -> Option<&T> {
        self.tree.back().map(|node| node.value())
    }

    /// Returns the element at `index`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (10..15).collect();
    /// assert_eq!(sequence.get(2), Some(&12));
    /// assert_eq!(sequence.get(9), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.tree.get(index)
    }

    /// Returns the element at a signed position: negative indices count
    /// from the back, so `get_signed(-1)` is the last element.
    #[must_use]
    pub fn get_signed(&self, index: isize) -> Option<&T> {
        resolve_index(self.len(), index)
            .ok()
            .and_then(|index| self.tree.get(index))
    }

    /// Returns `true` if some element equals `value`.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.iter().any(|element| element == value)
    }

    /// Counts the elements equal to `value`.
    #[must_use]
    pub fn count(&self, value: &T) -> usize
    where
        T: PartialEq,
    {
        self.iter().filter(|element| *element == value).count()
    }

    /// Finds the position of the first element equal to `value`.
    #[must_use]
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.index_of_range(value, ..)
    }

    /// Finds the position of the first element equal to `value` within
    /// `range`, returned relative to the whole sequence.
    #[must_use]
    pub fn index_of_range(&self, value: &T, range: impl RangeBounds<usize>) -> Option<usize>
    where
        T: PartialEq,
    {
        let (start, stop) = clip_range(self.len(), range);
        let mut iter = self.iter();
        if start > 0 {
            iter.nth(start - 1);
        }
        iter.take(stop - start)
            .position(|element| element == value)
            .map(|position| position + start)
    }

    /// Copies the elements into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Creates an iterator over references to the elements, front to
    /// back.
    #[must_use]
    pub fn iter(&self) -> PersistentSequenceIterator<'_, T> {
        PersistentSequenceIterator::new(&self.tree)
    }

    /// Creates an iterator over references to the elements, back to
    /// front.
    #[must_use]
    pub fn reverse_iter(&self) -> PersistentSequenceReverseIterator<'_, T> {
        PersistentSequenceReverseIterator::new(&self.tree)
    }
}

// =============================================================================
// End Operations
// =============================================================================

impl<T> PersistentSequence<T> {
    /// Prepends an element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence = PersistentSequence::singleton(1).push_front(0);
    /// assert_eq!(sequence.to_vec(), vec![0, 1]);
    /// ```
    #[must_use]
    pub fn push_front(&self, value: T) -> Self {
        Self {
            tree: self.tree.push_front(Node::leaf(value)),
        }
    }

    /// Appends an element.
    #[must_use]
    pub fn push_back(&self, value: T) -> Self {
        Self {
            tree: self.tree.push_back(Node::leaf(value)),
        }
    }

    /// Detaches the first element, returning it with the remaining
    /// sequence. `None` when empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=3).collect();
    /// let (first, rest) = sequence.pop_front().unwrap();
    /// assert_eq!(first, 1);
    /// assert_eq!(rest.to_vec(), vec![2, 3]);
    /// ```
    #[must_use]
    pub fn pop_front(&self) -> Option<(T, Self)>
    where
        T: Clone,
    {
        self.tree
            .view_front()
            .map(|(node, rest)| (node.value().clone(), Self { tree: rest }))
    }

    /// Detaches the last element, returning the remaining sequence with
    /// it. `None` when empty.
    #[must_use]
    pub fn pop_back(&self) -> Option<(Self, T)>
    where
        T: Clone,
    {
        self.tree
            .view_back()
            .map(|(rest, node)| (Self { tree: rest }, node.value().clone()))
    }
}

// =============================================================================
// Point Updates
// =============================================================================

impl<T> PersistentSequence<T> {
    /// Replaces the element at a signed position.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfRange`] when the position does not
    /// name an existing element.
    pub fn set(&self, index: isize, value: T) -> Result<Self, SequenceError> {
        let index = resolve_index(self.len(), index)?;
        Ok(Self {
            tree: self.tree.set(index, value),
        })
    }

    /// Replaces multiple positions at once. Positions are resolved
    /// against the original sequence before any update is applied, and
    /// the last pair wins when positions repeat.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfRange`] when any position is invalid;
    /// the sequence is unchanged in that case.
    pub fn set_many(
        &self,
        pairs: impl IntoIterator<Item = (isize, T)>,
    ) -> Result<Self, SequenceError> {
        let mut resolved = Vec::new();
        for (index, value) in pairs {
            resolved.push((resolve_index(self.len(), index)?, value));
        }
        let mut tree = self.tree.clone();
        for (index, value) in resolved {
            tree = tree.set(index, value);
        }
        Ok(Self { tree })
    }

    /// Inserts `value` before the signed position `index`. Out-of-range
    /// positions clamp: anything below `-len` prepends and anything at
    /// or above `len` appends.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=4).collect();
    /// assert_eq!(sequence.insert(2, 0).to_vec(), vec![1, 2, 0, 3, 4]);
    /// assert_eq!(sequence.insert(-10, 0).to_vec(), vec![0, 1, 2, 3, 4]);
    /// assert_eq!(sequence.insert(10, 0).to_vec(), vec![1, 2, 3, 4, 0]);
    /// ```
    #[must_use]
    pub fn insert(&self, index: isize, value: T) -> Self {
        match resolve_index(self.len(), index) {
            Ok(index) => Self {
                tree: self.tree.insert(index, value),
            },
            Err(_) if index < 0 => self.push_front(value),
            Err(_) => self.push_back(value),
        }
    }

    /// Removes the element at a signed position.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfRange`] when the position does not
    /// name an existing element.
    pub fn remove(&self, index: isize) -> Result<Self, SequenceError> {
        let index = resolve_index(self.len(), index)?;
        let (_, tree) = self.tree.erase(index);
        Ok(Self { tree })
    }

    /// Removes the first element equal to `value`.
    ///
    /// # Errors
    ///
    /// [`SequenceError::ValueAbsent`] when no element matches.
    pub fn remove_value(&self, value: &T) -> Result<Self, SequenceError>
    where
        T: PartialEq,
    {
        let index = self.index_of(value).ok_or(SequenceError::ValueAbsent)?;
        let (_, tree) = self.tree.erase(index);
        Ok(Self { tree })
    }
}

// =============================================================================
// Slicing
// =============================================================================

impl<T> PersistentSequence<T> {
    /// Returns the first `count` elements; the whole sequence when
    /// `count >= len`.
    #[must_use]
    pub fn take_front(&self, count: usize) -> Self {
        if count == 0 {
            return Self::new();
        }
        if count >= self.len() {
            return self.clone();
        }
        let (tree, _) = self.tree.take_front(count);
        Self { tree }
    }

    /// Returns the last `count` elements; the whole sequence when
    /// `count >= len`.
    #[must_use]
    pub fn take_back(&self, count: usize) -> Self {
        if count == 0 {
            return Self::new();
        }
        if count >= self.len() {
            return self.clone();
        }
        let (_, tree) = self.tree.take_back(count);
        Self { tree }
    }

    /// Returns everything but the first `count` elements.
    #[must_use]
    pub fn drop_front(&self, count: usize) -> Self {
        self.take_back(self.len() - count.min(self.len()))
    }

    /// Returns everything but the last `count` elements.
    #[must_use]
    pub fn drop_back(&self, count: usize) -> Self {
        self.take_front(self.len() - count.min(self.len()))
    }

    /// Returns the contiguous subsequence selected by `range`, clipped
    /// to the sequence bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=5).collect();
    /// assert_eq!(sequence.slice(1..4).to_vec(), vec![2, 3, 4]);
    /// assert_eq!(sequence.slice(3..).to_vec(), vec![4, 5]);
    /// assert_eq!(sequence.slice(4..2).to_vec(), Vec::<i32>::new());
    /// ```
    #[must_use]
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let (start, stop) = clip_range(self.len(), range);
        if start >= stop {
            return Self::new();
        }
        if start == 0 {
            return self.take_front(stop);
        }
        if stop >= self.len() {
            return self.drop_front(start);
        }
        self.take_front(stop).drop_front(start)
    }

    /// Returns the elements selected by a stepped slice, with list
    /// slicing semantics: signed bounds, clipping, and a negative step
    /// walking backwards.
    ///
    /// # Errors
    ///
    /// [`SequenceError::ZeroStep`] when `step` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=5).collect();
    /// assert_eq!(sequence.slice_step(1, 5, 2).unwrap().to_vec(), vec![2, 4]);
    /// assert_eq!(
    ///     sequence.slice_step(-1, -6, -1).unwrap().to_vec(),
    ///     vec![5, 4, 3, 2, 1]
    /// );
    /// ```
    pub fn slice_step(&self, start: isize, stop: isize, step: isize) -> Result<Self, SequenceError>
    where
        T: Clone,
    {
        let bounds = stepped_bounds(self.len(), start, stop, step)?;
        if bounds.count == 0 {
            return Ok(Self::new());
        }
        let selected = if bounds.step == 1 {
            self.slice(bounds.start..bounds.start + bounds.count)
        } else {
            let mut cursor = self.iter();
            let mut first = true;
            let mut values = std::iter::from_fn(|| {
                let skip = if first {
                    first = false;
                    bounds.start
                } else {
                    bounds.step - 1
                };
                cursor.nth(skip).cloned()
            });
            Self {
                tree: Tree::from_values(bounds.count, 0, &mut values),
            }
        };
        Ok(if bounds.reversed {
            selected.reverse()
        } else {
            selected
        })
    }

    /// Replaces the contiguous range `range` with `values`, which may
    /// have any length. Bounds clip.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=5).collect();
    /// assert_eq!(
    ///     sequence.set_range(1..4, [-1, -2, -3]).to_vec(),
    ///     vec![1, -1, -2, -3, 5]
    /// );
    /// ```
    #[must_use]
    pub fn set_range(
        &self,
        range: impl RangeBounds<usize>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        let (start, stop) = clip_range(self.len(), range);
        let middle: Self = values.into_iter().collect();
        self.take_front(start)
            .concat(&middle)
            .concat(&self.drop_front(stop))
    }

    /// Replaces the positions selected by a stepped slice with `values`,
    /// one for one.
    ///
    /// # Errors
    ///
    /// [`SequenceError::ZeroStep`] when `step` is zero, and
    /// [`SequenceError::LengthMismatch`] when the number of values does
    /// not equal the number of selected positions.
    pub fn set_step(
        &self,
        start: isize,
        stop: isize,
        step: isize,
        values: impl IntoIterator<Item = T>,
    ) -> Result<Self, SequenceError> {
        let bounds = stepped_bounds(self.len(), start, stop, step)?;
        let mut values: Vec<T> = values.into_iter().collect();
        if values.len() != bounds.count {
            return Err(SequenceError::LengthMismatch {
                expected: bounds.count,
                actual: values.len(),
            });
        }
        if bounds.count == 0 {
            return Ok(self.clone());
        }
        if bounds.reversed {
            values.reverse();
        }
        if bounds.step == 1 {
            let middle: Self = values.into_iter().collect();
            return Ok(self
                .take_front(bounds.start)
                .concat(&middle)
                .concat(&self.drop_front(bounds.start + bounds.count)));
        }
        let mut values = values.into_iter();
        let Some(first) = values.next() else {
            unreachable!("count was checked to be nonzero")
        };
        let (mut keep, _, mut rest) = self.tree.split(bounds.start);
        keep = keep.push_back(Node::leaf(first));
        for value in values {
            let (chunk, _, after) = rest.split(bounds.step - 1);
            keep = keep.append(&chunk).push_back(Node::leaf(value));
            rest = after;
        }
        Ok(Self {
            tree: keep.append(&rest),
        })
    }

    /// Removes the contiguous range `range`. Bounds clip.
    #[must_use]
    pub fn remove_range(&self, range: impl RangeBounds<usize>) -> Self {
        let (start, stop) = clip_range(self.len(), range);
        if start >= stop {
            return self.clone();
        }
        if start == 0 {
            return self.drop_front(stop);
        }
        if stop >= self.len() {
            return self.take_front(start);
        }
        self.take_front(start).concat(&self.drop_front(stop))
    }

    /// Removes the positions selected by a stepped slice.
    ///
    /// # Errors
    ///
    /// [`SequenceError::ZeroStep`] when `step` is zero.
    pub fn remove_step(
        &self,
        start: isize,
        stop: isize,
        step: isize,
    ) -> Result<Self, SequenceError> {
        let bounds = stepped_bounds(self.len(), start, stop, step)?;
        if bounds.count == 0 {
            return Ok(self.clone());
        }
        if bounds.step == 1 {
            return Ok(self.remove_range(bounds.start..bounds.start + bounds.count));
        }
        let (mut keep, _, mut rest) = self.tree.split(bounds.start);
        for _ in 1..bounds.count {
            let (chunk, _, after) = rest.split(bounds.step - 1);
            keep = keep.append(&chunk);
            rest = after;
        }
        Ok(Self {
            tree: keep.append(&rest),
        })
    }

    /// Splits at a signed position, returning the elements before it,
    /// the element there, and the elements after it.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfRange`] when the position does not
    /// name an existing element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=4).collect();
    /// let (left, middle, right) = sequence.split(2).unwrap();
    /// assert_eq!((left.to_vec(), middle, right.to_vec()), (vec![1, 2], 3, vec![4]));
    /// assert_eq!(left.push_back(middle).concat(&right), sequence);
    /// ```
    pub fn split(&self, index: isize) -> Result<(Self, T, Self), SequenceError>
    where
        T: Clone,
    {
        let index = resolve_index(self.len(), index)?;
        let (left, node, right) = self.tree.split(index);
        Ok((
            Self { tree: left },
            node.value().clone(),
            Self { tree: right },
        ))
    }

    /// Splits into prefix and suffix at a signed position, clamping
    /// out-of-range positions instead of failing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=4).collect();
    /// let (prefix, suffix) = sequence.split_at(2);
    /// assert_eq!((prefix.to_vec(), suffix.to_vec()), (vec![1, 2], vec![3, 4]));
    /// let (prefix, suffix) = sequence.split_at(-5);
    /// assert_eq!((prefix.len(), suffix.len()), (0, 4));
    /// ```
    #[must_use]
    pub fn split_at(&self, index: isize) -> (Self, Self) {
        let index = clamp_index(self.len(), index);
        if index == 0 {
            return (Self::new(), self.clone());
        }
        if index >= self.len() {
            return (self.clone(), Self::new());
        }
        let (left, node, right) = self.tree.split(index);
        (
            Self { tree: left },
            Self {
                tree: right.push_front(node),
            },
        )
    }

    /// Splits around several positions at once, returning each segment
    /// together with the element following it, plus the final segment.
    /// Positions are signed and must be strictly ascending after
    /// normalization.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfRange`] when a position does not name
    /// an element, [`SequenceError::UnsortedIndices`] when positions are
    /// not ascending.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=4).collect();
    /// let (parts, rest) = sequence.view(&[1, 3]).unwrap();
    /// assert_eq!(parts[0].0.to_vec(), vec![1]);
    /// assert_eq!(parts[0].1, 2);
    /// assert_eq!(parts[1].0.to_vec(), vec![3]);
    /// assert_eq!(parts[1].1, 4);
    /// assert!(rest.is_empty());
    /// ```
    pub fn view(&self, positions: &[isize]) -> Result<(Vec<(Self, T)>, Self), SequenceError>
    where
        T: Clone,
    {
        let mut parts = Vec::with_capacity(positions.len());
        let mut consumed = 0usize;
        let mut rest = self.tree.clone();
        for &position in positions {
            let index = resolve_index(self.len(), position)?;
            if index < consumed {
                return Err(SequenceError::UnsortedIndices);
            }
            let (before, node, after) = rest.split(index - consumed);
            parts.push((Self { tree: before }, node.value().clone()));
            consumed = index + 1;
            rest = after;
        }
        Ok((parts, Self { tree: rest }))
    }

    /// Splits the sequence into chunks of `size` elements; the final
    /// chunk holds the remainder.
    ///
    /// # Errors
    ///
    /// [`SequenceError::ZeroStep`] when `size` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=8).collect();
    /// let chunks = sequence.chunks_of(3).unwrap();
    /// let chunks: Vec<Vec<i32>> = chunks.iter().map(|chunk| chunk.to_vec()).collect();
    /// assert_eq!(chunks, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8]]);
    /// ```
    pub fn chunks_of(&self, size: usize) -> Result<PersistentSequence<Self>, SequenceError> {
        if size == 0 {
            return Err(SequenceError::ZeroStep);
        }
        let mut chunks = PersistentSequence::new();
        let mut rest = self.clone();
        while !rest.is_empty() {
            if rest.len() <= size {
                chunks = chunks.push_back(rest);
                break;
            }
            let (before, node, after) = rest.tree.split(size);
            chunks = chunks.push_back(Self { tree: before });
            rest = Self {
                tree: after.push_front(node),
            };
        }
        Ok(chunks)
    }
}

// =============================================================================
// Whole-Sequence Operations
// =============================================================================

impl<T> PersistentSequence<T> {
    /// Concatenates two sequences. Cost is logarithmic in the shorter
    /// one; both operands are reused structurally.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let left: PersistentSequence<i32> = (1..=2).collect();
    /// let right: PersistentSequence<i32> = (3..=4).collect();
    /// assert_eq!(left.concat(&right).to_vec(), vec![1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        Self {
            tree: self.tree.append(&other.tree),
        }
    }

    /// Repeats the sequence `times` times, by squaring: O(log k)
    /// concatenations.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=2).collect();
    /// assert_eq!(sequence.repeat(3).to_vec(), vec![1, 2, 1, 2, 1, 2]);
    /// assert!(sequence.repeat(0).is_empty());
    /// ```
    #[must_use]
    pub fn repeat(&self, times: usize) -> Self {
        if times == 0 {
            return Self::new();
        }
        let mut result = Tree::Empty;
        let mut tree = self.tree.clone();
        let mut times = times;
        loop {
            if times & 1 == 1 {
                result = tree.append(&result);
            }
            times >>= 1;
            if times == 0 {
                break;
            }
            tree = tree.append(&tree);
        }
        Self { tree: result }
    }

    /// Returns the sequence in reverse order.
    #[must_use]
    pub fn reverse(&self) -> Self {
        Self {
            tree: self.tree.reverse(),
        }
    }

    /// Maps every element through `transform`, preserving the tree
    /// shape exactly.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use perseq::PersistentSequence;
    ///
    /// let sequence: PersistentSequence<i32> = (1..=3).collect();
    /// assert_eq!(sequence.map(|value| value * 2).to_vec(), vec![2, 4, 6]);
    /// ```
    #[must_use]
    pub fn map<B>(&self, mut transform: impl FnMut(&T) -> B) -> PersistentSequence<B> {
        PersistentSequence {
            tree: self.tree.map(&mut transform),
        }
    }

    /// Returns a sorted copy of the sequence.
    #[must_use]
    pub fn sorted(&self) -> Self
    where
        T: Clone + Ord,
    {
        let mut values = self.to_vec();
        values.sort();
        Self::from_sized(values.len(), values)
    }

    /// Returns a copy sorted with a comparator.
    #[must_use]
    pub fn sorted_by(&self, compare: impl FnMut(&T, &T) -> std::cmp::Ordering) -> Self
    where
        T: Clone,
    {
        let mut values = self.to_vec();
        values.sort_by(compare);
        Self::from_sized(values.len(), values)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl<T> Default for PersistentSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for PersistentSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for PersistentSequence<T> {}

impl<T: PartialEq> PartialEq<[T]> for PersistentSequence<T> {
    fn eq(&self, other: &[T]) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: PartialEq> PartialEq<&[T]> for PersistentSequence<T> {
    fn eq(&self, other: &&[T]) -> bool {
        *self == **other
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for PersistentSequence<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self == other.as_slice()
    }
}

impl<T: PartialOrd> PartialOrd for PersistentSequence<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord> Ord for PersistentSequence<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash> Hash for PersistentSequence<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T> FromIterator<T> for PersistentSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let values: Vec<T> = iter.into_iter().collect();
        Self::from_sized(values.len(), values)
    }
}

impl<T> From<Vec<T>> for PersistentSequence<T> {
    fn from(values: Vec<T>) -> Self {
        Self::from_sized(values.len(), values)
    }
}

impl<T> std::ops::Add for PersistentSequence<T> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.concat(&other)
    }
}

impl<T: Clone> IntoIterator for PersistentSequence<T> {
    type Item = T;
    type IntoIter = PersistentSequenceIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        PersistentSequenceIntoIterator::new(self)
    }
}

impl<'a, T> IntoIterator for &'a PersistentSequence<T> {
    type Item = &'a T;
    type IntoIter = PersistentSequenceIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for PersistentSequence<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentSequenceVisitor<T> {
    marker: std::marker::PhantomData<T>,
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::de::Visitor<'de> for PersistentSequenceVisitor<T> {
    type Value = PersistentSequence<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        // Sequential append keeps memory proportional to the input read
        // so far, whatever length the stream claims.
        let mut sequence = PersistentSequence::new();
        while let Some(element) = access.next_element()? {
            sequence = sequence.push_back(element);
        }
        Ok(sequence)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for PersistentSequence<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(PersistentSequenceVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sequence(values: std::ops::Range<i32>) -> PersistentSequence<i32> {
        values.collect()
    }

    mod phase1_construction {
        use super::*;

        #[rstest]
        fn test_new_is_empty() {
            let sequence: PersistentSequence<i32> = PersistentSequence::new();
            assert!(sequence.is_empty());
            assert_eq!(sequence.len(), 0);
        }

        #[rstest]
        fn test_singleton() {
            let sequence = PersistentSequence::singleton(42);
            assert_eq!(sequence.len(), 1);
            assert_eq!(sequence.front(), Some(&42));
            assert_eq!(sequence.back(), Some(&42));
        }

        #[rstest]
        fn test_default() {
            let sequence: PersistentSequence<i32> = PersistentSequence::default();
            assert!(sequence.is_empty());
        }

        #[rstest]
        #[case(0)]
        #[case(1)]
        #[case(4)]
        #[case(9)]
        #[case(100)]
        #[case(1000)]
        fn test_collect_round_trips(#[case] count: i32) {
            let sequence = sequence(0..count);
            assert_eq!(sequence.len(), count as usize);
            assert_eq!(sequence.to_vec(), (0..count).collect::<Vec<_>>());
        }

        #[rstest]
        fn test_from_slice_and_vec() {
            let from_slice = PersistentSequence::from_slice(&[1, 2, 3]);
            let from_vec = PersistentSequence::from(vec![1, 2, 3]);
            assert_eq!(from_slice, from_vec);
        }

        #[rstest]
        fn test_from_sized_stops_at_length() {
            let mut source = 0..;
            let sequence = PersistentSequence::from_sized(5, source.by_ref());
            assert_eq!(sequence.to_vec(), vec![0, 1, 2, 3, 4]);
            assert_eq!(source.next(), Some(5));
        }
    }

    mod phase2_end_operations {
        use super::*;

        #[rstest]
        fn test_push_back_appends() {
            let built = sequence(1..4).push_back(4);
            assert_eq!(built, sequence(1..5));
        }

        #[rstest]
        fn test_concat_with_pushed() {
            // psequence([1,2,3]) + psequence([1,2,3]).append(4)
            let base = sequence(1..4);
            let joined = base.clone() + base.push_back(4);
            assert_eq!(joined.to_vec(), vec![1, 2, 3, 1, 2, 3, 4]);
        }

        #[rstest]
        fn test_push_front_prepends() {
            let built = sequence(1..4).push_front(0);
            assert_eq!(built.to_vec(), vec![0, 1, 2, 3]);
        }

        #[rstest]
        fn test_push_preserves_original() {
            let original = sequence(0..3);
            let pushed = original.push_back(3);
            assert_eq!(original.len(), 3);
            assert_eq!(pushed.len(), 4);
        }

        #[rstest]
        fn test_pop_front_views_head() {
            let (head, rest) = sequence(0..5).pop_front().unwrap();
            assert_eq!(head, 0);
            assert_eq!(rest, sequence(1..5));
        }

        #[rstest]
        fn test_pop_back_views_last() {
            let (rest, last) = sequence(0..5).pop_back().unwrap();
            assert_eq!(last, 4);
            assert_eq!(rest, sequence(0..4));
        }

        #[rstest]
        fn test_empty_end_operations() {
            let empty: PersistentSequence<i32> = PersistentSequence::new();
            assert_eq!(empty.front(), None);
            assert_eq!(empty.back(), None);
            assert!(empty.pop_front().is_none());
            assert!(empty.pop_back().is_none());
        }

        #[rstest]
        fn test_many_pushes_then_pops() {
            let mut forward = PersistentSequence::new();
            for value in 0..200 {
                forward = forward.push_back(value);
            }
            for expected in 0..200 {
                let (head, rest) = forward.pop_front().unwrap();
                assert_eq!(head, expected);
                forward = rest;
            }
            assert!(forward.is_empty());
        }
    }

    mod phase3_point_access {
        use super::*;

        #[rstest]
        fn test_get_every_position() {
            let sequence = sequence(0..100);
            for index in 0..100 {
                assert_eq!(sequence.get(index), Some(&(index as i32)));
            }
            assert_eq!(sequence.get(100), None);
        }

        #[rstest]
        fn test_get_signed() {
            let sequence = sequence(0..5);
            assert_eq!(sequence.get_signed(-1), Some(&4));
            assert_eq!(sequence.get_signed(-5), Some(&0));
            assert_eq!(sequence.get_signed(-6), None);
            assert_eq!(sequence.get_signed(2), Some(&2));
        }

        #[rstest]
        fn test_set_replaces_one_element() {
            let sequence = sequence(1..5);
            let updated = sequence.set(2, 0).unwrap();
            assert_eq!(updated.to_vec(), vec![1, 2, 0, 4]);
            assert_eq!(sequence.to_vec(), vec![1, 2, 3, 4]);
            let updated = sequence.set(-1, 0).unwrap();
            assert_eq!(updated.to_vec(), vec![1, 2, 3, 0]);
        }

        #[rstest]
        fn test_set_out_of_range() {
            let sequence = sequence(1..5);
            assert_eq!(
                sequence.set(4, 0),
                Err(SequenceError::IndexOutOfRange {
                    index: 4,
                    length: 4
                })
            );
        }

        #[rstest]
        fn test_insert_middle_and_clamps() {
            let sequence = sequence(1..5);
            assert_eq!(sequence.insert(2, 0).to_vec(), vec![1, 2, 0, 3, 4]);
            assert_eq!(sequence.insert(-10, 0).to_vec(), vec![0, 1, 2, 3, 4]);
            assert_eq!(sequence.insert(10, 0).to_vec(), vec![1, 2, 3, 4, 0]);
            assert_eq!(sequence.insert(-1, 0).to_vec(), vec![1, 2, 3, 0, 4]);
        }

        #[rstest]
        fn test_insert_every_position() {
            let sequence = sequence(0..50);
            for index in 0..50 {
                let inserted = sequence.insert(index, 99);
                let mut expected: Vec<i32> = (0..50).collect();
                expected.insert(index as usize, 99);
                assert_eq!(inserted.to_vec(), expected);
            }
        }

        #[rstest]
        fn test_remove_every_position() {
            let sequence = sequence(0..50);
            for index in 0..50 {
                let removed = sequence.remove(index).unwrap();
                let mut expected: Vec<i32> = (0..50).collect();
                expected.remove(index as usize);
                assert_eq!(removed.to_vec(), expected);
            }
        }

        #[rstest]
        fn test_remove_errors() {
            let sequence = sequence(0..3);
            assert!(sequence.remove(3).is_err());
            assert!(sequence.remove(-4).is_err());
            let empty: PersistentSequence<i32> = PersistentSequence::new();
            assert!(empty.remove(0).is_err());
        }

        #[rstest]
        fn test_set_many() {
            let sequence = sequence(1..5);
            let updated = sequence.set_many([(2, 0), (3, 5)]).unwrap();
            assert_eq!(updated.to_vec(), vec![1, 2, 0, 5]);
            // last pair wins on duplicates
            let updated = sequence.set_many([(1, 7), (1, 8)]).unwrap();
            assert_eq!(updated.to_vec(), vec![1, 8, 3, 4]);
            assert!(sequence.set_many([(5, 0)]).is_err());
        }
    }

    mod phase4_slicing {
        use super::*;

        #[rstest]
        fn test_slice_contiguous() {
            let sequence = sequence(1..6);
            assert_eq!(sequence.slice(1..4).to_vec(), vec![2, 3, 4]);
            assert_eq!(sequence.slice(..).len(), 5);
            assert_eq!(sequence.slice(3..10).to_vec(), vec![4, 5]);
            assert!(sequence.slice(4..2).is_empty());
        }

        #[rstest]
        fn test_slice_step() {
            let sequence = sequence(1..6);
            assert_eq!(sequence.slice_step(1, 5, 2).unwrap().to_vec(), vec![2, 4]);
            assert_eq!(
                sequence.slice_step(0, 5, 1).unwrap().to_vec(),
                vec![1, 2, 3, 4, 5]
            );
            assert_eq!(
                sequence.slice_step(-1, -6, -2).unwrap().to_vec(),
                vec![5, 3, 1]
            );
            assert_eq!(sequence.slice_step(0, 5, 0), Err(SequenceError::ZeroStep));
            assert!(sequence.slice_step(3, 1, 1).unwrap().is_empty());
        }

        #[rstest]
        fn test_take_and_drop_clip() {
            let sequence = sequence(0..10);
            assert_eq!(sequence.take_front(3).to_vec(), vec![0, 1, 2]);
            assert_eq!(sequence.take_front(100), sequence);
            assert_eq!(sequence.drop_front(7).to_vec(), vec![7, 8, 9]);
            assert!(sequence.drop_front(100).is_empty());
            assert_eq!(sequence.take_back(2).to_vec(), vec![8, 9]);
            assert_eq!(sequence.drop_back(8).to_vec(), vec![0, 1]);
        }

        #[rstest]
        fn test_split_matches_model() {
            let sequence = sequence(1..5);
            let (left, middle, right) = sequence.split(2).unwrap();
            assert_eq!(left.to_vec(), vec![1, 2]);
            assert_eq!(middle, 3);
            assert_eq!(right.to_vec(), vec![4]);
            assert_eq!(left.push_back(middle).concat(&right), sequence);
        }

        #[rstest]
        fn test_split_empty_errors() {
            let empty: PersistentSequence<i32> = PersistentSequence::new();
            assert!(empty.split(0).is_err());
        }

        #[rstest]
        fn test_split_at_clamps() {
            let sequence = sequence(1..5);
            assert_eq!(sequence.split_at(2).0.to_vec(), vec![1, 2]);
            assert_eq!(sequence.split_at(9).0.len(), 4);
            assert_eq!(sequence.split_at(-1).1.to_vec(), vec![4]);
            assert_eq!(sequence.split_at(-9).0.len(), 0);
        }

        #[rstest]
        fn test_view_single_and_multiple() {
            let sequence = sequence(1..5);
            let (parts, rest) = sequence.view(&[0]).unwrap();
            assert!(parts[0].0.is_empty());
            assert_eq!(parts[0].1, 1);
            assert_eq!(rest.to_vec(), vec![2, 3, 4]);

            let (parts, rest) = sequence.view(&[1, 3]).unwrap();
            assert_eq!(parts[0].0.to_vec(), vec![1]);
            assert_eq!(parts[0].1, 2);
            assert_eq!(parts[1].0.to_vec(), vec![3]);
            assert_eq!(parts[1].1, 4);
            assert!(rest.is_empty());
        }

        #[rstest]
        fn test_view_errors() {
            let sequence = sequence(1..5);
            assert_eq!(
                sequence.view(&[5]),
                Err(SequenceError::IndexOutOfRange {
                    index: 5,
                    length: 4
                })
            );
            assert_eq!(
                sequence.view(&[2, 1]),
                Err(SequenceError::UnsortedIndices)
            );
            assert_eq!(sequence.view(&[1, 1]), Err(SequenceError::UnsortedIndices));
        }

        #[rstest]
        fn test_chunks_of() {
            let sequence = sequence(1..9);
            let chunks = sequence.chunks_of(3).unwrap();
            let collected: Vec<Vec<i32>> = chunks.iter().map(|chunk| chunk.to_vec()).collect();
            assert_eq!(
                collected,
                vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8]]
            );
            assert_eq!(sequence.chunks_of(0), Err(SequenceError::ZeroStep));
            assert!(
                PersistentSequence::<i32>::new()
                    .chunks_of(3)
                    .unwrap()
                    .is_empty()
            );
        }
    }

    mod phase5_bulk_updates {
        use super::*;

        #[rstest]
        fn test_set_range() {
            let sequence = sequence(1..6);
            let updated = sequence.set_range(1..4, [-1, -2, -3]);
            assert_eq!(updated.to_vec(), vec![1, -1, -2, -3, 5]);
            // replacement length may differ from the range length
            let updated = sequence.set_range(1..4, [0]);
            assert_eq!(updated.to_vec(), vec![1, 0, 5]);
        }

        #[rstest]
        fn test_set_step() {
            let sequence = sequence(0..6);
            let updated = sequence.set_step(0, 6, 2, [10, 12, 14]).unwrap();
            assert_eq!(updated.to_vec(), vec![10, 1, 12, 3, 14, 5]);
            assert_eq!(
                sequence.set_step(0, 6, 2, [1]),
                Err(SequenceError::LengthMismatch {
                    expected: 3,
                    actual: 1
                })
            );
        }

        #[rstest]
        fn test_set_step_negative_walks_backwards() {
            let sequence = sequence(0..6);
            let updated = sequence.set_step(-1, -7, -2, [15, 13, 11]).unwrap();
            assert_eq!(updated.to_vec(), vec![0, 11, 2, 13, 4, 15]);
        }

        #[rstest]
        fn test_remove_range_and_step() {
            let sequence = sequence(1..6);
            assert_eq!(sequence.remove_range(1..4).to_vec(), vec![1, 5]);
            assert_eq!(sequence.remove_range(3..100).to_vec(), vec![1, 2, 3]);
            assert_eq!(sequence.remove_range(4..2), sequence);
            let removed = sequence.remove_step(0, 5, 2).unwrap();
            assert_eq!(removed.to_vec(), vec![2, 4]);
        }

        #[rstest]
        fn test_remove_value() {
            let sequence = sequence(1..5);
            assert_eq!(sequence.remove_value(&2).unwrap().to_vec(), vec![1, 3, 4]);
            assert_eq!(sequence.remove_value(&0), Err(SequenceError::ValueAbsent));
        }

        #[rstest]
        fn test_concat_identities() {
            let sequence = sequence(0..20);
            let empty = PersistentSequence::new();
            assert_eq!(sequence.concat(&empty), sequence);
            assert_eq!(empty.concat(&sequence), sequence);
        }

        #[rstest]
        #[case(0, 0)]
        #[case(1, 30)]
        #[case(17, 5)]
        #[case(64, 64)]
        fn test_concat_sizes(#[case] left: i32, #[case] right: i32) {
            let joined = sequence(0..left).concat(&sequence(0..right));
            let mut expected: Vec<i32> = (0..left).collect();
            expected.extend(0..right);
            assert_eq!(joined.to_vec(), expected);
        }

        #[rstest]
        #[case(0)]
        #[case(1)]
        #[case(2)]
        #[case(7)]
        fn test_repeat(#[case] times: usize) {
            let sequence = sequence(1..4);
            let repeated = sequence.repeat(times);
            let expected: Vec<i32> = (0..times).flat_map(|_| 1..4).collect();
            assert_eq!(repeated.to_vec(), expected);
        }

        #[rstest]
        fn test_reverse() {
            let sequence = sequence(0..40);
            assert_eq!(
                sequence.reverse().to_vec(),
                (0..40).rev().collect::<Vec<_>>()
            );
            assert_eq!(sequence.reverse().reverse(), sequence);
        }

        #[rstest]
        fn test_map_changes_type() {
            let sequence = sequence(1..4);
            let mapped = sequence.map(|value| value.to_string());
            assert_eq!(mapped.to_vec(), vec!["1", "2", "3"]);
        }

        #[rstest]
        fn test_sorted() {
            let sequence: PersistentSequence<i32> = [3, 1, 4, 1, 5].into_iter().collect();
            assert_eq!(sequence.sorted().to_vec(), vec![1, 1, 3, 4, 5]);
            let descending = sequence.sorted_by(|a, b| b.cmp(a));
            assert_eq!(descending.to_vec(), vec![5, 4, 3, 1, 1]);
        }
    }

    mod phase6_queries {
        use super::*;

        #[rstest]
        fn test_contains_and_count() {
            let sequence: PersistentSequence<i32> = [1, 2, 3, 3, 4].into_iter().collect();
            assert!(sequence.contains(&3));
            assert!(!sequence.contains(&9));
            assert_eq!(sequence.count(&3), 2);
            assert_eq!(sequence.count(&9), 0);
        }

        #[rstest]
        fn test_index_of() {
            let sequence: PersistentSequence<i32> = [1, 2, 3, 2, 1].into_iter().collect();
            assert_eq!(sequence.index_of(&2), Some(1));
            assert_eq!(sequence.index_of(&9), None);
            assert_eq!(sequence.index_of_range(&2, 2..), Some(3));
            assert_eq!(sequence.index_of_range(&1, 1..4), None);
        }
    }

    mod phase7_comparison {
        use super::*;
        use std::collections::hash_map::DefaultHasher;

        fn hash_of<T: Hash>(value: &T) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        #[rstest]
        fn test_equality_is_elementwise() {
            assert_eq!(sequence(0..10), sequence(0..10));
            assert_ne!(sequence(0..10), sequence(0..9));
            assert_ne!(sequence(0..10), sequence(1..11));
        }

        #[rstest]
        fn test_equality_ignores_shape() {
            // same elements, different construction histories
            let pushed: PersistentSequence<i32> =
                (0..50).rev().fold(PersistentSequence::new(), |acc, v| {
                    acc.push_front(v)
                });
            let collected = sequence(0..50);
            let glued = sequence(0..20).concat(&sequence(20..50));
            assert_eq!(pushed, collected);
            assert_eq!(glued, collected);
            assert_eq!(hash_of(&pushed), hash_of(&collected));
            assert_eq!(hash_of(&glued), hash_of(&collected));
        }

        #[rstest]
        fn test_equality_with_slices_and_vecs() {
            let sequence = sequence(1..4);
            assert_eq!(sequence, vec![1, 2, 3]);
            assert_eq!(sequence, [1, 2, 3].as_slice());
        }

        #[rstest]
        fn test_lexicographic_order() {
            assert!(sequence(1..4) < sequence(2..5));
            assert!(sequence(1..4) < sequence(1..5));
            assert!(sequence(1..4) >= sequence(1..4));
            assert!(sequence(2..3) > sequence(1..9));
        }
    }

    #[cfg(feature = "serde")]
    mod phase8_serde {
        use super::*;

        #[rstest]
        fn test_serialize_as_list() {
            let sequence = sequence(1..4);
            assert_eq!(serde_json::to_string(&sequence).unwrap(), "[1,2,3]");
        }

        #[rstest]
        fn test_round_trip() {
            let sequence = sequence(0..100);
            let encoded = serde_json::to_string(&sequence).unwrap();
            let decoded: PersistentSequence<i32> = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, sequence);
        }
    }
}
