//! Index and slice normalization.
//!
//! Public operations accept signed indices (negative values count from the
//! back) and half-open slice bounds. The helpers here turn those into the
//! unsigned, in-range positions the tree kernel works with.

use std::ops::{Bound, RangeBounds};

use super::error::SequenceError;

/// Resolves a signed index against a length, failing when the position
/// does not name an existing element.
pub(super) fn resolve_index(length: usize, index: isize) -> Result<usize, SequenceError> {
    let out_of_range = SequenceError::IndexOutOfRange { index, length };
    if index < 0 {
        let back = index
            .checked_add_unsigned(length)
            .ok_or(out_of_range)?;
        usize::try_from(back).map_err(|_| out_of_range)
    } else {
        let position = usize::try_from(index).map_err(|_| out_of_range)?;
        if position < length {
            Ok(position)
        } else {
            Err(out_of_range)
        }
    }
}

/// Resolves a signed split position, clamping instead of failing:
/// anything below `-length` becomes `0`, anything above `length` becomes
/// `length`.
pub(super) fn clamp_index(length: usize, index: isize) -> usize {
    if index < 0 {
        index
            .checked_add_unsigned(length)
            .and_then(|back| usize::try_from(back).ok())
            .unwrap_or(0)
    } else {
        usize::try_from(index).map_or(length, |position| position.min(length))
    }
}

/// Clips an unsigned range to `[0, length]`, yielding half-open bounds
/// with `start <= stop`.
pub(super) fn clip_range(length: usize, range: impl RangeBounds<usize>) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let stop = match range.end_bound() {
        Bound::Included(&stop) => stop.saturating_add(1),
        Bound::Excluded(&stop) => stop,
        Bound::Unbounded => length,
    };
    let stop = stop.min(length);
    (start.min(stop), stop)
}

/// A stepped slice normalized to a forward traversal.
///
/// `start` is the first selected position, `count` the number of selected
/// positions and `step` the forward distance between them. `reversed`
/// records that the caller asked for a negative step, so the selected
/// elements must be emitted back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct SteppedBounds {
    pub(super) start: usize,
    pub(super) count: usize,
    pub(super) step: usize,
    pub(super) reversed: bool,
}

/// Normalizes `(start, stop, step)` slice arguments the way list slicing
/// does: negative positions count from the back, out-of-range positions
/// clip, and a negative step walks backwards with end-inclusive bounds.
pub(super) fn stepped_bounds(
    length: usize,
    start: isize,
    stop: isize,
    step: isize,
) -> Result<SteppedBounds, SequenceError> {
    if step == 0 {
        return Err(SequenceError::ZeroStep);
    }
    let length = length as isize;
    let backwards = step < 0;
    let clip = |position: isize| -> isize {
        let position = if position < 0 {
            position + length
        } else {
            position
        };
        if position < 0 {
            if backwards { -1 } else { 0 }
        } else if position >= length {
            if backwards { length - 1 } else { length }
        } else {
            position
        }
    };
    let start = clip(start);
    let stop = clip(stop);
    let count = if backwards {
        if stop < start {
            (start - stop - 1) / -step + 1
        } else {
            0
        }
    } else if start < stop {
        (stop - start - 1) / step + 1
    } else {
        0
    };
    let (start, step) = if backwards {
        (start + (count - 1) * step, -step)
    } else {
        (start, step)
    };
    Ok(SteppedBounds {
        start: if count == 0 { 0 } else { start as usize },
        count: count as usize,
        step: step as usize,
        reversed: backwards,
    })
}

/// Subtracts `size` from `index` unless `index` falls inside the prefix.
///
/// This is the descent step used throughout the kernel: walk a row of
/// sized children, peeling off each child's extent until the covering
/// child is found.
#[inline]
pub(super) fn in_prefix(index: &mut usize, size: usize) -> bool {
    if *index < size {
        return true;
    }
    *index -= size;
    false
}
