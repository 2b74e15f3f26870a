//! # perseq
//!
//! A persistent (immutable) indexed sequence for Rust, built on 2-3
//! finger trees annotated with subtree sizes.
//!
//! ## Overview
//!
//! [`PersistentSequence`] gives amortized constant-time access to both
//! ends and logarithmic-time random access, concatenation, splitting,
//! insertion and deletion. Every update returns a new sequence that
//! shares the bulk of its structure with its predecessor, so old
//! versions remain valid and cheap to keep.
//!
//! ```rust
//! use perseq::PersistentSequence;
//!
//! let seq1: PersistentSequence<i32> = (1..=3).collect();
//! let seq2 = seq1.push_back(4);
//! let seq3 = seq1.clone() + seq2.clone();
//!
//! assert_eq!(seq1.to_vec(), vec![1, 2, 3]);       // original unchanged
//! assert_eq!(seq2.to_vec(), vec![1, 2, 3, 4]);
//! assert_eq!(seq3.to_vec(), vec![1, 2, 3, 1, 2, 3, 4]);
//! assert_eq!(seq3.slice(2..5).to_vec(), vec![3, 1, 2]);
//! ```
//!
//! ## Feature Flags
//!
//! - `arc`: share structure with `Arc` instead of `Rc`, making
//!   sequences `Send + Sync` for thread-safe readers
//! - `serde`: `Serialize`/`Deserialize` support
//!
//! ## References
//!
//! - Hinze & Paterson, "Finger Trees: A Simple General-purpose Data
//!   Structure" (2006)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod sequence;

pub use sequence::PersistentSequence;
pub use sequence::PersistentSequenceIntoIterator;
pub use sequence::PersistentSequenceIterator;
pub use sequence::PersistentSequenceReverseIterator;
pub use sequence::SequenceError;

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use perseq::prelude::*;
///
/// let sequence: PersistentSequence<i32> = (0..4).collect();
/// assert_eq!(sequence.len(), 4);
/// ```
pub mod prelude {
    pub use crate::sequence::PersistentSequence;
    pub use crate::sequence::SequenceError;
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        // Basic smoke test to ensure the library compiles
    }
}
