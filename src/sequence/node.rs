//! Nodes of the 2-3 finger tree.
//!
//! A node is either a leaf carrying one element or a branch of two or
//! three children of equal depth. Branches cache the number of leaves
//! below them, which is what makes indexed descent logarithmic.

use super::ReferenceCounter;
use super::bounds::in_prefix;

/// Shared handle to a node. Structural sharing happens at this level:
/// rebuilding a path clones handles, never subtrees.
pub(super) type NodeRef<T> = ReferenceCounter<Node<T>>;

/// Result of an insertion: the rebuilt node plus an optional overflow
/// sibling of the same depth that the caller must place.
pub(super) type NodeInsert<T> = (NodeRef<T>, Option<NodeRef<T>>);

pub(super) enum Node<T> {
    Leaf(T),
    Branch2 {
        size: usize,
        first: NodeRef<T>,
        second: NodeRef<T>,
    },
    Branch3 {
        size: usize,
        first: NodeRef<T>,
        second: NodeRef<T>,
        third: NodeRef<T>,
    },
}

impl<T> Node<T> {
    pub(super) fn leaf(value: T) -> NodeRef<T> {
        ReferenceCounter::new(Self::Leaf(value))
    }

    pub(super) fn branch2(first: NodeRef<T>, second: NodeRef<T>) -> NodeRef<T> {
        debug_assert_eq!(first.depth(), second.depth());
        ReferenceCounter::new(Self::Branch2 {
            size: first.size() + second.size(),
            first,
            second,
        })
    }

    pub(super) fn branch3(first: NodeRef<T>, second: NodeRef<T>, third: NodeRef<T>) -> NodeRef<T> {
        debug_assert_eq!(first.depth(), second.depth());
        debug_assert_eq!(first.depth(), third.depth());
        ReferenceCounter::new(Self::Branch3 {
            size: first.size() + second.size() + third.size(),
            first,
            second,
            third,
        })
    }

    /// Number of leaves below this node.
    pub(super) const fn size(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch2 { size, .. } | Self::Branch3 { size, .. } => *size,
        }
    }

    /// Number of branch layers between this node and its leaves.
    pub(super) fn depth(&self) -> usize {
        match self {
            Self::Leaf(_) => 0,
            Self::Branch2 { first, .. } | Self::Branch3 { first, .. } => first.depth() + 1,
        }
    }

    /// The element carried by a leaf.
    pub(super) fn value(&self) -> &T {
        match self {
            Self::Leaf(value) => value,
            Self::Branch2 { .. } | Self::Branch3 { .. } => {
                unreachable!("branch node where a leaf was expected")
            }
        }
    }

    pub(super) fn get(&self, index: usize) -> &T {
        let mut index = index;
        match self {
            Self::Leaf(value) => {
                debug_assert_eq!(index, 0);
                value
            }
            Self::Branch2 { first, second, .. } => {
                if in_prefix(&mut index, first.size()) {
                    first.get(index)
                } else {
                    second.get(index)
                }
            }
            Self::Branch3 {
                first,
                second,
                third,
                ..
            } => {
                if in_prefix(&mut index, first.size()) {
                    first.get(index)
                } else if in_prefix(&mut index, second.size()) {
                    second.get(index)
                } else {
                    third.get(index)
                }
            }
        }
    }

    /// Rebuilds the path from this node to the leaf at `index`, replacing
    /// the element there.
    pub(super) fn set(&self, index: usize, value: T) -> NodeRef<T> {
        let mut index = index;
        match self {
            Self::Leaf(_) => {
                debug_assert_eq!(index, 0);
                Self::leaf(value)
            }
            Self::Branch2 { first, second, .. } => {
                if in_prefix(&mut index, first.size()) {
                    Self::branch2(first.set(index, value), second.clone())
                } else {
                    Self::branch2(first.clone(), second.set(index, value))
                }
            }
            Self::Branch3 {
                first,
                second,
                third,
                ..
            } => {
                if in_prefix(&mut index, first.size()) {
                    Self::branch3(first.set(index, value), second.clone(), third.clone())
                } else if in_prefix(&mut index, second.size()) {
                    Self::branch3(first.clone(), second.set(index, value), third.clone())
                } else {
                    Self::branch3(first.clone(), second.clone(), third.set(index, value))
                }
            }
        }
    }

    /// Inserts `value` before position `index`.
    ///
    /// A leaf splits in two. A branch absorbs a split child when it has
    /// room, and otherwise splits itself, handing the overflow to its own
    /// caller.
    pub(super) fn insert(node: &NodeRef<T>, index: usize, value: T) -> NodeInsert<T> {
        debug_assert!(index < node.size());
        let mut index = index;
        match node.as_ref() {
            Node::Leaf(_) => (Self::leaf(value), Some(node.clone())),
            Node::Branch2 { first, second, .. } => {
                if in_prefix(&mut index, first.size()) {
                    let (inserted, extra) = Self::insert(first, index, value);
                    match extra {
                        None => (Self::branch2(inserted, second.clone()), None),
                        Some(extra) => (Self::branch3(inserted, extra, second.clone()), None),
                    }
                } else {
                    let (inserted, extra) = Self::insert(second, index, value);
                    match extra {
                        None => (Self::branch2(first.clone(), inserted), None),
                        Some(extra) => (Self::branch3(first.clone(), inserted, extra), None),
                    }
                }
            }
            Node::Branch3 {
                first,
                second,
                third,
                ..
            } => {
                if in_prefix(&mut index, first.size()) {
                    let (inserted, extra) = Self::insert(first, index, value);
                    match extra {
                        None => (
                            Self::branch3(inserted, second.clone(), third.clone()),
                            None,
                        ),
                        Some(extra) => (
                            Self::branch2(inserted, extra),
                            Some(Self::branch2(second.clone(), third.clone())),
                        ),
                    }
                } else if in_prefix(&mut index, second.size()) {
                    let (inserted, extra) = Self::insert(second, index, value);
                    match extra {
                        None => (
                            Self::branch3(first.clone(), inserted, third.clone()),
                            None,
                        ),
                        Some(extra) => (
                            Self::branch2(first.clone(), inserted),
                            Some(Self::branch2(extra, third.clone())),
                        ),
                    }
                } else {
                    let (inserted, extra) = Self::insert(third, index, value);
                    match extra {
                        None => (
                            Self::branch3(first.clone(), second.clone(), inserted),
                            None,
                        ),
                        Some(extra) => (
                            Self::branch2(first.clone(), second.clone()),
                            Some(Self::branch2(inserted, extra)),
                        ),
                    }
                }
            }
        }
    }

    /// Removes the leaf at `index`.
    ///
    /// Returns `(true, node)` when the rebuilt node still has legal
    /// branch arity. `(false, _)` signals an underflow the caller must
    /// absorb: a leaf asks to be consumed outright (`None`), a branch
    /// hands back a node one level shallower than itself.
    pub(super) fn erase(&self, index: usize) -> (bool, Option<NodeRef<T>>) {
        debug_assert!(index < self.size());
        let mut index = index;
        match self {
            Self::Leaf(_) => (false, None),
            Self::Branch2 { first, second, .. } => {
                if in_prefix(&mut index, first.size()) {
                    let (full, erased) = first.erase(index);
                    if full {
                        let Some(erased) = erased else {
                            unreachable!("erase reported full without a node")
                        };
                        (true, Some(Self::branch2(erased, second.clone())))
                    } else {
                        let (full, melded) =
                            Self::meld_right(Self::merge_left(erased, second), None);
                        (full, Some(melded))
                    }
                } else {
                    let (full, erased) = second.erase(index);
                    if full {
                        let Some(erased) = erased else {
                            unreachable!("erase reported full without a node")
                        };
                        (true, Some(Self::branch2(first.clone(), erased)))
                    } else {
                        let (full, melded) =
                            Self::meld_right(Self::merge_right(first, erased), None);
                        (full, Some(melded))
                    }
                }
            }
            Self::Branch3 {
                first,
                second,
                third,
                ..
            } => {
                if in_prefix(&mut index, first.size()) {
                    let (full, erased) = first.erase(index);
                    if full {
                        let Some(erased) = erased else {
                            unreachable!("erase reported full without a node")
                        };
                        (
                            true,
                            Some(Self::branch3(erased, second.clone(), third.clone())),
                        )
                    } else {
                        let (full, melded) =
                            Self::meld_right(Self::merge_left(erased, second), Some(third));
                        (full, Some(melded))
                    }
                } else if in_prefix(&mut index, second.size()) {
                    let (full, erased) = second.erase(index);
                    if full {
                        let Some(erased) = erased else {
                            unreachable!("erase reported full without a node")
                        };
                        (
                            true,
                            Some(Self::branch3(first.clone(), erased, third.clone())),
                        )
                    } else {
                        let (full, melded) =
                            Self::meld_right(Self::merge_right(first, erased), Some(third));
                        (full, Some(melded))
                    }
                } else {
                    let (full, erased) = third.erase(index);
                    if full {
                        let Some(erased) = erased else {
                            unreachable!("erase reported full without a node")
                        };
                        (
                            true,
                            Some(Self::branch3(first.clone(), second.clone(), erased)),
                        )
                    } else {
                        let (full, melded) =
                            Self::meld_left(Some(first), Self::merge_right(second, erased));
                        (full, Some(melded))
                    }
                }
            }
        }
    }

    /// Folds a node one level shallower than `node` into `node`'s
    /// children from the left. Overflow to four children splits into two
    /// branches.
    pub(super) fn merge_left(left: Option<NodeRef<T>>, node: &NodeRef<T>) -> NodeInsert<T> {
        let Some(left) = left else {
            return (node.clone(), None);
        };
        debug_assert_eq!(left.depth() + 1, node.depth());
        match node.as_ref() {
            Node::Leaf(_) => unreachable!("leaf cannot absorb a merged node"),
            Node::Branch2 { first, second, .. } => {
                (Self::branch3(left, first.clone(), second.clone()), None)
            }
            Node::Branch3 {
                first,
                second,
                third,
                ..
            } => (
                Self::branch2(left, first.clone()),
                Some(Self::branch2(second.clone(), third.clone())),
            ),
        }
    }

    /// Mirror image of [`Node::merge_left`].
    pub(super) fn merge_right(node: &NodeRef<T>, right: Option<NodeRef<T>>) -> NodeInsert<T> {
        let Some(right) = right else {
            return (node.clone(), None);
        };
        debug_assert_eq!(node.depth(), right.depth() + 1);
        match node.as_ref() {
            Node::Leaf(_) => unreachable!("leaf cannot absorb a merged node"),
            Node::Branch2 { first, second, .. } => {
                (Self::branch3(first.clone(), second.clone(), right), None)
            }
            Node::Branch3 {
                first,
                second,
                third,
                ..
            } => (
                Self::branch2(first.clone(), second.clone()),
                Some(Self::branch2(third.clone(), right)),
            ),
        }
    }

    /// Combines a merge result with an optional left sibling one level
    /// above the merge, restoring the `(full?, node)` erase contract.
    pub(super) fn meld_left(node: Option<&NodeRef<T>>, merge: NodeInsert<T>) -> (bool, NodeRef<T>) {
        let (merged, extra) = merge;
        match (node, extra) {
            (Some(node), Some(extra)) => (true, Self::branch3(node.clone(), merged, extra)),
            (None, Some(extra)) => (true, Self::branch2(merged, extra)),
            (Some(node), None) => (true, Self::branch2(node.clone(), merged)),
            (None, None) => (false, merged),
        }
    }

    /// Mirror image of [`Node::meld_left`].
    pub(super) fn meld_right(merge: NodeInsert<T>, node: Option<&NodeRef<T>>) -> (bool, NodeRef<T>) {
        let (merged, extra) = merge;
        match (extra, node) {
            (Some(extra), Some(node)) => (true, Self::branch3(merged, extra, node.clone())),
            (Some(extra), None) => (true, Self::branch2(merged, extra)),
            (None, Some(node)) => (true, Self::branch2(merged, node.clone())),
            (None, None) => (false, merged),
        }
    }

    /// Reverses the leaf order below `node`.
    pub(super) fn reverse(node: &NodeRef<T>) -> NodeRef<T> {
        match node.as_ref() {
            Node::Leaf(_) => node.clone(),
            Node::Branch2 { first, second, .. } => {
                Self::branch2(Self::reverse(second), Self::reverse(first))
            }
            Node::Branch3 {
                first,
                second,
                third,
                ..
            } => Self::branch3(
                Self::reverse(third),
                Self::reverse(second),
                Self::reverse(first),
            ),
        }
    }

    /// Maps every leaf below this node, keeping the exact shape.
    pub(super) fn map<B>(&self, transform: &mut impl FnMut(&T) -> B) -> NodeRef<B> {
        match self {
            Self::Leaf(value) => Node::leaf(transform(value)),
            Self::Branch2 { first, second, .. } => {
                let first = first.map(transform);
                let second = second.map(transform);
                Node::branch2(first, second)
            }
            Self::Branch3 {
                first,
                second,
                third,
                ..
            } => {
                let first = first.map(transform);
                let second = second.map(transform);
                let third = third.map(transform);
                Node::branch3(first, second, third)
            }
        }
    }

    /// Builds a perfect ternary node of the given depth, consuming
    /// exactly `3^depth` values.
    pub(super) fn from_values(depth: usize, values: &mut impl Iterator<Item = T>) -> NodeRef<T> {
        if depth == 0 {
            let Some(value) = values.next() else {
                panic!("sized constructor ran out of values")
            };
            return Self::leaf(value);
        }
        let first = Self::from_values(depth - 1, values);
        let second = Self::from_values(depth - 1, values);
        let third = Self::from_values(depth - 1, values);
        Self::branch3(first, second, third)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(value) => f.debug_tuple("Leaf").field(value).finish(),
            Self::Branch2 {
                size,
                first,
                second,
            } => f
                .debug_struct("Branch2")
                .field("size", size)
                .field("first", first)
                .field("second", second)
                .finish(),
            Self::Branch3 {
                size,
                first,
                second,
                third,
            } => f
                .debug_struct("Branch3")
                .field("size", size)
                .field("first", first)
                .field("second", second)
                .field("third", third)
                .finish(),
        }
    }
}
