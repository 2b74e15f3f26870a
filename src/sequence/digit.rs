//! Digits: the 1-4 node groups at either end of a deep tree.

use super::bounds::in_prefix;
use super::node::{Node, NodeInsert, NodeRef};

/// Which end of a deep tree a digit sits on. Decides where an
/// overflowing insertion spills: a left digit spills toward the middle
/// on its right, a right digit toward the middle on its left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Side {
    Left,
    Right,
}

/// Outcome of erasing from a digit: either a rebuilt digit, or the
/// collapse of a one-member digit into a bare (possibly absent) node the
/// enclosing tree must absorb.
pub(super) enum DigitErase<T> {
    Digit(Digit<T>),
    Underflow(Option<NodeRef<T>>),
}

pub(super) enum Digit<T> {
    One(NodeRef<T>),
    Two(NodeRef<T>, NodeRef<T>),
    Three(NodeRef<T>, NodeRef<T>, NodeRef<T>),
    Four(NodeRef<T>, NodeRef<T>, NodeRef<T>, NodeRef<T>),
}

impl<T> Clone for Digit<T> {
    fn clone(&self) -> Self {
        match self {
            Self::One(first) => Self::One(first.clone()),
            Self::Two(first, second) => Self::Two(first.clone(), second.clone()),
            Self::Three(first, second, third) => {
                Self::Three(first.clone(), second.clone(), third.clone())
            }
            Self::Four(first, second, third, fourth) => {
                Self::Four(first.clone(), second.clone(), third.clone(), fourth.clone())
            }
        }
    }
}

impl<T> Digit<T> {
    /// Number of member nodes, always 1 to 4.
    pub(super) const fn arity(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Two(..) => 2,
            Self::Three(..) => 3,
            Self::Four(..) => 4,
        }
    }

    /// Number of leaves below the digit. Each member caches its own
    /// size, so this is a constant number of additions.
    pub(super) fn size(&self) -> usize {
        match self {
            Self::One(first) => first.size(),
            Self::Two(first, second) => first.size() + second.size(),
            Self::Three(first, second, third) => first.size() + second.size() + third.size(),
            Self::Four(first, second, third, fourth) => {
                first.size() + second.size() + third.size() + fourth.size()
            }
        }
    }

    pub(super) fn depth(&self) -> usize {
        self.head().depth()
    }

    pub(super) const fn head(&self) -> &NodeRef<T> {
        match self {
            Self::One(first)
            | Self::Two(first, _)
            | Self::Three(first, _, _)
            | Self::Four(first, _, _, _) => first,
        }
    }

    pub(super) const fn last(&self) -> &NodeRef<T> {
        match self {
            Self::One(first) => first,
            Self::Two(_, second) => second,
            Self::Three(_, _, third) => third,
            Self::Four(_, _, _, fourth) => fourth,
        }
    }

    /// Grows the digit at the front; `None` when already at arity 4, in
    /// which case the enclosing tree must overflow into its middle.
    pub(super) fn push_front(&self, node: NodeRef<T>) -> Option<Self> {
        match self {
            Self::One(first) => Some(Self::Two(node, first.clone())),
            Self::Two(first, second) => Some(Self::Three(node, first.clone(), second.clone())),
            Self::Three(first, second, third) => Some(Self::Four(
                node,
                first.clone(),
                second.clone(),
                third.clone(),
            )),
            Self::Four(..) => None,
        }
    }

    /// Mirror image of [`Digit::push_front`].
    pub(super) fn push_back(&self, node: NodeRef<T>) -> Option<Self> {
        match self {
            Self::One(first) => Some(Self::Two(first.clone(), node)),
            Self::Two(first, second) => Some(Self::Three(first.clone(), second.clone(), node)),
            Self::Three(first, second, third) => Some(Self::Four(
                first.clone(),
                second.clone(),
                third.clone(),
                node,
            )),
            Self::Four(..) => None,
        }
    }

    /// Splits off the front member, leaving the rest of the digit when
    /// any members remain.
    pub(super) fn pop_front(&self) -> (Option<Self>, NodeRef<T>) {
        match self {
            Self::One(first) => (None, first.clone()),
            Self::Two(first, second) => (Some(Self::One(second.clone())), first.clone()),
            Self::Three(first, second, third) => (
                Some(Self::Two(second.clone(), third.clone())),
                first.clone(),
            ),
            Self::Four(first, second, third, fourth) => (
                Some(Self::Three(second.clone(), third.clone(), fourth.clone())),
                first.clone(),
            ),
        }
    }

    /// Mirror image of [`Digit::pop_front`].
    pub(super) fn pop_back(&self) -> (Option<Self>, NodeRef<T>) {
        match self {
            Self::One(first) => (None, first.clone()),
            Self::Two(first, second) => (Some(Self::One(first.clone())), second.clone()),
            Self::Three(first, second, third) => (
                Some(Self::Two(first.clone(), second.clone())),
                third.clone(),
            ),
            Self::Four(first, second, third, fourth) => (
                Some(Self::Three(first.clone(), second.clone(), third.clone())),
                fourth.clone(),
            ),
        }
    }

    /// Unpacks a branch node into a digit of its children, one level
    /// below the branch.
    pub(super) fn from_node(node: &NodeRef<T>) -> Self {
        match node.as_ref() {
            Node::Leaf(_) => unreachable!("leaf node cannot become a digit"),
            Node::Branch2 { first, second, .. } => Self::Two(first.clone(), second.clone()),
            Node::Branch3 {
                first,
                second,
                third,
                ..
            } => Self::Three(first.clone(), second.clone(), third.clone()),
        }
    }

    pub(super) fn from_slice(nodes: &[NodeRef<T>]) -> Self {
        match nodes {
            [first] => Self::One(first.clone()),
            [first, second] => Self::Two(first.clone(), second.clone()),
            [first, second, third] => Self::Three(first.clone(), second.clone(), third.clone()),
            [first, second, third, fourth] => Self::Four(
                first.clone(),
                second.clone(),
                third.clone(),
                fourth.clone(),
            ),
            _ => unreachable!("digit arity must be 1 to 4"),
        }
    }

    pub(super) fn from_merge(merge: NodeInsert<T>) -> Self {
        let (node, extra) = merge;
        match extra {
            None => Self::One(node),
            Some(extra) => Self::Two(node, extra),
        }
    }

    pub(super) fn to_vec(&self) -> Vec<NodeRef<T>> {
        match self {
            Self::One(first) => vec![first.clone()],
            Self::Two(first, second) => vec![first.clone(), second.clone()],
            Self::Three(first, second, third) => {
                vec![first.clone(), second.clone(), third.clone()]
            }
            Self::Four(first, second, third, fourth) => {
                vec![first.clone(), second.clone(), third.clone(), fourth.clone()]
            }
        }
    }

    /// Index of the member covering `index`, with `index` reduced to an
    /// offset within that member.
    fn covering(nodes: &[NodeRef<T>], index: &mut usize) -> usize {
        for (position, node) in nodes.iter().enumerate() {
            if in_prefix(index, node.size()) {
                return position;
            }
        }
        unreachable!("index beyond digit size")
    }

    pub(super) fn get(&self, index: usize) -> &T {
        debug_assert!(index < self.size());
        let mut index = index;
        match self {
            Self::One(first) => first.get(index),
            Self::Two(first, second) => {
                if in_prefix(&mut index, first.size()) {
                    first.get(index)
                } else {
                    second.get(index)
                }
            }
            Self::Three(first, second, third) => {
                if in_prefix(&mut index, first.size()) {
                    first.get(index)
                } else if in_prefix(&mut index, second.size()) {
                    second.get(index)
                } else {
                    third.get(index)
                }
            }
            Self::Four(first, second, third, fourth) => {
                if in_prefix(&mut index, first.size()) {
                    first.get(index)
                } else if in_prefix(&mut index, second.size()) {
                    second.get(index)
                } else if in_prefix(&mut index, third.size()) {
                    third.get(index)
                } else {
                    fourth.get(index)
                }
            }
        }
    }

    pub(super) fn set(&self, index: usize, value: T) -> Self {
        debug_assert!(index < self.size());
        let mut index = index;
        let mut nodes = self.to_vec();
        let mid = Self::covering(&nodes, &mut index);
        nodes[mid] = nodes[mid].set(index, value);
        Self::from_slice(&nodes)
    }

    /// Inserts `value` before position `index`, splitting the covering
    /// member as needed. When the digit would exceed arity 4, three
    /// members stay in the digit and the two members nearest the middle
    /// become an overflow branch for the enclosing tree.
    pub(super) fn insert(&self, index: usize, value: T, side: Side) -> (Self, Option<NodeRef<T>>) {
        debug_assert!(index < self.size());
        let mut index = index;
        let mut nodes = self.to_vec();
        let mid = Self::covering(&nodes, &mut index);
        let (inserted, extra) = Node::insert(&nodes[mid], index, value);
        nodes[mid] = inserted;
        if let Some(extra) = extra {
            nodes.insert(mid + 1, extra);
        }
        if nodes.len() <= 4 {
            return (Self::from_slice(&nodes), None);
        }
        match side {
            Side::Left => (
                Self::from_slice(&nodes[..3]),
                Some(Node::branch2(nodes[3].clone(), nodes[4].clone())),
            ),
            Side::Right => (
                Self::from_slice(&nodes[2..]),
                Some(Node::branch2(nodes[0].clone(), nodes[1].clone())),
            ),
        }
    }

    /// Erases the leaf at `index`. An underflowing member is merged into
    /// an adjacent sibling; a one-member digit collapses entirely and
    /// hands its remains to the enclosing tree.
    pub(super) fn erase(&self, index: usize) -> DigitErase<T> {
        debug_assert!(index < self.size());
        let mut index = index;
        let mut nodes = self.to_vec();
        let mid = Self::covering(&nodes, &mut index);
        let (full, erased) = nodes[mid].erase(index);
        if full {
            let Some(erased) = erased else {
                unreachable!("erase reported full without a node")
            };
            nodes[mid] = erased;
            return DigitErase::Digit(Self::from_slice(&nodes));
        }
        if nodes.len() == 1 {
            return DigitErase::Underflow(erased);
        }
        if mid + 1 == nodes.len() {
            let (merged, extra) = Node::merge_right(&nodes[mid - 1], erased);
            nodes[mid - 1] = merged;
            match extra {
                None => {
                    nodes.pop();
                }
                Some(extra) => nodes[mid] = extra,
            }
        } else {
            let (merged, extra) = Node::merge_left(erased, &nodes[mid + 1]);
            nodes[mid] = merged;
            match extra {
                None => {
                    nodes.remove(mid + 1);
                }
                Some(extra) => nodes[mid + 1] = extra,
            }
        }
        DigitErase::Digit(Self::from_slice(&nodes))
    }

    /// Lifts a node-level left merge into a digit one level below
    /// `node`: `left` (two levels below `node`) is folded into the first
    /// child of `node`, and the children become the digit.
    pub(super) fn merge_left(left: Option<NodeRef<T>>, node: &NodeRef<T>) -> Self {
        let Some(left) = left else {
            return Self::from_node(node);
        };
        match node.as_ref() {
            Node::Leaf(_) => unreachable!("leaf node cannot absorb a merge"),
            Node::Branch2 { first, second, .. } => {
                let (merged, extra) = Node::merge_left(Some(left), first);
                match extra {
                    None => Self::Two(merged, second.clone()),
                    Some(extra) => Self::Three(merged, extra, second.clone()),
                }
            }
            Node::Branch3 {
                first,
                second,
                third,
                ..
            } => {
                let (merged, extra) = Node::merge_left(Some(left), first);
                match extra {
                    None => Self::Three(merged, second.clone(), third.clone()),
                    Some(extra) => Self::Four(merged, extra, second.clone(), third.clone()),
                }
            }
        }
    }

    /// Mirror image of [`Digit::merge_left`].
    pub(super) fn merge_right(node: &NodeRef<T>, right: Option<NodeRef<T>>) -> Self {
        let Some(right) = right else {
            return Self::from_node(node);
        };
        match node.as_ref() {
            Node::Leaf(_) => unreachable!("leaf node cannot absorb a merge"),
            Node::Branch2 { first, second, .. } => {
                let (merged, extra) = Node::merge_right(second, Some(right));
                match extra {
                    None => Self::Two(first.clone(), merged),
                    Some(extra) => Self::Three(first.clone(), merged, extra),
                }
            }
            Node::Branch3 {
                first,
                second,
                third,
                ..
            } => {
                let (merged, extra) = Node::merge_right(third, Some(right));
                match extra {
                    None => Self::Three(first.clone(), second.clone(), merged),
                    Some(extra) => Self::Four(first.clone(), second.clone(), merged, extra),
                }
            }
        }
    }

    /// Reverses member order and every member below.
    pub(super) fn reverse(&self) -> Self {
        match self {
            Self::One(first) => Self::One(Node::reverse(first)),
            Self::Two(first, second) => Self::Two(Node::reverse(second), Node::reverse(first)),
            Self::Three(first, second, third) => Self::Three(
                Node::reverse(third),
                Node::reverse(second),
                Node::reverse(first),
            ),
            Self::Four(first, second, third, fourth) => Self::Four(
                Node::reverse(fourth),
                Node::reverse(third),
                Node::reverse(second),
                Node::reverse(first),
            ),
        }
    }

    pub(super) fn map<B>(&self, transform: &mut impl FnMut(&T) -> B) -> Digit<B> {
        match self {
            Self::One(first) => Digit::One(first.map(transform)),
            Self::Two(first, second) => {
                let first = first.map(transform);
                let second = second.map(transform);
                Digit::Two(first, second)
            }
            Self::Three(first, second, third) => {
                let first = first.map(transform);
                let second = second.map(transform);
                let third = third.map(transform);
                Digit::Three(first, second, third)
            }
            Self::Four(first, second, third, fourth) => {
                let first = first.map(transform);
                let second = second.map(transform);
                let third = third.map(transform);
                let fourth = fourth.map(transform);
                Digit::Four(first, second, third, fourth)
            }
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Digit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One(first) => f.debug_tuple("One").field(first).finish(),
            Self::Two(first, second) => f.debug_tuple("Two").field(first).field(second).finish(),
            Self::Three(first, second, third) => f
                .debug_tuple("Three")
                .field(first)
                .field(second)
                .field(third)
                .finish(),
            Self::Four(first, second, third, fourth) => f
                .debug_tuple("Four")
                .field(first)
                .field(second)
                .field(third)
                .field(fourth)
                .finish(),
        }
    }
}
