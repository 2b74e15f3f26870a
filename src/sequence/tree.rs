//! The finger tree spine and its operation kernel.
//!
//! A tree is empty, a single node, or a deep tree with a digit on each
//! end and a nested middle tree whose nodes are one level deeper. All
//! logarithmic operations (concatenation, splitting, arbitrary insert
//! and erase, prefix/suffix extraction) live here.

use super::ReferenceCounter;
use super::bounds::in_prefix;
use super::digit::{Digit, DigitErase, Side};
use super::node::{Node, NodeInsert, NodeRef};

pub(super) struct Deep<T> {
    size: usize,
    left: Digit<T>,
    middle: Tree<T>,
    right: Digit<T>,
}

pub(super) enum Tree<T> {
    Empty,
    Single(NodeRef<T>),
    Deep(ReferenceCounter<Deep<T>>),
}

impl<T> Clone for Tree<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Single(node) => Self::Single(node.clone()),
            Self::Deep(deep) => Self::Deep(deep.clone()),
        }
    }
}

impl<T> Deep<T> {
    pub(super) const fn left(&self) -> &Digit<T> {
        &self.left
    }

    pub(super) const fn middle(&self) -> &Tree<T> {
        &self.middle
    }

    pub(super) const fn right(&self) -> &Digit<T> {
        &self.right
    }
}

impl<T> Tree<T> {
    /// Builds a deep tree, computing the cached size from its parts.
    pub(super) fn deep(left: Digit<T>, middle: Self, right: Digit<T>) -> Self {
        debug_assert_eq!(left.depth(), right.depth());
        debug_assert!(middle.is_empty() || middle.depth() == left.depth() + 1);
        let size = left.size() + middle.size() + right.size();
        Self::Deep(ReferenceCounter::new(Deep {
            size,
            left,
            middle,
            right,
        }))
    }

    pub(super) const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub(super) fn size(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(node) => node.size(),
            Self::Deep(deep) => deep.size,
        }
    }

    pub(super) fn depth(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(node) => node.depth(),
            Self::Deep(deep) => deep.left.depth(),
        }
    }

    /// Flattens a digit into a standalone tree of the same depth.
    pub(super) fn from_digit(digit: &Digit<T>) -> Self {
        match digit {
            Digit::One(first) => Self::Single(first.clone()),
            Digit::Two(first, second) => Self::deep(
                Digit::One(first.clone()),
                Self::Empty,
                Digit::One(second.clone()),
            ),
            Digit::Three(first, second, third) => Self::deep(
                Digit::Two(first.clone(), second.clone()),
                Self::Empty,
                Digit::One(third.clone()),
            ),
            Digit::Four(first, second, third, fourth) => Self::deep(
                Digit::Two(first.clone(), second.clone()),
                Self::Empty,
                Digit::Two(third.clone(), fourth.clone()),
            ),
        }
    }

    /// Builds a tree from up to four same-depth nodes, used when a split
    /// leaves a handful of digit members on one side.
    pub(super) fn from_nodes(nodes: &[NodeRef<T>]) -> Self {
        match nodes {
            [] => Self::Empty,
            [first] => Self::Single(first.clone()),
            [first, second] => Self::deep(
                Digit::One(first.clone()),
                Self::Empty,
                Digit::One(second.clone()),
            ),
            [first, second, third] => Self::deep(
                Digit::One(first.clone()),
                Self::Empty,
                Digit::Two(second.clone(), third.clone()),
            ),
            [first, second, third, fourth] => Self::deep(
                Digit::Two(first.clone(), second.clone()),
                Self::Empty,
                Digit::Two(third.clone(), fourth.clone()),
            ),
            _ => unreachable!("at most four loose nodes"),
        }
    }

    pub(super) fn from_merge(merge: NodeInsert<T>) -> Self {
        let (node, extra) = merge;
        match extra {
            None => Self::Single(node),
            Some(extra) => Self::deep(
                Digit::One(node),
                Self::Empty,
                Digit::One(extra),
            ),
        }
    }

    /// Builds a tree holding `count` perfect nodes of the given depth,
    /// consuming `count * 3^depth` values in order.
    pub(super) fn from_values(
        count: usize,
        depth: usize,
        values: &mut impl Iterator<Item = T>,
    ) -> Self {
        if count == 0 {
            return Self::Empty;
        }
        if count == 1 {
            return Self::Single(Node::from_values(depth, values));
        }
        if count <= 8 {
            let nodes: Vec<NodeRef<T>> = (0..count)
                .map(|_| Node::from_values(depth, values))
                .collect();
            let split = count / 2;
            return Self::deep(
                Digit::from_slice(&nodes[..split]),
                Self::Empty,
                Digit::from_slice(&nodes[split..]),
            );
        }
        let left: Vec<NodeRef<T>> = (0..3).map(|_| Node::from_values(depth, values)).collect();
        let middle = Self::from_values((count + 2) / 3 - 2, depth + 1, values);
        let remainder = match count % 3 {
            0 => 3,
            remainder => remainder,
        };
        let right: Vec<NodeRef<T>> = (0..remainder)
            .map(|_| Node::from_values(depth, values))
            .collect();
        Self::deep(
            Digit::from_slice(&left),
            middle,
            Digit::from_slice(&right),
        )
    }

    pub(super) fn front(&self) -> Option<&NodeRef<T>> {
        match self {
            Self::Empty => None,
            Self::Single(node) => Some(node),
            Self::Deep(deep) => Some(deep.left.head()),
        }
    }

    pub(super) fn back(&self) -> Option<&NodeRef<T>> {
        match self {
            Self::Empty => None,
            Self::Single(node) => Some(node),
            Self::Deep(deep) => Some(deep.right.last()),
        }
    }

    /// Pushes a node onto the front. A full left digit spills its last
    /// three members into the middle as a branch.
    pub(super) fn push_front(&self, node: NodeRef<T>) -> Self {
        match self {
            Self::Empty => Self::Single(node),
            Self::Single(existing) => Self::deep(
                Digit::One(node),
                Self::Empty,
                Digit::One(existing.clone()),
            ),
            Self::Deep(deep) => deep.left.push_front(node.clone()).map_or_else(
                || {
                    let Digit::Four(first, second, third, fourth) = &deep.left else {
                        unreachable!("push_front returned None but digit is not Four")
                    };
                    let overflow = Node::branch3(second.clone(), third.clone(), fourth.clone());
                    Self::deep(
                        Digit::Two(node.clone(), first.clone()),
                        deep.middle.push_front(overflow),
                        deep.right.clone(),
                    )
                },
                |left| Self::deep(left, deep.middle.clone(), deep.right.clone()),
            ),
        }
    }

    /// Mirror image of [`Tree::push_front`].
    pub(super) fn push_back(&self, node: NodeRef<T>) -> Self {
        match self {
            Self::Empty => Self::Single(node),
            Self::Single(existing) => Self::deep(
                Digit::One(existing.clone()),
                Self::Empty,
                Digit::One(node),
            ),
            Self::Deep(deep) => deep.right.push_back(node.clone()).map_or_else(
                || {
                    let Digit::Four(first, second, third, fourth) = &deep.right else {
                        unreachable!("push_back returned None but digit is not Four")
                    };
                    let overflow = Node::branch3(first.clone(), second.clone(), third.clone());
                    Self::deep(
                        deep.left.clone(),
                        deep.middle.push_back(overflow),
                        Digit::Two(fourth.clone(), node.clone()),
                    )
                },
                |right| Self::deep(deep.left.clone(), deep.middle.clone(), right),
            ),
        }
    }

    /// Detaches the front node. A one-member left digit is refilled from
    /// the middle via [`Tree::pull_left`].
    pub(super) fn view_front(&self) -> Option<(NodeRef<T>, Self)> {
        match self {
            Self::Empty => None,
            Self::Single(node) => Some((node.clone(), Self::Empty)),
            Self::Deep(deep) => {
                let (rest, head) = deep.left.pop_front();
                let tree = rest.map_or_else(
                    || deep.middle.pull_left(&deep.right),
                    |left| Self::deep(left, deep.middle.clone(), deep.right.clone()),
                );
                Some((head, tree))
            }
        }
    }

    /// Mirror image of [`Tree::view_front`].
    pub(super) fn view_back(&self) -> Option<(Self, NodeRef<T>)> {
        match self {
            Self::Empty => None,
            Self::Single(node) => Some((Self::Empty, node.clone())),
            Self::Deep(deep) => {
                let (rest, last) = deep.right.pop_back();
                let tree = rest.map_or_else(
                    || deep.middle.pull_right(&deep.left),
                    |right| Self::deep(deep.left.clone(), deep.middle.clone(), right),
                );
                Some((tree, last))
            }
        }
    }

    /// Rebuilds a deep tree whose left digit was consumed: a branch is
    /// borrowed from the front of `self` (the middle) and unpacked into
    /// a new left digit, or the remaining digit is flattened when the
    /// middle is empty.
    pub(super) fn pull_left(&self, right: &Digit<T>) -> Self {
        self.view_front().map_or_else(
            || Self::from_digit(right),
            |(node, rest)| Self::deep(Digit::from_node(&node), rest, right.clone()),
        )
    }

    /// Mirror image of [`Tree::pull_left`].
    pub(super) fn pull_right(&self, left: &Digit<T>) -> Self {
        self.view_back().map_or_else(
            || Self::from_digit(left),
            |(rest, node)| Self::deep(left.clone(), rest, Digit::from_node(&node)),
        )
    }

    pub(super) fn get(&self, index: usize) -> Option<&T> {
        if index >= self.size() {
            return None;
        }
        Some(self.lookup(index))
    }

    fn lookup(&self, index: usize) -> &T {
        let mut index = index;
        match self {
            Self::Empty => unreachable!("lookup in empty tree"),
            Self::Single(node) => node.get(index),
            Self::Deep(deep) => {
                if in_prefix(&mut index, deep.left.size()) {
                    deep.left.get(index)
                } else if in_prefix(&mut index, deep.middle.size()) {
                    deep.middle.lookup(index)
                } else {
                    deep.right.get(index)
                }
            }
        }
    }

    /// Concatenates two trees of the same depth. Only the facing digits
    /// are reshaped; both spines are reused, so the cost is logarithmic
    /// in the smaller operand.
    pub(super) fn append(&self, that: &Self) -> Self {
        match (self, that) {
            (Self::Empty, _) => that.clone(),
            (Self::Single(node), _) => that.push_front(node.clone()),
            (_, Self::Empty) => self.clone(),
            (_, Self::Single(node)) => self.push_back(node.clone()),
            (Self::Deep(left), Self::Deep(right)) => {
                let mut buffer = left.right.to_vec();
                buffer.extend(right.left.to_vec());
                let mut rtree = right.middle.clone();
                for branch in Self::regroup(&buffer).iter().rev() {
                    rtree = rtree.push_front(branch.clone());
                }
                Self::deep(
                    left.left.clone(),
                    left.middle.append(&rtree),
                    right.right.clone(),
                )
            }
        }
    }

    /// Regroups 2-8 same-depth nodes into branches one level up,
    /// preserving order.
    fn regroup(nodes: &[NodeRef<T>]) -> Vec<NodeRef<T>> {
        let arities: &[usize] = match nodes.len() {
            2 => &[2],
            3 => &[3],
            4 => &[2, 2],
            5 => &[2, 3],
            6 => &[3, 3],
            7 => &[2, 2, 3],
            8 => &[2, 3, 3],
            _ => unreachable!("append buffer holds 2 to 8 nodes"),
        };
        let mut groups = Vec::with_capacity(arities.len());
        let mut offset = 0;
        for &arity in arities {
            groups.push(if arity == 2 {
                Node::branch2(nodes[offset].clone(), nodes[offset + 1].clone())
            } else {
                Node::branch3(
                    nodes[offset].clone(),
                    nodes[offset + 1].clone(),
                    nodes[offset + 2].clone(),
                )
            });
            offset += arity;
        }
        groups
    }

    pub(super) fn set(&self, index: usize, value: T) -> Self {
        debug_assert!(index < self.size());
        let mut index = index;
        match self {
            Self::Empty => unreachable!("set in empty tree"),
            Self::Single(node) => Self::Single(node.set(index, value)),
            Self::Deep(deep) => {
                if in_prefix(&mut index, deep.left.size()) {
                    Self::deep(
                        deep.left.set(index, value),
                        deep.middle.clone(),
                        deep.right.clone(),
                    )
                } else if in_prefix(&mut index, deep.middle.size()) {
                    Self::deep(
                        deep.left.clone(),
                        deep.middle.set(index, value),
                        deep.right.clone(),
                    )
                } else {
                    Self::deep(
                        deep.left.clone(),
                        deep.middle.clone(),
                        deep.right.set(index, value),
                    )
                }
            }
        }
    }

    /// Inserts `value` before position `index`. Digit overflow spills a
    /// two-node branch into the adjacent side of the middle.
    pub(super) fn insert(&self, index: usize, value: T) -> Self {
        debug_assert!(index < self.size());
        let mut index = index;
        match self {
            Self::Empty => unreachable!("insert position in empty tree"),
            Self::Single(node) => {
                let (inserted, extra) = Node::insert(node, index, value);
                match extra {
                    None => Self::Single(inserted),
                    Some(extra) => Self::deep(
                        Digit::One(inserted),
                        Self::Empty,
                        Digit::One(extra),
                    ),
                }
            }
            Self::Deep(deep) => {
                if in_prefix(&mut index, deep.left.size()) {
                    let (digit, extra) = deep.left.insert(index, value, Side::Left);
                    let middle = extra.map_or_else(
                        || deep.middle.clone(),
                        |overflow| deep.middle.push_front(overflow),
                    );
                    Self::deep(digit, middle, deep.right.clone())
                } else if in_prefix(&mut index, deep.middle.size()) {
                    Self::deep(
                        deep.left.clone(),
                        deep.middle.insert(index, value),
                        deep.right.clone(),
                    )
                } else {
                    let (digit, extra) = deep.right.insert(index, value, Side::Right);
                    let middle = extra.map_or_else(
                        || deep.middle.clone(),
                        |overflow| deep.middle.push_back(overflow),
                    );
                    Self::deep(deep.left.clone(), middle, digit)
                }
            }
        }
    }

    /// Erases the leaf at `index`, under the `(full?, tree)` contract: a
    /// `false` result carries a tree one level shallower (or empty) that
    /// the caller must absorb.
    pub(super) fn erase(&self, index: usize) -> (bool, Self) {
        debug_assert!(index < self.size());
        let mut index = index;
        match self {
            Self::Empty => unreachable!("erase from empty tree"),
            Self::Single(node) => {
                let (full, erased) = node.erase(index);
                match erased {
                    None => (false, Self::Empty),
                    Some(erased) => (full, Self::Single(erased)),
                }
            }
            Self::Deep(deep) => {
                if in_prefix(&mut index, deep.left.size()) {
                    match deep.left.erase(index) {
                        DigitErase::Digit(digit) => (
                            true,
                            Self::deep(digit, deep.middle.clone(), deep.right.clone()),
                        ),
                        DigitErase::Underflow(orphan) => {
                            if let Some((head, rest)) = deep.middle.view_front() {
                                (
                                    true,
                                    Self::deep(
                                        Digit::merge_left(orphan, &head),
                                        rest,
                                        deep.right.clone(),
                                    ),
                                )
                            } else if deep.right.arity() == 1 {
                                let merge = Node::merge_left(orphan, deep.right.head());
                                (true, Self::from_merge(merge))
                            } else {
                                let merge = Node::merge_left(orphan, deep.right.head());
                                let (rest, _) = deep.right.pop_front();
                                let Some(rest) = rest else {
                                    unreachable!("digit of arity above one has a remainder")
                                };
                                (
                                    true,
                                    Self::deep(Digit::from_merge(merge), Self::Empty, rest),
                                )
                            }
                        }
                    }
                } else if in_prefix(&mut index, deep.middle.size()) {
                    let (full, melded) = deep.middle.erase(index);
                    if full {
                        return (
                            true,
                            Self::deep(deep.left.clone(), melded, deep.right.clone()),
                        );
                    }
                    let Self::Single(orphan) = melded else {
                        unreachable!("collapsed middle is a single node")
                    };
                    if let Digit::Four(first, second, third, fourth) = &deep.left {
                        let overflow = Node::branch3(third.clone(), fourth.clone(), orphan);
                        (
                            true,
                            Self::deep(
                                Digit::Two(first.clone(), second.clone()),
                                Self::Single(overflow),
                                deep.right.clone(),
                            ),
                        )
                    } else {
                        let mut nodes = deep.left.to_vec();
                        nodes.push(orphan);
                        (
                            true,
                            Self::deep(
                                Digit::from_slice(&nodes),
                                Self::Empty,
                                deep.right.clone(),
                            ),
                        )
                    }
                } else {
                    match deep.right.erase(index) {
                        DigitErase::Digit(digit) => (
                            true,
                            Self::deep(deep.left.clone(), deep.middle.clone(), digit),
                        ),
                        DigitErase::Underflow(orphan) => {
                            if let Some((rest, last)) = deep.middle.view_back() {
                                (
                                    true,
                                    Self::deep(
                                        deep.left.clone(),
                                        rest,
                                        Digit::merge_right(&last, orphan),
                                    ),
                                )
                            } else if deep.left.arity() == 1 {
                                let merge = Node::merge_right(deep.left.last(), orphan);
                                (true, Self::from_merge(merge))
                            } else {
                                let merge = Node::merge_right(deep.left.last(), orphan);
                                let (rest, _) = deep.left.pop_back();
                                let Some(rest) = rest else {
                                    unreachable!("digit of arity above one has a remainder")
                                };
                                (
                                    true,
                                    Self::deep(rest, Self::Empty, Digit::from_merge(merge)),
                                )
                            }
                        }
                    }
                }
            }
        }
    }

    /// Splits around the leaf at `index`, returning the trees strictly
    /// before and after the covering node. At recursive levels the
    /// returned node is a branch that the caller decomposes further.
    pub(super) fn split(&self, index: usize) -> (Self, NodeRef<T>, Self) {
        debug_assert!(index < self.size());
        let mut index = index;
        match self {
            Self::Empty => unreachable!("split of empty tree"),
            Self::Single(node) => (Self::Empty, node.clone(), Self::Empty),
            Self::Deep(deep) => {
                if in_prefix(&mut index, deep.left.size()) {
                    let items = deep.left.to_vec();
                    let mid = Self::covering(&items, &mut index);
                    let right = if mid + 1 == items.len() {
                        deep.middle.pull_left(&deep.right)
                    } else {
                        Self::deep(
                            Digit::from_slice(&items[mid + 1..]),
                            deep.middle.clone(),
                            deep.right.clone(),
                        )
                    };
                    (Self::from_nodes(&items[..mid]), items[mid].clone(), right)
                } else if in_prefix(&mut index, deep.middle.size()) {
                    let (before, node, after) = deep.middle.split(index);
                    index -= before.size();
                    match node.as_ref() {
                        Node::Leaf(_) => unreachable!("middle holds branches"),
                        Node::Branch2 { first, second, .. } => {
                            if in_prefix(&mut index, first.size()) {
                                (
                                    before.pull_right(&deep.left),
                                    first.clone(),
                                    Self::deep(
                                        Digit::One(second.clone()),
                                        after,
                                        deep.right.clone(),
                                    ),
                                )
                            } else {
                                (
                                    Self::deep(
                                        deep.left.clone(),
                                        before,
                                        Digit::One(first.clone()),
                                    ),
                                    second.clone(),
                                    after.pull_left(&deep.right),
                                )
                            }
                        }
                        Node::Branch3 {
                            first,
                            second,
                            third,
                            ..
                        } => {
                            if in_prefix(&mut index, first.size()) {
                                (
                                    before.pull_right(&deep.left),
                                    first.clone(),
                                    Self::deep(
                                        Digit::Two(second.clone(), third.clone()),
                                        after,
                                        deep.right.clone(),
                                    ),
                                )
                            } else if in_prefix(&mut index, second.size()) {
                                (
                                    Self::deep(
                                        deep.left.clone(),
                                        before,
                                        Digit::One(first.clone()),
                                    ),
                                    second.clone(),
                                    Self::deep(
                                        Digit::One(third.clone()),
                                        after,
                                        deep.right.clone(),
                                    ),
                                )
                            } else {
                                (
                                    Self::deep(
                                        deep.left.clone(),
                                        before,
                                        Digit::Two(first.clone(), second.clone()),
                                    ),
                                    third.clone(),
                                    after.pull_left(&deep.right),
                                )
                            }
                        }
                    }
                } else {
                    let items = deep.right.to_vec();
                    let mid = Self::covering(&items, &mut index);
                    let left = if mid == 0 {
                        deep.middle.pull_right(&deep.left)
                    } else {
                        Self::deep(
                            deep.left.clone(),
                            deep.middle.clone(),
                            Digit::from_slice(&items[..mid]),
                        )
                    };
                    (left, items[mid].clone(), Self::from_nodes(&items[mid + 1..]))
                }
            }
        }
    }

    /// Like [`Tree::split`] but only materializes the prefix: returns
    /// the tree of the first `index` elements and the covering node.
    pub(super) fn take_front(&self, index: usize) -> (Self, NodeRef<T>) {
        debug_assert!(index < self.size());
        let mut index = index;
        match self {
            Self::Empty => unreachable!("take from empty tree"),
            Self::Single(node) => (Self::Empty, node.clone()),
            Self::Deep(deep) => {
                if in_prefix(&mut index, deep.left.size()) {
                    let items = deep.left.to_vec();
                    let mid = Self::covering(&items, &mut index);
                    (Self::from_nodes(&items[..mid]), items[mid].clone())
                } else if in_prefix(&mut index, deep.middle.size()) {
                    let (before, node) = deep.middle.take_front(index);
                    index -= before.size();
                    match node.as_ref() {
                        Node::Leaf(_) => unreachable!("middle holds branches"),
                        Node::Branch2 { first, second, .. } => {
                            if in_prefix(&mut index, first.size()) {
                                (before.pull_right(&deep.left), first.clone())
                            } else {
                                (
                                    Self::deep(
                                        deep.left.clone(),
                                        before,
                                        Digit::One(first.clone()),
                                    ),
                                    second.clone(),
                                )
                            }
                        }
                        Node::Branch3 {
                            first,
                            second,
                            third,
                            ..
                        } => {
                            if in_prefix(&mut index, first.size()) {
                                (before.pull_right(&deep.left), first.clone())
                            } else if in_prefix(&mut index, second.size()) {
                                (
                                    Self::deep(
                                        deep.left.clone(),
                                        before,
                                        Digit::One(first.clone()),
                                    ),
                                    second.clone(),
                                )
                            } else {
                                (
                                    Self::deep(
                                        deep.left.clone(),
                                        before,
                                        Digit::Two(first.clone(), second.clone()),
                                    ),
                                    third.clone(),
                                )
                            }
                        }
                    }
                } else {
                    let items = deep.right.to_vec();
                    let mid = Self::covering(&items, &mut index);
                    if mid == 0 {
                        (deep.middle.pull_right(&deep.left), items[0].clone())
                    } else {
                        (
                            Self::deep(
                                deep.left.clone(),
                                deep.middle.clone(),
                                Digit::from_slice(&items[..mid]),
                            ),
                            items[mid].clone(),
                        )
                    }
                }
            }
        }
    }

    /// Mirror image of [`Tree::take_front`]: `index` counts elements
    /// from the back, and the suffix tree of that many elements is
    /// returned together with the node just before it.
    pub(super) fn take_back(&self, index: usize) -> (NodeRef<T>, Self) {
        debug_assert!(index < self.size());
        let mut index = index;
        match self {
            Self::Empty => unreachable!("take from empty tree"),
            Self::Single(node) => (node.clone(), Self::Empty),
            Self::Deep(deep) => {
                if in_prefix(&mut index, deep.right.size()) {
                    let items = deep.right.to_vec();
                    let mid = Self::covering_back(&items, &mut index);
                    (items[mid].clone(), Self::from_nodes(&items[mid + 1..]))
                } else if in_prefix(&mut index, deep.middle.size()) {
                    let (node, after) = deep.middle.take_back(index);
                    index -= after.size();
                    match node.as_ref() {
                        Node::Leaf(_) => unreachable!("middle holds branches"),
                        Node::Branch2 { first, second, .. } => {
                            if in_prefix(&mut index, second.size()) {
                                (second.clone(), after.pull_left(&deep.right))
                            } else {
                                (
                                    first.clone(),
                                    Self::deep(
                                        Digit::One(second.clone()),
                                        after,
                                        deep.right.clone(),
                                    ),
                                )
                            }
                        }
                        Node::Branch3 {
                            first,
                            second,
                            third,
                            ..
                        } => {
                            if in_prefix(&mut index, third.size()) {
                                (third.clone(), after.pull_left(&deep.right))
                            } else if in_prefix(&mut index, second.size()) {
                                (
                                    second.clone(),
                                    Self::deep(
                                        Digit::One(third.clone()),
                                        after,
                                        deep.right.clone(),
                                    ),
                                )
                            } else {
                                (
                                    first.clone(),
                                    Self::deep(
                                        Digit::Two(second.clone(), third.clone()),
                                        after,
                                        deep.right.clone(),
                                    ),
                                )
                            }
                        }
                    }
                } else {
                    let items = deep.left.to_vec();
                    let mid = Self::covering_back(&items, &mut index);
                    if mid + 1 == items.len() {
                        (items[mid].clone(), deep.middle.pull_left(&deep.right))
                    } else {
                        (
                            items[mid].clone(),
                            Self::deep(
                                Digit::from_slice(&items[mid + 1..]),
                                deep.middle.clone(),
                                deep.right.clone(),
                            ),
                        )
                    }
                }
            }
        }
    }

    fn covering(items: &[NodeRef<T>], index: &mut usize) -> usize {
        for (position, item) in items.iter().enumerate() {
            if in_prefix(index, item.size()) {
                return position;
            }
        }
        unreachable!("index beyond digit size")
    }

    fn covering_back(items: &[NodeRef<T>], index: &mut usize) -> usize {
        for (position, item) in items.iter().enumerate().rev() {
            if in_prefix(index, item.size()) {
                return position;
            }
        }
        unreachable!("index beyond digit size")
    }

    pub(super) fn reverse(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Single(node) => Self::Single(Node::reverse(node)),
            Self::Deep(deep) => Self::deep(
                deep.right.reverse(),
                deep.middle.reverse(),
                deep.left.reverse(),
            ),
        }
    }

    pub(super) fn map<B>(&self, transform: &mut impl FnMut(&T) -> B) -> Tree<B> {
        match self {
            Self::Empty => Tree::Empty,
            Self::Single(node) => Tree::Single(node.map(transform)),
            Self::Deep(deep) => {
                let left = deep.left.map(transform);
                let middle = deep.middle.map(transform);
                let right = deep.right.map(transform);
                Tree::deep(left, middle, right)
            }
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Tree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Single(node) => f.debug_tuple("Single").field(node).finish(),
            Self::Deep(deep) => f
                .debug_struct("Deep")
                .field("size", &deep.size)
                .field("left", &deep.left)
                .field("middle", &deep.middle)
                .field("right", &deep.right)
                .finish(),
        }
    }
}

// Structural validation used by the tests below.
#[cfg(test)]
pub(super) fn check_tree<T>(tree: &Tree<T>) -> (usize, Option<usize>) {
    match tree {
        Tree::Empty => (0, None),
        Tree::Single(node) => {
            let (size, depth) = check_node(node);
            (size, Some(depth))
        }
        Tree::Deep(deep) => {
            let (left_size, left_depth) = check_digit(&deep.left);
            let (right_size, right_depth) = check_digit(&deep.right);
            assert_eq!(left_depth, right_depth, "digit depths disagree");
            let (middle_size, middle_depth) = check_tree(&deep.middle);
            if let Some(middle_depth) = middle_depth {
                assert_eq!(middle_depth, left_depth + 1, "middle depth must be one deeper");
            }
            assert_eq!(
                deep.size,
                left_size + middle_size + right_size,
                "deep size cache is stale"
            );
            (deep.size, Some(left_depth))
        }
    }
}

#[cfg(test)]
fn check_node<T>(node: &NodeRef<T>) -> (usize, usize) {
    match node.as_ref() {
        Node::Leaf(_) => (1, 0),
        Node::Branch2 {
            size,
            first,
            second,
        } => {
            let (first_size, first_depth) = check_node(first);
            let (second_size, second_depth) = check_node(second);
            assert_eq!(first_depth, second_depth, "branch children depths disagree");
            assert_eq!(*size, first_size + second_size, "branch size cache is stale");
            (*size, first_depth + 1)
        }
        Node::Branch3 {
            size,
            first,
            second,
            third,
        } => {
            let (first_size, first_depth) = check_node(first);
            let (second_size, second_depth) = check_node(second);
            let (third_size, third_depth) = check_node(third);
            assert_eq!(first_depth, second_depth, "branch children depths disagree");
            assert_eq!(first_depth, third_depth, "branch children depths disagree");
            assert_eq!(
                *size,
                first_size + second_size + third_size,
                "branch size cache is stale"
            );
            (*size, first_depth + 1)
        }
    }
}

#[cfg(test)]
fn check_digit<T>(digit: &Digit<T>) -> (usize, usize) {
    let members = digit.to_vec();
    assert!((1..=4).contains(&members.len()));
    let mut total = 0;
    let mut depth = None;
    for member in &members {
        let (size, member_depth) = check_node(member);
        total += size;
        match depth {
            None => depth = Some(member_depth),
            Some(depth) => assert_eq!(depth, member_depth, "digit member depths disagree"),
        }
    }
    assert_eq!(total, digit.size(), "digit size disagrees with members");
    (total, depth.unwrap())
}
