use std::fmt;

use crate::brototype::Brototype;

/// Link state of a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// No links and not part of the chain.
    Detached,
    /// Part of its list's chain, with consistent neighbours.
    Linked,
}

/// Handle to a node slot of one [`DLList`](super::DLList).
///
/// Carries the owning list's id and the slot generation, so a handle used
/// with another list, or kept past the [`DLList::clear`](super::DLList::clear)
/// that recycled its slot, is caught instead of aliasing a reused node.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(super) list: u32,
    pub(super) index: u32,
    pub(super) generation: u32,
}

impl NodeId {
    /// Slot index inside the owning list.
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NodeId(list:{} slot:{} gen:{})",
            self.list, self.index, self.generation
        )
    }
}

/// A node slot: links plus the builder it carries while linked.
///
/// A linked node always holds a builder; invalidation hands the builder to
/// the list's builder cache and leaves an empty shell.
#[derive(Debug)]
pub struct Node {
    pub(super) prev: Option<u32>,
    pub(super) next: Option<u32>,
    pub(super) state: NodeState,
    pub(super) generation: u32,
    pub(super) obj: Option<Brototype>,
}

impl Node {
    pub(super) fn new() -> Self {
        Self {
            prev: None,
            next: None,
            state: NodeState::Detached,
            generation: 0,
            obj: None,
        }
    }

    #[inline]
    pub fn state(&self) -> NodeState {
        self.state
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.state == NodeState::Linked
    }

    #[inline]
    pub fn builder(&self) -> Option<&Brototype> {
        self.obj.as_ref()
    }

    /// True if the node has no links at all.
    #[inline]
    pub(super) fn is_unlinked(&self) -> bool {
        self.prev.is_none() && self.next.is_none()
    }
}
