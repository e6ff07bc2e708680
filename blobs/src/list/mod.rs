//! Pooled doubly-linked list of blob builders.
//!
//! During a labeling pass every blob-in-construction is a [`Brototype`] held
//! by a node of a [`DLList`]. Nodes live in an arena owned by the list and are
//! addressed by [`NodeId`] handles, so linking and unlinking are O(1) index
//! updates.
//!
//! The list recycles two kinds of allocations independently:
//! - node shells, returned to the shell free-list by [`DLList::clear`]
//! - builders, returned to the builder free-list whenever a node is
//!   invalidated (their run vectors keep their capacity)
//!
//! Whole lists are recycled across passes through [`ListPool`].
//!
//! A `DLList` has no internal locking. It is mutated through `&mut self`, so
//! one pass owns it at a time; only [`ListPool`] is shared between threads.

mod node;
mod pool;

use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;

use crate::brototype::Brototype;

pub use node::{Node, NodeId, NodeState};
pub use pool::{ListPool, PooledList};

static NEXT_LIST_ID: AtomicU32 = AtomicU32::new(0);

/// Broken link structure found by [`DLList::check_links`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("begin and end disagree about emptiness")]
    EndpointMismatch,

    #[error("slot {index} is in the chain but not linked")]
    DetachedInChain { index: u32 },

    #[error("slot {index} has a prev link that does not point back to its predecessor")]
    BrokenPrev { index: u32 },

    #[error("slot {index} has a next link that does not point back to its successor")]
    BrokenNext { index: u32 },

    #[error("walk from {from} stopped at slot {stopped_at:?} instead of the other end")]
    WrongEnd {
        from: &'static str,
        stopped_at: Option<u32>,
    },

    #[error("walked {walked} nodes but the list counts {expected}")]
    CountMismatch { expected: usize, walked: usize },

    #[error("chain does not terminate")]
    Cycle,
}

/// Default for full link walks after every mutation: on in unit tests and
/// with the `validate` feature. Each walk is O(len), so a labeling pass with
/// it enabled is quadratic in the number of blobs.
const VALIDATE_LINKS: bool = cfg!(any(test, feature = "validate"));

/// Intrusive doubly-linked list of builder nodes with shell and builder
/// free-lists.
#[derive(Debug)]
pub struct DLList {
    id: u32,
    slots: Vec<Node>,
    /// Slots handed out since the last clear. They stay reserved (linked or
    /// detached) until the pass ends.
    owned: Vec<u32>,
    free_nodes: Vec<u32>,
    free_brotos: Vec<Brototype>,
    begin: Option<u32>,
    end: Option<u32>,
    len: usize,
    validate_links: bool,
}

impl Default for DLList {
    fn default() -> Self {
        Self::new()
    }
}

impl DLList {
    pub fn new() -> Self {
        Self {
            id: NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            owned: Vec::new(),
            free_nodes: Vec::new(),
            free_brotos: Vec::new(),
            begin: None,
            end: None,
            len: 0,
            validate_links: VALIDATE_LINKS,
        }
    }

    /// Turns the full link walk after every mutation on or off.
    pub fn set_link_validation(&mut self, enabled: bool) {
        self.validate_links = enabled;
    }

    #[inline]
    pub fn link_validation(&self) -> bool {
        self.validate_links
    }

    /// Number of linked nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn begin(&self) -> Option<NodeId> {
        self.begin.map(|index| self.handle(index))
    }

    #[inline]
    pub fn end(&self) -> Option<NodeId> {
        self.end.map(|index| self.handle(index))
    }

    /// Node shells waiting for reuse.
    #[inline]
    pub fn cached_nodes(&self) -> usize {
        self.free_nodes.len()
    }

    /// Builders waiting for reuse.
    #[inline]
    pub fn cached_builders(&self) -> usize {
        self.free_brotos.len()
    }

    /// Slots reserved by the current pass, linked or not.
    #[inline]
    pub fn owned_nodes(&self) -> usize {
        self.owned.len()
    }

    /// Total slots ever allocated by this list.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn handle(&self, index: u32) -> NodeId {
        NodeId {
            list: self.id,
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Resolves a handle, panicking on foreign or stale handles.
    #[inline]
    fn slot_index(&self, id: NodeId) -> usize {
        assert_eq!(
            id.list, self.id,
            "{:?} belongs to another list (this is list {})",
            id, self.id
        );
        let index = id.index as usize;
        let generation = self.slots.get(index).map(|slot| slot.generation);
        assert_eq!(
            generation,
            Some(id.generation),
            "{:?} is stale: its slot was recycled",
            id
        );
        index
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.slots[self.slot_index(id)]
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        let prev = self.node(id).prev;
        prev.map(|index| self.handle(index))
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let next = self.node(id).next;
        next.map(|index| self.handle(index))
    }

    pub fn is_linked(&self, id: NodeId) -> bool {
        self.node(id).is_linked()
    }

    /// Builder of a linked node.
    pub fn builder(&self, id: NodeId) -> &Brototype {
        let node = self.node(id);
        match &node.obj {
            Some(obj) if node.is_linked() => obj,
            _ => panic!("{:?} is not linked and has no builder", id),
        }
    }

    /// Mutable builder of a linked node.
    pub fn builder_mut(&mut self, id: NodeId) -> &mut Brototype {
        let index = self.slot_index(id);
        let node = &mut self.slots[index];
        match &mut node.obj {
            Some(obj) if node.state == NodeState::Linked => obj,
            _ => panic!("{:?} is not linked and has no builder", id),
        }
    }

    /// Pops a recycled builder, or creates a new one.
    pub fn take_builder(&mut self) -> Brototype {
        self.free_brotos.pop().unwrap_or_default()
    }

    fn recycle_builder(&mut self, mut obj: Brototype) {
        obj.clear();
        self.free_brotos.push(obj);
    }

    /// Installs `obj` into a node shell (recycled if possible), links it at
    /// the tail and reserves it for the current pass.
    pub fn insert(&mut self, obj: Brototype) -> NodeId {
        let index = match self.free_nodes.pop() {
            Some(index) => {
                debug_assert!(self.slots[index as usize].is_unlinked());
                index
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| panic!("DLList slot count exceeds u32"));
                self.slots.push(Node::new());
                index
            }
        };

        self.slots[index as usize].obj = Some(obj);
        self.owned.push(index);
        self.link_back(index);
        self.validate();
        self.handle(index)
    }

    /// Links a detached node of this list back in at the tail.
    ///
    /// A node without a builder gets a recycled, empty one.
    ///
    /// # Panics
    ///
    /// If the node is already linked.
    pub fn insert_node(&mut self, id: NodeId) -> NodeId {
        let index = self.slot_index(id);
        assert!(
            !self.slots[index].is_linked(),
            "{:?} is already linked; a node can only be inserted once",
            id
        );
        if self.slots[index].obj.is_none() {
            let obj = self.take_builder();
            self.slots[index].obj = Some(obj);
        }
        self.link_back(index as u32);
        self.validate();
        id
    }

    fn link_back(&mut self, index: u32) {
        debug_assert!(self.slots[index as usize].is_unlinked());
        match self.end {
            Some(end) => {
                debug_assert!(self.slots[end as usize].next.is_none());
                debug_assert_ne!(end, index);
                self.slots[end as usize].next = Some(index);
                self.slots[index as usize].prev = Some(end);
            }
            None => {
                debug_assert!(self.begin.is_none());
                self.begin = Some(index);
            }
        }
        self.end = Some(index);
        self.slots[index as usize].state = NodeState::Linked;
        self.len += 1;
    }

    /// Unlinks a node, closing the gap between its neighbours, and hands its
    /// builder to the builder cache. The shell stays reserved until
    /// [`DLList::clear`].
    ///
    /// # Panics
    ///
    /// If the node is not linked (for example a second invalidation).
    pub fn invalidate(&mut self, id: NodeId) {
        let index = self.slot_index(id);
        assert!(
            self.slots[index].is_linked(),
            "{:?} is not linked; double invalidate",
            id
        );
        self.unlink(index as u32);
        self.validate();
    }

    fn unlink(&mut self, index: u32) {
        let node = &mut self.slots[index as usize];
        let obj = node.obj.take();
        let prev = node.prev.take();
        let next = node.next.take();
        node.state = NodeState::Detached;

        if let Some(obj) = obj {
            self.recycle_builder(obj);
        }

        match next {
            Some(next) => self.slots[next as usize].prev = prev,
            None => {
                debug_assert_eq!(self.end, Some(index));
                self.end = prev;
            }
        }
        match prev {
            Some(prev) => self.slots[prev as usize].next = next,
            None => {
                debug_assert_eq!(self.begin, Some(index));
                self.begin = next;
            }
        }
        self.len -= 1;
    }

    /// Moves all runs of `from` into `into` and invalidates `from`.
    ///
    /// Both nodes must be linked and distinct.
    pub fn absorb(&mut self, into: NodeId, from: NodeId) {
        let into_index = self.slot_index(into);
        let from_index = self.slot_index(from);
        assert_ne!(into_index, from_index, "cannot absorb {:?} into itself", into);
        assert!(
            self.slots[into_index].is_linked() && self.slots[from_index].is_linked(),
            "absorb needs two linked nodes, got {:?} and {:?}",
            into,
            from
        );

        let mut source = self.slots[from_index].obj.take().unwrap_or_default();
        if let Some(target) = self.slots[into_index].obj.as_mut() {
            target.merge_with(&mut source);
        }
        self.slots[from_index].obj = Some(source);
        self.unlink(from_index as u32);
        self.validate();
    }

    /// Invalidates every linked node and returns all shells reserved by this
    /// pass to the shell cache. Handles from before the call become stale.
    pub fn clear(&mut self) {
        let mut cursor = self.begin;
        while let Some(index) = cursor {
            cursor = self.slots[index as usize].next;
            self.unlink(index);
        }
        debug_assert!(self.begin.is_none() && self.end.is_none());
        debug_assert_eq!(self.len, 0);

        for index in self.owned.drain(..) {
            let slot = &mut self.slots[index as usize];
            debug_assert!(!slot.is_linked() && slot.is_unlinked());
            slot.generation = slot.generation.wrapping_add(1);
            self.free_nodes.push(index);
        }
        self.validate();
    }

    /// Iterates linked nodes from begin to end.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.begin,
        }
    }

    /// Walks the chain in both directions and checks every link.
    pub fn check_links(&self) -> Result<(), ListError> {
        match (self.begin, self.end) {
            (None, None) => {
                if self.len != 0 {
                    return Err(ListError::CountMismatch {
                        expected: self.len,
                        walked: 0,
                    });
                }
                return Ok(());
            }
            (Some(_), Some(_)) => {}
            _ => return Err(ListError::EndpointMismatch),
        }

        if let Some(begin) = self.begin {
            if self.slots[begin as usize].prev.is_some() {
                return Err(ListError::BrokenPrev { index: begin });
            }
        }

        let forward = self.walk(self.begin, |node| node.next, "begin")?;
        if forward != self.len {
            return Err(ListError::CountMismatch {
                expected: self.len,
                walked: forward,
            });
        }
        let backward = self.walk(self.end, |node| node.prev, "end")?;
        if backward != self.len {
            return Err(ListError::CountMismatch {
                expected: self.len,
                walked: backward,
            });
        }
        Ok(())
    }

    fn walk(
        &self,
        start: Option<u32>,
        step: impl Fn(&Node) -> Option<u32>,
        from: &'static str,
    ) -> Result<usize, ListError> {
        let target = if from == "begin" { self.end } else { self.begin };
        let mut count = 0;
        let mut cursor = start;
        let mut last = None;

        while let Some(index) = cursor {
            count += 1;
            if count > self.slots.len() {
                return Err(ListError::Cycle);
            }
            let node = &self.slots[index as usize];
            if !node.is_linked() {
                return Err(ListError::DetachedInChain { index });
            }
            let next = step(node);
            if let Some(next_index) = next {
                let back = if from == "begin" {
                    self.slots[next_index as usize].prev
                } else {
                    self.slots[next_index as usize].next
                };
                if back != Some(index) {
                    return Err(if from == "begin" {
                        ListError::BrokenPrev { index: next_index }
                    } else {
                        ListError::BrokenNext { index: next_index }
                    });
                }
            }
            last = Some(index);
            cursor = next;
        }

        if last != target {
            return Err(ListError::WrongEnd {
                from,
                stopped_at: last,
            });
        }
        Ok(count)
    }

    #[inline]
    fn validate(&self) {
        if self.validate_links {
            if let Err(e) = self.check_links() {
                panic!("DLList {} link invariant violated: {}", self.id, e);
            }
        }
    }
}

/// Iterator over linked nodes, begin to end.
pub struct Iter<'a> {
    list: &'a DLList,
    cursor: Option<u32>,
}

impl Iterator for Iter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let index = self.cursor?;
        self.cursor = self.list.slots[index as usize].next;
        Some(self.list.handle(index))
    }
}

impl<'a> IntoIterator for &'a DLList {
    type Item = NodeId;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
