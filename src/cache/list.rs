//! Node Arena Module
//!
//! Doubly linked lists threaded through a shared `Vec` of nodes. Nodes are
//! addressed by stable indices instead of pointers, and several independent
//! lists (one recency list, or one list per frequency bucket) can share one arena.
//! Splicing a node in or out of a list is O(1).

/// Null link.
const NIL: usize = usize::MAX;

/// Upper bound on slots reserved up front; larger caches grow on demand.
pub(crate) const INITIAL_SLOTS: usize = 1024;

#[derive(Debug)]
struct Slot<T> {
    item: Option<T>,
    prev: usize,
    next: usize,
}

// == Links ==
/// Head/tail of one list living inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Links {
    head: usize,
    tail: usize,
    len: usize,
}

impl Default for Links {
    fn default() -> Self {
        Self {
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }
}

impl Links {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn front(&self) -> Option<usize> {
        (self.head != NIL).then_some(self.head)
    }

    pub(crate) fn back(&self) -> Option<usize> {
        (self.tail != NIL).then_some(self.tail)
    }
}

// == Arena ==
/// Growable node store with slot recycling.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    // == Insert ==
    /// Stores `item` in a free slot and returns its index. The node is not linked
    /// into any list yet.
    pub(crate) fn insert(&mut self, item: T) -> usize {
        let slot = Slot {
            item: Some(item),
            prev: NIL,
            next: NIL,
        };
        self.len += 1;
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    // == Remove ==
    /// Frees the slot at `idx` and returns its item. The node must already be
    /// unlinked from its list.
    pub(crate) fn remove(&mut self, idx: usize) -> Option<T> {
        let item = self.slots.get_mut(idx)?.item.take()?;
        self.len -= 1;
        self.free.push(idx);
        Some(item)
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&T> {
        self.slots.get(idx)?.item.as_ref()
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.slots.get_mut(idx)?.item.as_mut()
    }

    // == Linking ==
    /// Links the node at `idx` in front of `list`'s head.
    pub(crate) fn push_front(&mut self, list: &mut Links, idx: usize) {
        let old_head = list.head;
        {
            let slot = &mut self.slots[idx];
            slot.prev = NIL;
            slot.next = old_head;
        }
        if old_head != NIL {
            self.slots[old_head].prev = idx;
        } else {
            list.tail = idx;
        }
        list.head = idx;
        list.len += 1;
    }

    /// Links the node at `idx` after `list`'s tail.
    pub(crate) fn push_back(&mut self, list: &mut Links, idx: usize) {
        let old_tail = list.tail;
        {
            let slot = &mut self.slots[idx];
            slot.prev = old_tail;
            slot.next = NIL;
        }
        if old_tail != NIL {
            self.slots[old_tail].next = idx;
        } else {
            list.head = idx;
        }
        list.tail = idx;
        list.len += 1;
    }

    /// Splices the node at `idx` out of `list`, leaving it allocated.
    pub(crate) fn unlink(&mut self, list: &mut Links, idx: usize) {
        let (prev, next) = {
            let slot = &mut self.slots[idx];
            let links = (slot.prev, slot.next);
            slot.prev = NIL;
            slot.next = NIL;
            links
        };
        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            list.head = next;
        }
        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            list.tail = prev;
        }
        list.len -= 1;
    }

    /// Moves the node at `idx` to the front of `list`.
    pub(crate) fn move_to_front(&mut self, list: &mut Links, idx: usize) {
        if list.head == idx {
            return;
        }
        self.unlink(list, idx);
        self.push_front(list, idx);
    }

    // == Iteration ==
    /// Walks `list` from head to tail.
    pub(crate) fn iter<'a>(&'a self, list: &Links) -> impl Iterator<Item = &'a T> + 'a {
        let mut cursor = list.head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let slot = &self.slots[cursor];
            cursor = slot.next;
            slot.item.as_ref()
        })
    }
}
