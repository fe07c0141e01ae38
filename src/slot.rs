use crate::slab::Slab;

/// Intrusive list pointers carried by every node a [`Slot`] can hold.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Links {
    pub next: Option<usize>,
    pub prev: Option<usize>,
}

pub(crate) trait Linked {
    fn links(&self) -> &Links;
    fn links_mut(&mut self) -> &mut Links;
}

/// One bucket of the wheel.
///
/// An unordered doubly-linked list threaded through slab nodes, so a node
/// is linked and unlinked in O(1) given only its key.
#[derive(Debug)]
pub(crate) struct Slot {
    head: Option<usize>,
    len: usize,
}

impl Slot {
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Link `key` at the head of the list.
    ///
    /// The node must be present in `slab` and not linked into any slot.
    pub fn push_front<T: Linked>(&mut self, slab: &mut Slab<T>, key: usize) {
        let old_head = self.head;

        debug_assert!(slab.get(key).is_some(), "push_front on vacant key {key}");
        let Some(node) = slab.get_mut(key) else {
            return;
        };
        *node.links_mut() = Links {
            next: old_head,
            prev: None,
        };

        if let Some(head) = old_head {
            if let Some(head) = slab.get_mut(head) {
                head.links_mut().prev = Some(key);
            }
        }

        self.head = Some(key);
        self.len += 1;
    }

    /// Unlink `key` from the list. The node itself stays in `slab`.
    ///
    /// The node must currently be linked into this slot.
    pub fn unlink<T: Linked>(&mut self, slab: &mut Slab<T>, key: usize) {
        debug_assert!(slab.get(key).is_some(), "unlink on vacant key {key}");
        let Some(node) = slab.get_mut(key) else {
            return;
        };
        let Links { next, prev } = std::mem::take(node.links_mut());

        match prev {
            Some(prev) => {
                if let Some(prev) = slab.get_mut(prev) {
                    prev.links_mut().next = next;
                }
            }
            None => {
                debug_assert_eq!(self.head, Some(key), "unlinked node is not in this slot");
                self.head = next;
            }
        }

        if let Some(next) = next {
            if let Some(next) = slab.get_mut(next) {
                next.links_mut().prev = prev;
            }
        }

        self.len -= 1;
    }

    /// Walk the list from the head, yielding `(key, node)`.
    pub fn iter<'a, T: Linked>(&self, slab: &'a Slab<T>) -> Iter<'a, T> {
        Iter {
            slab,
            cursor: self.head,
        }
    }

    /// Forget every link without touching the nodes.
    ///
    /// Only valid when the nodes are being released along with it.
    pub fn clear(&mut self) {
        self.head = None;
        self.len = 0;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }
}

pub(crate) struct Iter<'a, T> {
    slab: &'a Slab<T>,
    cursor: Option<usize>,
}

impl<'a, T: Linked> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.cursor?;
        let node = self.slab.get(key)?;
        self.cursor = node.links().next;
        Some((key, node))
    }
}
