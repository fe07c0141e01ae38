use std::collections::TryReserveError;

const NONE: usize = usize::MAX;

enum Node<T> {
    Vacant { next: usize },
    Occupied(T),
}

/// Growable arena with an intrusive free list.
///
/// Keys stay stable for as long as the value is present; a vacated key is
/// handed out again by the next insert.
pub(crate) struct Slab<T> {
    nodes: Vec<Node<T>>,
    free_head: usize,
    len: usize,
}

impl<T> Slab<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free_head: NONE,
            len: 0,
        }
    }

    /// Insert a value. Returns the key.
    pub fn insert(&mut self, value: T) -> Result<usize, TryReserveError> {
        let key = if self.free_head != NONE {
            let key = self.free_head;
            let next = match self.nodes[key] {
                Node::Vacant { next } => next,
                Node::Occupied(_) => unreachable!("free list must point at a vacant node"),
            };
            self.free_head = next;
            self.nodes[key] = Node::Occupied(value);
            key
        } else {
            self.nodes.try_reserve(1)?;
            self.nodes.push(Node::Occupied(value));
            self.nodes.len() - 1
        };

        self.len += 1;
        Ok(key)
    }

    /// Remove by key. Returns `None` if the key is vacant or out of range.
    pub fn remove(&mut self, key: usize) -> Option<T> {
        let node = self.nodes.get_mut(key)?;
        if let Node::Vacant { .. } = node {
            return None;
        }

        let old = std::mem::replace(
            node,
            Node::Vacant {
                next: self.free_head,
            },
        );
        self.free_head = key;
        self.len -= 1;

        match old {
            Node::Occupied(value) => Some(value),
            Node::Vacant { .. } => None,
        }
    }

    #[inline]
    pub fn get(&self, key: usize) -> Option<&T> {
        match self.nodes.get(key)? {
            Node::Occupied(value) => Some(value),
            Node::Vacant { .. } => None,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, key: usize) -> Option<&mut T> {
        match self.nodes.get_mut(key)? {
            Node::Occupied(value) => Some(value),
            Node::Vacant { .. } => None,
        }
    }

    /// Drop every value. Allocated storage is kept for reuse.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_head = NONE;
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
