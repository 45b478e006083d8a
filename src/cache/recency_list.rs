#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly-linked list stored in a slab. The front holds the least recently used item, the back
/// the most recently used one.
///
/// Indices returned by [RecencyList::push_back] stay valid until the item is removed. Freed slots
/// are reused by later pushes.
#[derive(Debug)]
pub(crate) struct RecencyList<T> {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
}

impl<T> RecencyList<T> {
    pub(crate) fn new() -> RecencyList<T> {
        RecencyList {
            head: None,
            tail: None,
            len: 0,
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.node(index).map(|node| &node.value)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.node_mut(index).map(|node| &mut node.value)
    }

    /// Adds an item to the back of the list and returns its index.
    pub(crate) fn push_back(&mut self, value: T) -> usize {
        let node = Node {
            value,
            prev: None,
            next: None,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        self.link_back(index);
        self.len += 1;
        index
    }

    /// Pops the least recently used item.
    ///
    /// If the list is empty, [None] is returned.
    pub(crate) fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        self.remove(head)
    }

    /// Removes the item at `index`. Returns [None] if the slot is vacant or out of bounds.
    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        self.unlink(index)?;
        let node = self.nodes.get_mut(index)?.take()?;
        self.free.push(index);
        self.len -= 1;
        Some(node.value)
    }

    /// Marks the item at `index` as most recently used. Returns `false` if the slot is vacant.
    pub(crate) fn move_to_back(&mut self, index: usize) -> bool {
        if self.node(index).is_none() {
            return false;
        }

        if self.tail == Some(index) {
            return true;
        }

        self.unlink(index);
        self.link_back(index);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.nodes.clear();
        self.free.clear();
    }

    fn node(&self, index: usize) -> Option<&Node<T>> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node<T>> {
        self.nodes.get_mut(index).and_then(Option::as_mut)
    }

    // Detaches the node from its neighbours; the slot itself stays occupied.
    fn unlink(&mut self, index: usize) -> Option<()> {
        let node = self.node(index)?;
        let (prev, next) = (node.prev, node.next);

        match prev {
            Some(prev) => self.node_mut(prev)?.next = next,
            None => self.head = next,
        }

        match next {
            Some(next) => self.node_mut(next)?.prev = prev,
            None => self.tail = prev,
        }

        Some(())
    }

    fn link_back(&mut self, index: usize) {
        let old_tail = self.tail.replace(index);

        if let Some(node) = self.node_mut(index) {
            node.prev = old_tail;
            node.next = None;
        }

        match old_tail {
            Some(old_tail) => {
                if let Some(node) = self.node_mut(old_tail) {
                    node.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
    }
}
