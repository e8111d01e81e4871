use std::cmp::{self, Ordering};
use std::collections::VecDeque;
use std::fmt;

/// An ordered multiset implemented with an AVL tree.
///
/// Equal keys share a single node which counts how often the key has been inserted.
/// `len` reports the number of distinct keys.
#[derive(Clone)]
pub struct AvlTree<K> {
    root: Link<K>,
    num_nodes: usize,
}

type Link<K> = Option<Box<Node<K>>>;

#[derive(Clone)]
struct Node<K> {
    key: K,
    count: u32,
    height: i32,
    left: Link<K>,
    right: Link<K>,
}

/// Outcome of removing one occurrence of a key from a subtree.
enum Removal {
    NotFound,
    CountDecremented,
    NodeUnlinked,
}

impl<K: Ord> AvlTree<K> {
    /// Creates an empty tree.
    /// No memory is allocated until the first key is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
        }
    }

    /// Returns true if the tree contains no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of distinct keys in the tree.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the root node.
    /// A single node has height 0, an empty tree has height -1.
    pub fn height(&self) -> i32 {
        Node::height_of(&self.root)
    }

    /// Clears the tree, deallocating all nodes.
    pub fn clear(&mut self) {
        self.root = None;
        self.num_nodes = 0;
    }

    /// Returns a reference to the stored key that is equal to the given key.
    pub fn get(&self, key: &K) -> Option<&K> {
        self.find(key).map(|node| &node.key)
    }

    /// Returns true if the tree holds at least one occurrence of the key.
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Returns how many occurrences of the key are stored, 0 if none.
    pub fn count(&self, key: &K) -> u32 {
        self.find(key).map_or(0, |node| node.count)
    }

    /// Returns the smallest key in the tree.
    pub fn min(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some(&node.key)
    }

    /// Returns the largest key in the tree.
    pub fn max(&self) -> Option<&K> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some(&node.key)
    }

    /// Inserts a key into the tree.
    /// If the key is already present, its count is incremented instead.
    /// Returns whether a new node was created.
    pub fn insert(&mut self, key: K) -> bool {
        let created = Self::insert_into(&mut self.root, key);
        if created {
            self.num_nodes += 1;
        }
        created
    }

    /// Removes one occurrence of a key from the tree.
    /// The node itself is only removed when its last occurrence goes.
    /// Returns whether the key was present.
    pub fn remove(&mut self, key: &K) -> bool {
        match Self::remove_from(&mut self.root, key) {
            Removal::NotFound => false,
            Removal::CountDecremented => true,
            Removal::NodeUnlinked => {
                debug_assert!(self.num_nodes >= 1);
                self.num_nodes -= 1;
                true
            }
        }
    }

    /// Checks the structural invariants of the tree and panics on any violation.
    ///
    /// Heights are recomputed from scratch and compared with the cached ones,
    /// every node must satisfy the AVL condition, keys must be strictly
    /// ascending in order and the number of nodes must match `len`.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        let mut num_nodes = 0;
        let height = Node::check_subtree(&self.root, &mut num_nodes);
        assert_eq!(height, self.height());
        assert_eq!(num_nodes, self.num_nodes);

        let mut previous: Option<&K> = None;
        Node::visit_in_order(&self.root, &mut |node| {
            if let Some(previous) = previous {
                assert!(*previous < node.key);
            }
            previous = Some(&node.key);
        });
    }

    fn find(&self, key: &K) -> Option<&Node<K>> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Equal => break,
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
            }
        }
        current
    }

    fn insert_into(link: &mut Link<K>, key: K) -> bool {
        let created = match link {
            None => {
                *link = Some(Node::create(key));
                return true;
            }
            Some(node) => match key.cmp(&node.key) {
                Ordering::Less => Self::insert_into(&mut node.left, key),
                Ordering::Greater => Self::insert_into(&mut node.right, key),
                Ordering::Equal => {
                    node.count += 1;
                    false
                }
            },
        };
        Node::rebalance(link);
        created
    }

    fn remove_from(link: &mut Link<K>, key: &K) -> Removal {
        let node = match link {
            None => return Removal::NotFound,
            Some(node) => node,
        };
        let removal = match key.cmp(&node.key) {
            Ordering::Less => Self::remove_from(&mut node.left, key),
            Ordering::Greater => Self::remove_from(&mut node.right, key),
            Ordering::Equal => {
                if node.count > 1 {
                    node.count -= 1;
                    return Removal::CountDecremented;
                }
                Node::unlink(link);
                Removal::NodeUnlinked
            }
        };
        // Link may have become empty, rebalance skips it then
        Node::rebalance(link);
        removal
    }
}

impl<K> AvlTree<K> {
    /// Visits all keys in level order together with their counts.
    /// Within a level, keys are visited from left to right.
    pub fn traverse_level_order<F: FnMut(&K, u32)>(&self, mut f: F) {
        self.visit_level_order(|node| f(&node.key, node.count));
    }

    /// Returns all distinct keys in level order.
    pub fn level_order(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.num_nodes);
        self.visit_level_order(|node| keys.push(&node.key));
        keys
    }

    fn visit_level_order<'a, F: FnMut(&'a Node<K>)>(&'a self, mut f: F) {
        let mut queue = VecDeque::new();
        queue.extend(self.root.as_deref());
        while let Some(node) = queue.pop_front() {
            f(node);
            queue.extend(node.left.as_deref());
            queue.extend(node.right.as_deref());
        }
    }
}

impl<K: Ord> Default for AvlTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> Extend<K> for AvlTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for AvlTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: fmt::Debug> fmt::Debug for AvlTree<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries = Vec::with_capacity(self.num_nodes);
        Node::visit_in_order(&self.root, &mut |node| entries.push((&node.key, node.count)));
        f.debug_map().entries(entries).finish()
    }
}

impl<K> Node<K> {
    fn create(key: K) -> Box<Self> {
        Box::new(Node {
            key,
            count: 1,
            height: 0,
            left: None,
            right: None,
        })
    }

    fn height_of(link: &Link<K>) -> i32 {
        link.as_ref().map_or(-1, |node| node.height)
    }

    fn adjust_height(&mut self) {
        self.height = 1 + cmp::max(Self::height_of(&self.left), Self::height_of(&self.right));
    }

    /// Height of the right subtree minus height of the left subtree.
    fn balance_factor(&self) -> i32 {
        Self::height_of(&self.right) - Self::height_of(&self.left)
    }

    fn rebalance(link: &mut Link<K>) {
        *link = link.take().map(Self::rebalance_node);
    }

    /// Adjusts the height of the given subtree root and restores the AVL condition if necessary.
    /// Returns the new subtree root.
    /// The balance factor must not exceed +2 or -2, which holds after a single update below it.
    fn rebalance_node(mut node: Box<Self>) -> Box<Self> {
        node.adjust_height();
        let balance = node.balance_factor();
        debug_assert!((-2..=2).contains(&balance));
        if balance >= 2 {
            node = Self::rotate_left(node);
        } else if balance <= -2 {
            node = Self::rotate_right(node);
        }
        node
    }

    //   n              r
    //  / \            / \
    // a   r    ->    n   c
    //    / \        / \
    //   b   c      a   b
    //
    // A left-heavy right child is rotated right first (right-left case).
    fn rotate_left(mut node: Box<Self>) -> Box<Self> {
        let mut right = node
            .right
            .take()
            .expect("rotate_left requires a right child");
        right.adjust_height();
        if right.balance_factor() == -1 {
            #[cfg(feature = "tracing")]
            tracing::trace!(height = right.height, "double rotation: right-left");
            right = Self::rotate_right(right);
        }

        node.right = right.left.take();
        node.adjust_height();
        right.left = Some(node);
        right.adjust_height();

        #[cfg(feature = "tracing")]
        tracing::trace!(height = right.height, "rotated left");
        right
    }

    //     n          l
    //    / \        / \
    //   l   c  ->  a   n
    //  / \            / \
    // a   b          b   c
    //
    // A right-heavy left child is rotated left first (left-right case).
    fn rotate_right(mut node: Box<Self>) -> Box<Self> {
        let mut left = node
            .left
            .take()
            .expect("rotate_right requires a left child");
        left.adjust_height();
        if left.balance_factor() == 1 {
            #[cfg(feature = "tracing")]
            tracing::trace!(height = left.height, "double rotation: left-right");
            left = Self::rotate_left(left);
        }

        node.left = left.right.take();
        node.adjust_height();
        left.right = Some(node);
        left.adjust_height();

        #[cfg(feature = "tracing")]
        tracing::trace!(height = left.height, "rotated right");
        left
    }

    /// Removes the node at the given link from the tree.
    /// The caller is responsible for rebalancing the link afterwards.
    fn unlink(link: &mut Link<K>) {
        let Some(mut node) = link.take() else {
            return;
        };
        *link = match (node.left.take(), node.right.take()) {
            (None, None) => {
                #[cfg(feature = "tracing")]
                tracing::trace!("unlinked leaf");
                None
            }
            (Some(child), None) | (None, Some(child)) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(height = child.height, "unlinked node, promoted its only child");
                Some(child)
            }
            (Some(left), Some(right)) => {
                // Successor takes over key and count, its own node goes away
                let (rest, successor) = Self::detach_min(right);
                let Node { key, count, .. } = *successor;
                node.key = key;
                node.count = count;
                node.left = Some(left);
                node.right = rest;

                #[cfg(feature = "tracing")]
                tracing::trace!(height = node.height, "unlinked node, replaced by successor");
                Some(node)
            }
        };
    }

    /// Detaches the leftmost node of the given subtree.
    /// Returns the rebalanced remainder of the subtree and the detached node.
    fn detach_min(mut node: Box<Self>) -> (Link<K>, Box<Self>) {
        match node.left.take() {
            None => {
                let rest = node.right.take();
                (rest, node)
            }
            Some(left) => {
                let (rest, min) = Self::detach_min(left);
                node.left = rest;
                (Some(Self::rebalance_node(node)), min)
            }
        }
    }

    fn visit_in_order<'a, F: FnMut(&'a Self)>(link: &'a Link<K>, f: &mut F) {
        if let Some(node) = link {
            Self::visit_in_order(&node.left, f);
            f(node);
            Self::visit_in_order(&node.right, f);
        }
    }

    /// Returns the recomputed height of the subtree and counts its nodes.
    #[cfg(any(test, feature = "consistency_check"))]
    fn check_subtree(link: &Link<K>, num_nodes: &mut usize) -> i32 {
        let Some(node) = link else {
            return -1;
        };
        let left_height = Self::check_subtree(&node.left, num_nodes);
        let right_height = Self::check_subtree(&node.right, num_nodes);

        assert!(node.count >= 1);
        assert_eq!(node.height, 1 + cmp::max(left_height, right_height));

        // Check AVL condition (nearly balance)
        assert!(left_height <= right_height + 1);
        assert!(right_height <= left_height + 1);

        *num_nodes += 1;
        node.height
    }
}
