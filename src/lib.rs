//! An ordered multiset implemented with an AVL tree.
//!
//! Inserting a key that is already present increments a per-node count
//! instead of adding a second node, so the tree stays as small as the
//! number of distinct keys.
//!
//! ```
//! use avl_multiset::AvlTree;
//! let mut tree = AvlTree::new();
//! tree.insert(2);
//! tree.insert(1);
//! tree.insert(3);
//! tree.insert(3);
//! assert_eq!(tree.len(), 3);
//! assert_eq!(tree.count(&3), 2);
//! assert_eq!(tree.min(), Some(&1));
//! assert_eq!(tree.max(), Some(&3));
//! assert_eq!(tree.level_order(), vec![&2, &1, &3]);
//!
//! tree.remove(&3);
//! assert_eq!(tree.get(&3), Some(&3));
//! tree.remove(&3);
//! assert!(tree.get(&3).is_none());
//! ```
//!
//! The tree is not synchronized. Sharing it between threads requires an
//! external lock held for the whole duration of each operation.
//!
//! Cargo features:
//! - `consistency_check` exposes [`AvlTree::check_consistency`] outside of tests.
//! - `tracing` emits `trace` events for rotations and node removals.

mod tree;
pub use tree::AvlTree;


#[cfg(test)]
mod proptests;
