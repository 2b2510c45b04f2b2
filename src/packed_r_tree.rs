//! Size of the packed Hilbert R-tree stored between header and features.
//!
//! The tree is never searched here; its size is only needed to skip it.

use std::cmp::max;
use std::mem::size_of;

/// Serialized size of one tree node: bounding box plus byte offset.
pub const NODE_ITEM_SIZE: usize = 4 * size_of::<f64>() + size_of::<u64>();

pub struct PackedRTree;

impl PackedRTree {
    pub const DEFAULT_NODE_SIZE: u16 = 16;

    /// Bytes occupied by an index over `num_items` features, or `None` on overflow.
    pub fn index_size(num_items: usize, node_size: u16) -> Option<usize> {
        if num_items == 0 {
            return Some(0);
        }
        let node_size = max(node_size, 2) as usize;
        let mut n = num_items;
        let mut num_nodes = n;
        loop {
            n = n.div_ceil(node_size);
            num_nodes = num_nodes.checked_add(n)?;
            if n == 1 {
                break;
            }
        }
        num_nodes.checked_mul(NODE_ITEM_SIZE)
    }
}
