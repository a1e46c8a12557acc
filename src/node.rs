use byteorder::{ByteOrder, LittleEndian};

use crate::pager::{Page, PAGE_SIZE};
use crate::row::ROW_SIZE;

// Common node header layout.
const NODE_TYPE_SIZE: usize = 1;
const NODE_TYPE_OFFSET: usize = 0;
const IS_ROOT_SIZE: usize = 1;
const IS_ROOT_OFFSET: usize = NODE_TYPE_SIZE;
const PARENT_POINTER_SIZE: usize = 4;
const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
pub const COMMON_NODE_HEADER_SIZE: usize =
    NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

// Leaf node header layout.
const LEAF_NODE_NUM_CELLS_SIZE: usize = 4;
const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const LEAF_NODE_NEXT_LEAF_SIZE: usize = 4;
const LEAF_NODE_NEXT_LEAF_OFFSET: usize = LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE + LEAF_NODE_NEXT_LEAF_SIZE;

// Leaf node body layout.
const LEAF_NODE_KEY_SIZE: usize = 4;
const LEAF_NODE_KEY_OFFSET: usize = 0;
const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
const LEAF_NODE_VALUE_OFFSET: usize = LEAF_NODE_KEY_OFFSET + LEAF_NODE_KEY_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) / 2;
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) - LEAF_NODE_RIGHT_SPLIT_COUNT;

// Internal node header layout.
const INTERNAL_NODE_NUM_KEYS_SIZE: usize = 4;
const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = 4;
const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + INTERNAL_NODE_NUM_KEYS_SIZE + INTERNAL_NODE_RIGHT_CHILD_SIZE;

// Internal node body layout.
const INTERNAL_NODE_CHILD_SIZE: usize = 4;
const INTERNAL_NODE_KEY_SIZE: usize = 4;
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;
pub const INTERNAL_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - INTERNAL_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_MAX_CELLS: usize = INTERNAL_NODE_SPACE_FOR_CELLS / INTERNAL_NODE_CELL_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal,
    Leaf,
}

pub fn node_type(node: &Page) -> NodeType {
    match node[NODE_TYPE_OFFSET] {
        0 => NodeType::Internal,
        1 => NodeType::Leaf,
        other => panic!("invalid node type byte {}", other),
    }
}

pub fn set_node_type(node: &mut Page, t: NodeType) {
    node[NODE_TYPE_OFFSET] = match t {
        NodeType::Internal => 0,
        NodeType::Leaf => 1,
    };
}

pub fn is_root(node: &Page) -> bool {
    node[IS_ROOT_OFFSET] != 0
}

pub fn set_is_root(node: &mut Page, value: bool) {
    node[IS_ROOT_OFFSET] = value as u8;
}

pub fn parent(node: &Page) -> u32 {
    LittleEndian::read_u32(&node[PARENT_POINTER_OFFSET..PARENT_POINTER_OFFSET + PARENT_POINTER_SIZE])
}

pub fn set_parent(node: &mut Page, page_num: u32) {
    LittleEndian::write_u32(
        &mut node[PARENT_POINTER_OFFSET..PARENT_POINTER_OFFSET + PARENT_POINTER_SIZE],
        page_num,
    );
}

pub fn init_leaf(node: &mut Page) {
    set_node_type(node, NodeType::Leaf);
    set_is_root(node, false);
    set_leaf_num_cells(node, 0);
    set_leaf_next_leaf(node, 0);
}

pub fn init_internal(node: &mut Page) {
    set_node_type(node, NodeType::Internal);
    set_is_root(node, false);
    set_internal_num_keys(node, 0);
}

/// The largest key reachable in the subtree rooted at `node`. For an
/// internal node this is the last stored key, not a recursive descent —
/// valid only because I3 bounds every key under `right_child` above all
/// others.
pub fn max_key(node: &Page) -> u32 {
    match node_type(node) {
        NodeType::Leaf => leaf_key(node, leaf_num_cells(node) as usize - 1),
        NodeType::Internal => internal_key(node, internal_num_keys(node) as usize - 1),
    }
}

// --- Leaf accessors ---

pub fn leaf_num_cells(node: &Page) -> u32 {
    LittleEndian::read_u32(
        &node[LEAF_NODE_NUM_CELLS_OFFSET..LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE],
    )
}

pub fn set_leaf_num_cells(node: &mut Page, num_cells: u32) {
    LittleEndian::write_u32(
        &mut node[LEAF_NODE_NUM_CELLS_OFFSET..LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE],
        num_cells,
    );
}

pub fn leaf_next_leaf(node: &Page) -> u32 {
    LittleEndian::read_u32(
        &node[LEAF_NODE_NEXT_LEAF_OFFSET..LEAF_NODE_NEXT_LEAF_OFFSET + LEAF_NODE_NEXT_LEAF_SIZE],
    )
}

pub fn set_leaf_next_leaf(node: &mut Page, next_leaf: u32) {
    LittleEndian::write_u32(
        &mut node[LEAF_NODE_NEXT_LEAF_OFFSET..LEAF_NODE_NEXT_LEAF_OFFSET + LEAF_NODE_NEXT_LEAF_SIZE],
        next_leaf,
    );
}

fn leaf_cell_offset(cell_num: usize) -> usize {
    LEAF_NODE_HEADER_SIZE + cell_num * LEAF_NODE_CELL_SIZE
}

pub fn leaf_key(node: &Page, cell_num: usize) -> u32 {
    let offset = leaf_cell_offset(cell_num) + LEAF_NODE_KEY_OFFSET;
    LittleEndian::read_u32(&node[offset..offset + LEAF_NODE_KEY_SIZE])
}

pub fn set_leaf_key(node: &mut Page, cell_num: usize, key: u32) {
    let offset = leaf_cell_offset(cell_num) + LEAF_NODE_KEY_OFFSET;
    LittleEndian::write_u32(&mut node[offset..offset + LEAF_NODE_KEY_SIZE], key);
}

pub fn leaf_value(node: &Page, cell_num: usize) -> &[u8] {
    let offset = leaf_cell_offset(cell_num) + LEAF_NODE_VALUE_OFFSET;
    &node[offset..offset + LEAF_NODE_VALUE_SIZE]
}

pub fn leaf_value_mut(node: &mut Page, cell_num: usize) -> &mut [u8] {
    let offset = leaf_cell_offset(cell_num) + LEAF_NODE_VALUE_OFFSET;
    &mut node[offset..offset + LEAF_NODE_VALUE_SIZE]
}

/// Copy one whole (key, value) cell within or across leaf pages.
pub fn copy_leaf_cell(from: &Page, from_cell: usize, to: &mut Page, to_cell: usize) {
    let from_offset = leaf_cell_offset(from_cell);
    let to_offset = leaf_cell_offset(to_cell);
    to[to_offset..to_offset + LEAF_NODE_CELL_SIZE]
        .copy_from_slice(&from[from_offset..from_offset + LEAF_NODE_CELL_SIZE]);
}

/// Shift leaf cells `[from, num_cells)` right by one slot to open room
/// for an insertion at `from`.
pub fn shift_leaf_cells_right(node: &mut Page, from: usize, num_cells: usize) {
    for i in (from..num_cells).rev() {
        let from_offset = leaf_cell_offset(i);
        let to_offset = leaf_cell_offset(i + 1);
        let (head, tail) = node.split_at_mut(to_offset);
        tail[..LEAF_NODE_CELL_SIZE].copy_from_slice(&head[from_offset..from_offset + LEAF_NODE_CELL_SIZE]);
    }
}

/// Shift internal cells `[from, num_keys)` right by one slot to open room
/// for an insertion at `from`. Does not touch `right_child`.
pub fn shift_internal_cells_right(node: &mut Page, from: usize, num_keys: usize) {
    for i in (from..num_keys).rev() {
        let from_offset = internal_cell_offset(i);
        let to_offset = internal_cell_offset(i + 1);
        let (head, tail) = node.split_at_mut(to_offset);
        tail[..INTERNAL_NODE_CELL_SIZE]
            .copy_from_slice(&head[from_offset..from_offset + INTERNAL_NODE_CELL_SIZE]);
    }
}

// --- Internal accessors ---

pub fn internal_num_keys(node: &Page) -> u32 {
    LittleEndian::read_u32(
        &node[INTERNAL_NODE_NUM_KEYS_OFFSET..INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE],
    )
}

pub fn set_internal_num_keys(node: &mut Page, num_keys: u32) {
    LittleEndian::write_u32(
        &mut node[INTERNAL_NODE_NUM_KEYS_OFFSET..INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE],
        num_keys,
    );
}

pub fn internal_right_child(node: &Page) -> u32 {
    LittleEndian::read_u32(
        &node[INTERNAL_NODE_RIGHT_CHILD_OFFSET..INTERNAL_NODE_RIGHT_CHILD_OFFSET + INTERNAL_NODE_RIGHT_CHILD_SIZE],
    )
}

pub fn set_internal_right_child(node: &mut Page, page_num: u32) {
    LittleEndian::write_u32(
        &mut node[INTERNAL_NODE_RIGHT_CHILD_OFFSET..INTERNAL_NODE_RIGHT_CHILD_OFFSET + INTERNAL_NODE_RIGHT_CHILD_SIZE],
        page_num,
    );
}

fn internal_cell_offset(cell_num: usize) -> usize {
    INTERNAL_NODE_HEADER_SIZE + cell_num * INTERNAL_NODE_CELL_SIZE
}

pub fn internal_child_ptr(node: &Page, cell_num: usize) -> u32 {
    let offset = internal_cell_offset(cell_num);
    LittleEndian::read_u32(&node[offset..offset + INTERNAL_NODE_CHILD_SIZE])
}

pub fn set_internal_child_ptr(node: &mut Page, cell_num: usize, child: u32) {
    let offset = internal_cell_offset(cell_num);
    LittleEndian::write_u32(&mut node[offset..offset + INTERNAL_NODE_CHILD_SIZE], child);
}

pub fn internal_key(node: &Page, cell_num: usize) -> u32 {
    let offset = internal_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE;
    LittleEndian::read_u32(&node[offset..offset + INTERNAL_NODE_KEY_SIZE])
}

pub fn set_internal_key(node: &mut Page, cell_num: usize, key: u32) {
    let offset = internal_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE;
    LittleEndian::write_u32(&mut node[offset..offset + INTERNAL_NODE_KEY_SIZE], key);
}

/// `child(i)` for `0 <= i <= num_keys`, returning `right_child` at `i ==
/// num_keys` per the layout in spec.md §3.
pub fn internal_child(node: &Page, child_num: usize) -> u32 {
    let num_keys = internal_num_keys(node) as usize;
    if child_num > num_keys {
        panic!("internal_child: {} > num_keys {}", child_num, num_keys);
    } else if child_num == num_keys {
        internal_right_child(node)
    } else {
        internal_child_ptr(node, child_num)
    }
}

pub fn set_internal_child(node: &mut Page, child_num: usize, page_num: u32) {
    let num_keys = internal_num_keys(node) as usize;
    if child_num > num_keys {
        panic!("set_internal_child: {} > num_keys {}", child_num, num_keys);
    } else if child_num == num_keys {
        set_internal_right_child(node, page_num);
    } else {
        set_internal_child_ptr(node, child_num, page_num);
    }
}

/// Copy one whole (child, key) cell within or across internal pages.
pub fn copy_internal_cell(from: &Page, from_cell: usize, to: &mut Page, to_cell: usize) {
    let from_offset = internal_cell_offset(from_cell);
    let to_offset = internal_cell_offset(to_cell);
    to[to_offset..to_offset + INTERNAL_NODE_CELL_SIZE]
        .copy_from_slice(&from[from_offset..from_offset + INTERNAL_NODE_CELL_SIZE]);
}

/// Binary search for the smallest index `i` in `[0, num_keys)` such that
/// `key(i) >= key`. That index is both the insertion point among keys and
/// the child to descend into when searching.
pub fn internal_find_child_index(node: &Page, key: u32) -> usize {
    let mut lo = 0usize;
    let mut hi = internal_num_keys(node) as usize;
    while lo < hi {
        let mid = (lo + hi) / 2;
        if internal_key(node, mid) >= key {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_page() -> Page {
        vec![0u8; PAGE_SIZE]
    }

    #[test]
    fn leaf_round_trips_key_and_num_cells() {
        let mut node = blank_page();
        init_leaf(&mut node);
        set_leaf_num_cells(&mut node, 3);
        set_leaf_key(&mut node, 0, 42);
        assert_eq!(leaf_num_cells(&node), 3);
        assert_eq!(leaf_key(&node, 0), 42);
        assert_eq!(node_type(&node), NodeType::Leaf);
    }

    #[test]
    fn internal_child_falls_back_to_right_child() {
        let mut node = blank_page();
        init_internal(&mut node);
        set_internal_num_keys(&mut node, 2);
        set_internal_child(&mut node, 0, 10);
        set_internal_key(&mut node, 0, 5);
        set_internal_child(&mut node, 1, 11);
        set_internal_key(&mut node, 1, 9);
        set_internal_child(&mut node, 2, 12);
        assert_eq!(internal_child(&node, 0), 10);
        assert_eq!(internal_child(&node, 1), 11);
        assert_eq!(internal_child(&node, 2), 12);
        assert_eq!(internal_right_child(&node), 12);
    }

    #[test]
    fn find_child_index_picks_smallest_bound() {
        let mut node = blank_page();
        init_internal(&mut node);
        set_internal_num_keys(&mut node, 3);
        set_internal_key(&mut node, 0, 5);
        set_internal_key(&mut node, 1, 10);
        set_internal_key(&mut node, 2, 15);
        assert_eq!(internal_find_child_index(&node, 1), 0);
        assert_eq!(internal_find_child_index(&node, 6), 1);
        assert_eq!(internal_find_child_index(&node, 20), 3);
    }
}
