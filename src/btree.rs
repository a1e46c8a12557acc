use crate::error::DbError;
use crate::node::{
    copy_leaf_cell, init_internal, init_leaf, internal_child, internal_find_child_index,
    internal_key, internal_num_keys, internal_right_child, is_root, leaf_key, leaf_next_leaf,
    leaf_num_cells, leaf_value, leaf_value_mut, max_key, node_type, parent, set_internal_child_ptr,
    set_internal_key, set_internal_num_keys, set_internal_right_child, set_is_root, set_leaf_key,
    set_leaf_next_leaf, set_leaf_num_cells, set_parent, shift_internal_cells_right,
    shift_leaf_cells_right, NodeType, INTERNAL_NODE_MAX_CELLS, LEAF_NODE_LEFT_SPLIT_COUNT,
    LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT,
};
use crate::row::{Row, ROW_SIZE};
use crate::table::Table;

/// A position in the tree: a leaf page plus a cell index, possibly one
/// past the last cell of the rightmost leaf. Held by value and re-derived
/// through the pager on each access, so it stays decoupled from any page
/// buffer's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub page_num: usize,
    pub cell_num: usize,
    pub end_of_table: bool,
}

pub enum InsertOutcome {
    Success,
    DuplicateKey,
    TableFull,
}

/// Descends from the root to the leaf that contains `key`, or the leaf
/// where it should be inserted.
pub fn find(table: &mut Table, key: u32) -> Result<Cursor, DbError> {
    let mut page_num = table.root_page_num;
    loop {
        let node = table.pager.get(page_num)?;
        match node_type(node) {
            NodeType::Leaf => return leaf_find(table, page_num, key),
            NodeType::Internal => {
                let child_index = internal_find_child_index(node, key);
                page_num = internal_child(node, child_index) as usize;
            }
        }
    }
}

fn leaf_find(table: &mut Table, page_num: usize, key: u32) -> Result<Cursor, DbError> {
    let node = table.pager.get(page_num)?;
    let mut lo = 0usize;
    let mut hi = leaf_num_cells(node) as usize;
    while lo < hi {
        let mid = (lo + hi) / 2;
        let key_at_mid = leaf_key(node, mid);
        if key == key_at_mid {
            return Ok(Cursor {
                page_num,
                cell_num: mid,
                end_of_table: false,
            });
        } else if key < key_at_mid {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok(Cursor {
        page_num,
        cell_num: lo,
        end_of_table: false,
    })
}

/// A cursor at the leftmost leaf's first cell, per spec: `find(0)` always
/// lands there because internal search always descends into child 0.
pub fn start(table: &mut Table) -> Result<Cursor, DbError> {
    let mut cursor = find(table, 0)?;
    let node = table.pager.get(cursor.page_num)?;
    cursor.end_of_table = leaf_num_cells(node) == 0;
    Ok(cursor)
}

pub fn advance(table: &mut Table, cursor: &mut Cursor) -> Result<(), DbError> {
    let node = table.pager.get(cursor.page_num)?;
    cursor.cell_num += 1;
    if cursor.cell_num >= leaf_num_cells(node) as usize {
        let next = leaf_next_leaf(node);
        if next == 0 {
            cursor.end_of_table = true;
        } else {
            cursor.page_num = next as usize;
            cursor.cell_num = 0;
        }
    }
    Ok(())
}

pub fn value<'a>(table: &'a mut Table, cursor: &Cursor) -> Result<&'a [u8], DbError> {
    let node = table.pager.get(cursor.page_num)?;
    Ok(leaf_value(node, cursor.cell_num))
}

/// Inserts `row` at `cursor`. The duplicate check is part of insert's
/// contract per spec: a cursor pointing at a cell whose key already
/// equals `key` is rejected without mutation.
pub fn insert(table: &mut Table, cursor: &Cursor, key: u32, row: &Row) -> Result<InsertOutcome, DbError> {
    let node = table.pager.get(cursor.page_num)?;
    let num_cells = leaf_num_cells(node) as usize;
    if cursor.cell_num < num_cells && leaf_key(node, cursor.cell_num) == key {
        return Ok(InsertOutcome::DuplicateKey);
    }

    if num_cells < LEAF_NODE_MAX_CELLS {
        simple_insert(table, cursor, key, row)?;
        return Ok(InsertOutcome::Success);
    }

    // Checked before any page is touched, so a `TableFull` outcome never
    // leaves the leaf half-split with its new sibling unreachable from
    // the parent.
    if leaf_split_would_overflow_parent(table, cursor.page_num)? {
        return Ok(InsertOutcome::TableFull);
    }
    split_and_insert(table, cursor, key, row)?;
    Ok(InsertOutcome::Success)
}

/// True when the leaf at `page_num` is full, non-root, and its parent has
/// no room left for the extra child a split would introduce. `MAX_PAGES`
/// (100) bounds the file to far fewer pages than `INTERNAL_NODE_MAX_CELLS
/// + 1` (511) children, so in practice this never fires — the database
/// always runs out of pages first — but the check keeps the contract
/// honest rather than leaving it as dead ambiguity.
fn leaf_split_would_overflow_parent(table: &mut Table, page_num: usize) -> Result<bool, DbError> {
    let leaf = table.pager.get(page_num)?;
    if is_root(leaf) {
        return Ok(false);
    }
    let parent_page_num = parent(leaf) as usize;
    let parent_node = table.pager.get(parent_page_num)?;
    Ok(internal_num_keys(parent_node) as usize == INTERNAL_NODE_MAX_CELLS)
}

fn simple_insert(table: &mut Table, cursor: &Cursor, key: u32, row: &Row) -> Result<(), DbError> {
    let node = table.pager.get(cursor.page_num)?;
    let num_cells = leaf_num_cells(node) as usize;
    shift_leaf_cells_right(node, cursor.cell_num, num_cells);
    set_leaf_key(node, cursor.cell_num, key);
    row.serialize(leaf_value_mut(node, cursor.cell_num));
    set_leaf_num_cells(node, num_cells as u32 + 1);
    Ok(())
}

/// Splits a full leaf, redistributing the `LEAF_NODE_MAX_CELLS + 1`
/// virtual cells (existing plus the pending insertion) between the old
/// leaf and a newly allocated one, then propagates the split to the
/// parent (or grows the root).
fn split_and_insert(table: &mut Table, cursor: &Cursor, key: u32, row: &Row) -> Result<(), DbError> {
    let old_page_num = cursor.page_num;
    let new_page_num = table.pager.allocate_new_page_number();

    let (old_snapshot, old_parent, old_next_leaf) = {
        let old_node = table.pager.get(old_page_num)?;
        (old_node.clone(), parent(old_node), leaf_next_leaf(old_node))
    };
    let old_max = max_key(&old_snapshot);

    {
        let new_node = table.pager.get(new_page_num as usize)?;
        init_leaf(new_node);
        set_parent(new_node, old_parent);
        set_leaf_next_leaf(new_node, old_next_leaf);
    }
    {
        let old_node = table.pager.get(old_page_num)?;
        set_leaf_next_leaf(old_node, new_page_num);
    }

    let mut row_buf = [0u8; ROW_SIZE];
    row.serialize(&mut row_buf);

    // Walk the virtual cell indices from the tail down so every source
    // cell is read before its slot is overwritten.
    for i in (0..=LEAF_NODE_MAX_CELLS).rev() {
        let dest_page_num = if i >= LEAF_NODE_LEFT_SPLIT_COUNT {
            new_page_num as usize
        } else {
            old_page_num
        };
        let slot = i % LEAF_NODE_LEFT_SPLIT_COUNT;
        let dest = table.pager.get(dest_page_num)?;

        if i == cursor.cell_num {
            set_leaf_key(dest, slot, key);
            leaf_value_mut(dest, slot).copy_from_slice(&row_buf);
        } else if i > cursor.cell_num {
            copy_leaf_cell(&old_snapshot, i - 1, dest, slot);
        } else {
            copy_leaf_cell(&old_snapshot, i, dest, slot);
        }
    }

    set_leaf_num_cells(table.pager.get(old_page_num)?, LEAF_NODE_LEFT_SPLIT_COUNT as u32);
    set_leaf_num_cells(table.pager.get(new_page_num as usize)?, LEAF_NODE_RIGHT_SPLIT_COUNT as u32);

    let old_was_root = is_root(table.pager.get(old_page_num)?);
    if old_was_root {
        create_new_root(table, new_page_num)?;
    } else {
        let parent_page = old_parent as usize;
        let new_max = max_key(table.pager.get(old_page_num)?);
        update_internal_node_key(table, parent_page, old_max, new_max)?;
        internal_node_insert(table, parent_page, new_page_num)?;
    }
    Ok(())
}

/// Grows the tree by one level: the old root's contents move to a new
/// left-child page, and the root page itself (which never changes
/// number, since `Table::root_page_num` isn't re-pointed) is reinitialized
/// as an internal node with one key and two children. Only ever fires
/// once in a table's lifetime — once the root is internal,
/// `leaf_split_would_overflow_parent` turns any further overflow into
/// `TableFull` instead of growing the tree past two levels.
fn create_new_root(table: &mut Table, right_child_page_num: u32) -> Result<(), DbError> {
    let left_child_page_num = table.pager.allocate_new_page_number();

    let root_snapshot = table.pager.get(table.root_page_num)?.clone();
    let left_max_key = max_key(&root_snapshot);

    {
        let left_child = table.pager.get(left_child_page_num as usize)?;
        left_child.copy_from_slice(&root_snapshot);
        set_is_root(left_child, false);
        set_parent(left_child, table.root_page_num as u32);
    }
    {
        let right_child = table.pager.get(right_child_page_num as usize)?;
        set_parent(right_child, table.root_page_num as u32);
    }

    let root = table.pager.get(table.root_page_num)?;
    init_internal(root);
    set_is_root(root, true);
    set_internal_num_keys(root, 1);
    set_internal_child_ptr(root, 0, left_child_page_num);
    set_internal_key(root, 0, left_max_key);
    set_internal_right_child(root, right_child_page_num);
    Ok(())
}

/// Rewrites the parent cell whose key used to equal `old_key` so it reads
/// `new_key` instead — the split may have reduced the old child's max
/// key. A no-op if `old_key` isn't stored explicitly (it lives under
/// `right_child`, bounded only by an ancestor).
fn update_internal_node_key(
    table: &mut Table,
    parent_page_num: usize,
    old_key: u32,
    new_key: u32,
) -> Result<(), DbError> {
    let parent_node = table.pager.get(parent_page_num)?;
    let num_keys = internal_num_keys(parent_node) as usize;
    for i in 0..num_keys {
        if internal_key(parent_node, i) == old_key {
            set_internal_key(parent_node, i, new_key);
            break;
        }
    }
    Ok(())
}

/// Inserts `new_child_page` as a child of `parent_page_num`, keyed by its
/// own max key. The caller (`split_and_insert`, via
/// `leaf_split_would_overflow_parent`) has already checked that `parent`
/// has room, so this never needs to split the parent itself.
fn internal_node_insert(
    table: &mut Table,
    parent_page_num: usize,
    new_child_page: u32,
) -> Result<(), DbError> {
    let new_key = max_key(table.pager.get(new_child_page as usize)?);
    let num_keys = internal_num_keys(table.pager.get(parent_page_num)?) as usize;

    let right_child_page = internal_right_child(table.pager.get(parent_page_num)?);
    let right_child_max = max_key(table.pager.get(right_child_page as usize)?);

    let parent_node = table.pager.get(parent_page_num)?;
    if new_key > right_child_max {
        set_internal_child_ptr(parent_node, num_keys, right_child_page);
        set_internal_key(parent_node, num_keys, right_child_max);
        set_internal_right_child(parent_node, new_child_page);
        set_internal_num_keys(parent_node, num_keys as u32 + 1);
    } else {
        let index = internal_find_child_index(parent_node, new_key);
        shift_internal_cells_right(parent_node, index, num_keys);
        set_internal_child_ptr(parent_node, index, new_child_page);
        set_internal_key(parent_node, index, new_key);
        set_internal_num_keys(parent_node, num_keys as u32 + 1);
    }

    set_parent(table.pager.get(new_child_page as usize)?, parent_page_num as u32);
    Ok(())
}
