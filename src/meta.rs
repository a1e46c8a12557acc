use crate::node::{
    internal_child, internal_num_keys, leaf_num_cells, node_type, NodeType, COMMON_NODE_HEADER_SIZE,
    LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS, LEAF_NODE_SPACE_FOR_CELLS,
};
use crate::row::ROW_SIZE;
use crate::table::Table;

pub enum MetaOutcome {
    Exit,
    Handled,
    Unrecognized,
}

pub fn do_meta_command(input: &str, table: &mut Table) -> MetaOutcome {
    match input {
        ".exit" => MetaOutcome::Exit,
        ".btree" => {
            println!("Tree:");
            print_tree(table, table.root_page_num, 0);
            MetaOutcome::Handled
        }
        ".constants" => {
            print_constants();
            MetaOutcome::Handled
        }
        _ => MetaOutcome::Unrecognized,
    }
}

fn print_constants() {
    println!("ROW_SIZE: {}", ROW_SIZE);
    println!("COMMON_NODE_HEADER_SIZE: {}", COMMON_NODE_HEADER_SIZE);
    println!("LEAF_NODE_HEADER_SIZE: {}", LEAF_NODE_HEADER_SIZE);
    println!("LEAF_NODE_CELL_SIZE: {}", LEAF_NODE_CELL_SIZE);
    println!("LEAF_NODE_SPACE_FOR_CELLS: {}", LEAF_NODE_SPACE_FOR_CELLS);
    println!("LEAF_NODE_MAX_CELLS: {}", LEAF_NODE_MAX_CELLS);
}

/// Recursive indented-outline dump of the tree rooted at `page_num`. Reads
/// pages one at a time through the pager, so no page handle outlives the
/// call that produced it.
fn print_tree(table: &mut Table, page_num: usize, indent: usize) {
    let node = table.pager.get(page_num).expect("page read for .btree failed");
    match node_type(node) {
        NodeType::Leaf => {
            let num_cells = leaf_num_cells(node);
            print_indent(indent);
            println!("- leaf (size {})", num_cells);
            for i in 0..num_cells as usize {
                let node = table.pager.get(page_num).expect("page read for .btree failed");
                let key = crate::node::leaf_key(node, i);
                print_indent(indent + 1);
                println!("- {}", key);
            }
        }
        NodeType::Internal => {
            let num_keys = internal_num_keys(node) as usize;
            print_indent(indent);
            println!("- internal (size {})", num_keys);
            for i in 0..num_keys {
                let child = {
                    let node = table.pager.get(page_num).expect("page read for .btree failed");
                    internal_child(node, i)
                };
                print_tree(table, child as usize, indent + 1);
                let key = {
                    let node = table.pager.get(page_num).expect("page read for .btree failed");
                    crate::node::internal_key(node, i)
                };
                print_indent(indent + 1);
                println!("- key {}", key);
            }
            let right_child = {
                let node = table.pager.get(page_num).expect("page read for .btree failed");
                crate::node::internal_right_child(node)
            };
            print_tree(table, right_child as usize, indent + 1);
        }
    }
}

fn print_indent(indent: usize) {
    for _ in 0..indent {
        print!("  ");
    }
}
