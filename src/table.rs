use log::info;

use crate::error::DbError;
use crate::node::{init_leaf, node_type, set_is_root, NodeType};
use crate::pager::Pager;

/// Composes the pager and the root page number into the single handle the
/// rest of the engine (and the REPL) operates on.
pub struct Table {
    pub pager: Pager,
    pub root_page_num: usize,
}

impl Table {
    pub fn open(filename: &str) -> Result<Table, DbError> {
        let mut pager = Pager::open(filename)?;
        let root_page_num = 0;

        if pager.num_pages() == 0 {
            let root = pager.get(root_page_num)?;
            init_leaf(root);
            set_is_root(root, true);
            info!("created new database {} with an empty root leaf", filename);
        } else {
            info!(
                "opened database {} with {} existing page(s)",
                filename,
                pager.num_pages()
            );
        }

        Ok(Table {
            pager,
            root_page_num,
        })
    }

    pub fn close(&mut self) -> Result<(), DbError> {
        self.pager.close()
    }

    pub fn root_node_type(&mut self) -> Result<NodeType, DbError> {
        Ok(node_type(self.pager.get(self.root_page_num)?))
    }
}
