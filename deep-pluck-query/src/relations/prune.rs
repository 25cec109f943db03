//! Removal of join-only columns after loading.

use crate::row::Row;
use crate::traits::Relation;
use crate::value::Value;

use super::node::Node;

impl<R: Relation> Node<R> {
    /// Strip every column this node fetched only for joining, then recurse
    /// into the nested rows of each child association.
    ///
    /// Must only run once the whole tree has been loaded and merged. Running
    /// it again on pruned rows changes nothing.
    pub fn delete_extra_columns(&self, rows: &mut [Row]) {
        for row in rows.iter_mut() {
            for key in &self.extra_columns {
                row.shift_remove(key);
            }
            for (name, child) in &self.children {
                match row.get_mut(name) {
                    Some(Value::Row(nested)) => {
                        child.delete_extra_columns(std::slice::from_mut(nested))
                    }
                    Some(Value::Rows(nested)) => child.delete_extra_columns(nested),
                    _ => {}
                }
            }
        }
    }
}
