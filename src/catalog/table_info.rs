//! Table information and metadata structures.

use crate::access::DataType;
use crate::catalog::column_info::{Column, ColumnId, ColumnInfo};
use anyhow::{Result, anyhow, bail};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

// Process-wide so that columns of tables from different catalogs never share an identity.
static NEXT_TABLE_ID: AtomicU32 = AtomicU32::new(1);

impl TableId {
    fn allocate() -> Self {
        TableId(NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
pub struct Table {
    table_id: TableId,
    table_name: Arc<str>,
    columns: Vec<Column>,
}

impl Table {
    /// Create a table with a fresh identity.
    pub fn new(table_name: &str, column_infos: Vec<ColumnInfo>) -> Result<Arc<Self>> {
        if column_infos.is_empty() {
            bail!("Table '{}' must have at least one column", table_name);
        }

        let mut seen = HashSet::new();
        for info in &column_infos {
            if !seen.insert(info.column_name.as_str()) {
                bail!(
                    "Duplicate column '{}' in table '{}'",
                    info.column_name,
                    table_name
                );
            }
        }

        let table_id = TableId::allocate();
        let name: Arc<str> = Arc::from(table_name);
        let columns = column_infos
            .iter()
            .enumerate()
            .map(|(order, info)| {
                let id = ColumnId {
                    table_id,
                    column_order: order as u32,
                };
                Column::new(id, name.clone(), info)
            })
            .collect();

        Ok(Arc::new(Self {
            table_id,
            table_name: name,
            columns,
        }))
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name() == name)
    }

    /// Like [`Table::column`], but fails for unknown names.
    pub fn get_column(&self, name: &str) -> Result<Column> {
        self.column(name)
            .cloned()
            .ok_or_else(|| anyhow!("Column '{}' not found in table '{}'", name, self.table_name))
    }

    pub fn contains(&self, column: &Column) -> bool {
        column.table_id() == self.table_id && column.position() < self.columns.len()
    }

    /// Row schema in column order
    pub fn schema(&self) -> Vec<DataType> {
        self.columns.iter().map(|col| col.data_type()).collect()
    }
}
