//! Catalog of tables and mapped classes.
//!
//! The catalog is the mapping layer the flag machinery consumes: it hands
//! out column identities (through [`Table`]) and answers mapper
//! introspection queries (through [`AttributeDirectory`]).

pub mod column_info;
pub mod mapper;
pub mod table_info;

pub use column_info::{Column, ColumnId, ColumnInfo};
pub use mapper::{ClassId, ColumnProperty, Discriminator, Mapper, MapperBuilder};
pub use table_info::{Table, TableId};

use crate::resolver::AttributeDirectory;
use anyhow::{Result, bail};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct Catalog {
    table_cache: RwLock<HashMap<String, Arc<Table>>>,
    mappers: RwLock<HashMap<ClassId, Arc<Mapper>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a new table
    pub fn create_table(&self, name: &str, columns: Vec<ColumnInfo>) -> Result<Arc<Table>> {
        let mut tables = self.table_cache.write();
        if tables.contains_key(name) {
            bail!("Table '{}' already exists", name);
        }

        let table = Table::new(name, columns)?;
        tables.insert(name.to_string(), table.clone());
        debug!(
            "Created table '{}' ({:?}) with {} columns",
            name,
            table.table_id(),
            table.columns().len()
        );
        Ok(table)
    }

    pub fn get_table(&self, name: &str) -> Option<Arc<Table>> {
        self.table_cache.read().get(name).cloned()
    }

    pub fn list_tables(&self) -> Vec<Arc<Table>> {
        let mut tables: Vec<_> = self.table_cache.read().values().cloned().collect();
        tables.sort_by_key(|table| table.table_id());
        tables
    }

    /// Finish configuring a mapped class.
    ///
    /// The returned mapper is what flags register against; see
    /// [`crate::model::ModelBuilder::build`].
    pub fn map_class(&self, builder: MapperBuilder) -> Result<Arc<Mapper>> {
        let mapper = Arc::new(builder.build(ClassId::allocate())?);
        if let Some(parent) = mapper.parent() {
            if !self.mappers.read().contains_key(&parent) {
                bail!(
                    "Parent of class '{}' is not mapped in this catalog",
                    mapper.class_name()
                );
            }
        }

        self.mappers.write().insert(mapper.class_id(), mapper.clone());
        debug!(
            "Configured mapper for '{}' ({}) on table '{}'",
            mapper.class_name(),
            mapper.class_id(),
            mapper.table().table_name()
        );
        Ok(mapper)
    }

    pub fn mapper(&self, class: ClassId) -> Option<Arc<Mapper>> {
        self.mappers.read().get(&class).cloned()
    }
}

impl AttributeDirectory for Catalog {
    fn columns_of(&self, class: ClassId) -> Vec<Column> {
        self.mapper(class)
            .map(|mapper| mapper.columns())
            .unwrap_or_default()
    }

    fn attribute_names_of(&self, class: ClassId, column: &Column) -> Vec<String> {
        self.mapper(class)
            .map(|mapper| mapper.attribute_names(column))
            .unwrap_or_default()
    }
}
