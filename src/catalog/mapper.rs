//! Class-to-table mapping metadata.

use crate::access::Value;
use crate::catalog::column_info::Column;
use crate::catalog::table_info::Table;
use anyhow::{Result, bail};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Runtime identity of a mapped class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

static NEXT_CLASS_ID: AtomicU32 = AtomicU32::new(1);

impl ClassId {
    pub(crate) fn allocate() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// An attribute of a mapped class backed by a table column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProperty {
    pub key: String,
    pub column: Column,
}

/// Polymorphic discriminator of a class in a single-table hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    pub key: String,
    pub identity: Value,
}

#[derive(Debug)]
pub struct Mapper {
    class_id: ClassId,
    class_name: String,
    table: Arc<Table>,
    properties: Vec<ColumnProperty>,
    parent: Option<ClassId>,
    discriminator: Option<Discriminator>,
}

impl Mapper {
    pub fn builder(class_name: &str, table: &Arc<Table>) -> MapperBuilder {
        MapperBuilder::new(class_name, table)
    }

    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn properties(&self) -> &[ColumnProperty] {
        &self.properties
    }

    pub fn parent(&self) -> Option<ClassId> {
        self.parent
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    pub fn property(&self, key: &str) -> Option<&ColumnProperty> {
        self.properties.iter().find(|prop| prop.key == key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// Distinct columns mapped by this class, in property order
    pub fn columns(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.properties.len());
        for prop in &self.properties {
            if !columns.contains(&prop.column) {
                columns.push(prop.column.clone());
            }
        }
        columns
    }

    pub fn contains_column(&self, column: &Column) -> bool {
        self.properties.iter().any(|prop| &prop.column == column)
    }

    /// Every attribute key bound to `column`. More than one means the
    /// column is mapped ambiguously on this class.
    pub fn attribute_names(&self, column: &Column) -> Vec<String> {
        self.properties
            .iter()
            .filter(|prop| &prop.column == column)
            .map(|prop| prop.key.clone())
            .collect()
    }
}

/// Builder for [`Mapper`]; finished by [`crate::catalog::Catalog::map_class`].
#[derive(Debug)]
pub struct MapperBuilder {
    class_name: String,
    table: Arc<Table>,
    properties: Vec<(String, String)>,
    all_columns: bool,
    parent: Option<Arc<Mapper>>,
    polymorphic: Option<(Option<String>, Value)>,
}

impl MapperBuilder {
    pub fn new(class_name: &str, table: &Arc<Table>) -> Self {
        Self {
            class_name: class_name.to_string(),
            table: table.clone(),
            properties: Vec::new(),
            all_columns: false,
            parent: None,
            polymorphic: None,
        }
    }

    /// Map a column under an attribute of the same name
    pub fn column(self, column_name: &str) -> Self {
        self.column_as(column_name, column_name)
    }

    /// Map a column under a different attribute name
    pub fn column_as(mut self, key: &str, column_name: &str) -> Self {
        self.properties.push((key.to_string(), column_name.to_string()));
        self
    }

    /// Map every column not otherwise mapped under its own name
    pub fn all_columns(mut self) -> Self {
        self.all_columns = true;
        self
    }

    /// Single-table inheritance: start from the parent's properties.
    pub fn inherits(mut self, parent: &Arc<Mapper>) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Set the discriminator attribute and this class's identity in it.
    pub fn polymorphic(mut self, key: &str, identity: impl Into<Value>) -> Self {
        self.polymorphic = Some((Some(key.to_string()), identity.into()));
        self
    }

    /// Set only the identity, reusing the parent's discriminator attribute.
    pub fn polymorphic_identity(mut self, identity: impl Into<Value>) -> Self {
        self.polymorphic = Some((None, identity.into()));
        self
    }

    pub(crate) fn build(self, class_id: ClassId) -> Result<Mapper> {
        let mut properties: Vec<ColumnProperty> = Vec::new();
        let mut parent_discriminator = None;

        if let Some(parent) = &self.parent {
            if parent.table().table_id() != self.table.table_id() {
                bail!(
                    "Class '{}' must map table '{}' to inherit from '{}'",
                    self.class_name,
                    parent.table().table_name(),
                    parent.class_name()
                );
            }
            properties.extend(parent.properties().iter().cloned());
            parent_discriminator = parent.discriminator().map(|d| d.key.clone());
        }

        for (key, column_name) in &self.properties {
            if properties.iter().any(|prop| &prop.key == key) {
                bail!(
                    "Attribute '{}' is already mapped on class '{}'",
                    key,
                    self.class_name
                );
            }
            let column = self.table.get_column(column_name)?;
            properties.push(ColumnProperty {
                key: key.clone(),
                column,
            });
        }

        if self.all_columns {
            for column in self.table.columns() {
                let taken = properties
                    .iter()
                    .any(|prop| &prop.column == column || prop.key == column.name());
                if !taken {
                    properties.push(ColumnProperty {
                        key: column.name().to_string(),
                        column: column.clone(),
                    });
                }
            }
        }

        let discriminator = match self.polymorphic {
            Some((key, identity)) => {
                let Some(key) = key.or(parent_discriminator) else {
                    bail!(
                        "Class '{}' has a polymorphic identity but no discriminator attribute",
                        self.class_name
                    );
                };
                if !properties.iter().any(|prop| prop.key == key) {
                    bail!(
                        "Discriminator '{}' is not a mapped attribute of class '{}'",
                        key,
                        self.class_name
                    );
                }
                Some(Discriminator { key, identity })
            }
            None => None,
        };

        Ok(Mapper {
            class_id,
            class_name: self.class_name,
            table: self.table,
            properties,
            parent: self.parent.as_ref().map(|parent| parent.class_id()),
            discriminator,
        })
    }
}
