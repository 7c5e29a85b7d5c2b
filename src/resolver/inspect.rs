use crate::catalog::{ClassId, Column};
use crate::error::Result;
use crate::resolver::{AttributeDirectory, AttributeResolver, resolve_unique};
use std::collections::HashSet;
use std::sync::Arc;

/// Resolver that queries the directory on every access.
///
/// Always reflects the current mapping state and needs no registration.
pub struct InspectingResolver {
    columns: HashSet<Column>,
    directory: Arc<dyn AttributeDirectory>,
}

impl InspectingResolver {
    pub fn new(columns: HashSet<Column>, directory: Arc<dyn AttributeDirectory>) -> Self {
        Self { columns, directory }
    }
}

impl AttributeResolver for InspectingResolver {
    fn columns(&self) -> &HashSet<Column> {
        &self.columns
    }

    fn attribute_name(&self, class: ClassId, column: &Column) -> Result<String> {
        resolve_unique(
            class,
            column,
            self.directory.attribute_names_of(class, column),
        )
    }
}
