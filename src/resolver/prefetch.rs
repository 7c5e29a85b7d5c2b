use crate::catalog::{ClassId, Column};
use crate::error::{FlagError, Result};
use crate::resolver::{AttributeDirectory, AttributeResolver, resolve_unique};
use dashmap::DashMap;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Resolver with attribute names recorded per class at registration.
///
/// Lookups for a class that was never registered fail rather than falling
/// back to introspection.
pub struct PrefetchedResolver {
    columns: HashSet<Column>,
    targets: DashMap<ClassId, HashMap<Column, String>>,
}

impl PrefetchedResolver {
    pub fn new(columns: HashSet<Column>) -> Self {
        Self {
            columns,
            targets: DashMap::new(),
        }
    }

    pub fn is_registered(&self, class: ClassId) -> bool {
        self.targets.contains_key(&class)
    }
}

impl AttributeResolver for PrefetchedResolver {
    fn columns(&self) -> &HashSet<Column> {
        &self.columns
    }

    fn register(&self, directory: &dyn AttributeDirectory, class: ClassId) -> Result<()> {
        if self.is_registered(class) {
            return Ok(());
        }

        let mut names = HashMap::new();
        for column in directory.columns_of(class) {
            if self.columns.contains(&column) {
                let name =
                    resolve_unique(class, &column, directory.attribute_names_of(class, &column))?;
                names.insert(column, name);
            }
        }

        debug!(
            "Prefetched {} of {} attribute names for {}",
            names.len(),
            self.columns.len(),
            class
        );
        self.targets.entry(class).or_insert(names);
        Ok(())
    }

    fn attribute_name(&self, class: ClassId, column: &Column) -> Result<String> {
        let names = self
            .targets
            .get(&class)
            .ok_or(FlagError::UnregisteredClass { class })?;
        names
            .get(column)
            .cloned()
            .ok_or_else(|| FlagError::UnmappedColumn {
                class,
                column: column.to_string(),
            })
    }
}
