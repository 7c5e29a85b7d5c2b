//! Translation of column identities into per-class attribute names.
//!
//! The same column can be exposed under different attribute names by
//! different mapped classes, so a flag cannot read a column's value from an
//! object without first asking which attribute holds it on that object's
//! class. Two strategies are provided: [`InspectingResolver`] asks the
//! [`AttributeDirectory`] on every access, [`PrefetchedResolver`] records the
//! names once per class at registration time.

pub mod inspect;
pub mod prefetch;

pub use inspect::InspectingResolver;
pub use prefetch::PrefetchedResolver;

use crate::access::Value;
use crate::catalog::{ClassId, Column};
use crate::error::{FlagError, Result};
use crate::model::MappedObject;
use std::collections::HashSet;

/// Mapper introspection consumed by the resolvers
pub trait AttributeDirectory: Send + Sync {
    /// Distinct columns mapped by `class`
    fn columns_of(&self, class: ClassId) -> Vec<Column>;

    /// Every attribute name bound to `column` on `class`
    fn attribute_names_of(&self, class: ClassId, column: &Column) -> Vec<String>;
}

pub trait AttributeResolver: Send + Sync {
    /// Columns this resolver translates
    fn columns(&self) -> &HashSet<Column>;

    /// Make `class` known to the resolver. Called once per mapped class
    /// after its mapper is configured.
    fn register(&self, _directory: &dyn AttributeDirectory, _class: ClassId) -> Result<()> {
        Ok(())
    }

    fn attribute_name(&self, class: ClassId, column: &Column) -> Result<String>;

    /// Attribute name of the only tracked column
    fn single_name(&self, object: &dyn MappedObject) -> Result<String> {
        let mut columns = self.columns().iter();
        match (columns.next(), columns.next()) {
            (Some(column), None) => self.attribute_name(object.class_id(), column),
            _ => Err(FlagError::MultipleColumns),
        }
    }

    /// Current value of `column` on `object`
    fn value(&self, object: &dyn MappedObject, column: &Column) -> Result<Value> {
        let class = object.class_id();
        let name = self.attribute_name(class, column)?;
        object
            .attribute(&name)
            .cloned()
            .ok_or(FlagError::UnknownAttribute {
                class,
                attribute: name,
            })
    }
}

/// Reduce the names found for a column to exactly one.
pub(crate) fn resolve_unique(
    class: ClassId,
    column: &Column,
    mut names: Vec<String>,
) -> Result<String> {
    names.sort();
    names.dedup();
    match names.len() {
        0 => Err(FlagError::UnmappedColumn {
            class,
            column: column.to_string(),
        }),
        1 => Ok(names.remove(0)),
        _ => Err(FlagError::AmbiguousAttribute {
            class,
            column: column.to_string(),
            names,
        }),
    }
}
