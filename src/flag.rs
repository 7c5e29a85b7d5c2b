//! Boolean attributes derived from column expressions.
//!
//! A [`ColumnFlag`] reads as the truthiness of its expression evaluated
//! against an object's current attribute values. When a default is
//! configured the flag is writable: `true` stores the default in the single
//! underlying attribute, `false` clears it.

use crate::access::Value;
use crate::catalog::{ClassId, Column};
use crate::error::{FlagError, Result};
use crate::expression::{CompiledExpression, Expression, rephrase_as_boolean};
use crate::model::MappedObject;
use crate::resolver::{
    AttributeDirectory, AttributeResolver, InspectingResolver, PrefetchedResolver,
};
use log::debug;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Value stored when a flag is set to `true`
#[derive(Clone)]
pub enum FlagDefault {
    Value(Value),
    /// Called on every assignment
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FlagDefault {
    pub fn resolve(&self) -> Value {
        match self {
            FlagDefault::Value(value) => value.clone(),
            FlagDefault::Producer(producer) => producer(),
        }
    }
}

impl fmt::Debug for FlagDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            FlagDefault::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// Start building a flag over `expr`
pub fn column_flag(expr: Expression) -> FlagBuilder {
    FlagBuilder::new(expr)
}

pub struct FlagBuilder {
    expression: Expression,
    default: Option<FlagDefault>,
    directory: Option<Arc<dyn AttributeDirectory>>,
}

impl FlagBuilder {
    pub fn new(expression: Expression) -> Self {
        Self {
            expression,
            default: None,
            directory: None,
        }
    }

    /// Make the flag writable, storing `value` when set
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FlagDefault::Value(value.into()));
        self
    }

    /// Make the flag writable, storing the producer's result when set
    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(FlagDefault::Producer(Arc::new(producer)));
        self
    }

    /// Resolve attribute names by asking `directory` on every access
    /// instead of recording them at registration
    pub fn on_demand(mut self, directory: Arc<dyn AttributeDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn build(self) -> Result<ColumnFlag> {
        let expression = CompiledExpression::new(rephrase_as_boolean(self.expression))?;
        let columns = expression.columns();
        // A NULL default could never make the flag read true
        let default = self
            .default
            .filter(|default| !matches!(default, FlagDefault::Value(Value::Null)));
        if let Some(default) = &default {
            let mut tracked = columns.iter();
            let (Some(column), None) = (tracked.next(), tracked.next()) else {
                return Err(FlagError::DefaultOnMultiColumn);
            };
            if let FlagDefault::Value(value) = default {
                check_default(column.name(), column, value.clone())?;
            }
        }

        let (resolver, strategy) = match self.directory {
            Some(directory) => (
                Box::new(InspectingResolver::new(columns, directory)) as Box<dyn AttributeResolver>,
                "on demand",
            ),
            None => (
                Box::new(PrefetchedResolver::new(columns)) as Box<dyn AttributeResolver>,
                "prefetched",
            ),
        };
        debug!(
            "Built {} flag over '{}' resolving {}",
            if default.is_some() {
                "writable"
            } else {
                "read-only"
            },
            expression.sql(),
            strategy
        );

        Ok(ColumnFlag {
            expression,
            resolver,
            default,
        })
    }
}

/// Reject a default the tracked column's type cannot hold
fn check_default(attribute: &str, column: &Column, value: Value) -> Result<Value> {
    if value.is_compatible_with(column.data_type()) {
        Ok(value)
    } else {
        Err(FlagError::IncompatibleValue {
            attribute: attribute.to_string(),
            data_type: column.data_type(),
            value,
        })
    }
}

pub struct ColumnFlag {
    expression: CompiledExpression,
    resolver: Box<dyn AttributeResolver>,
    default: Option<FlagDefault>,
}

impl ColumnFlag {
    pub fn builder(expr: Expression) -> FlagBuilder {
        FlagBuilder::new(expr)
    }

    pub fn expression(&self) -> &CompiledExpression {
        &self.expression
    }

    pub fn columns(&self) -> &HashSet<Column> {
        self.resolver.columns()
    }

    pub fn default(&self) -> Option<&FlagDefault> {
        self.default.as_ref()
    }

    pub fn is_writable(&self) -> bool {
        self.default.is_some()
    }

    /// Make a mapped class known to this flag's resolver
    pub fn register(&self, directory: &dyn AttributeDirectory, class: ClassId) -> Result<()> {
        self.resolver.register(directory, class)
    }

    /// Raw value of the expression for `object`
    pub fn evaluate(&self, object: &dyn MappedObject) -> Result<Value> {
        self.expression
            .evaluate(|column| self.resolver.value(object, column))
    }

    pub fn get(&self, object: &dyn MappedObject) -> Result<bool> {
        Ok(self.evaluate(object)?.is_truthy())
    }

    /// Assign the flag. Only booleans are accepted; the underlying attribute
    /// is left untouched on failure.
    pub fn set(&self, object: &mut dyn MappedObject, value: impl Into<Value>) -> Result<()> {
        let Some(default) = &self.default else {
            return Err(FlagError::ReadOnly);
        };
        let enabled = match value.into() {
            Value::Boolean(enabled) => enabled,
            value => return Err(FlagError::NonBooleanAssignment { value }),
        };

        let name = self.resolver.single_name(&*object)?;
        let stored = match self.resolver.columns().iter().next() {
            Some(column) if enabled => check_default(&name, column, default.resolve())?,
            _ => Value::Null,
        };
        object.set_attribute(&name, stored)
    }

    /// Class-level predicate, usable to filter stored rows
    pub fn predicate(&self) -> Expression {
        self.expression.sql().clone()
    }
}

impl fmt::Debug for ColumnFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnFlag")
            .field("expression", &self.expression.sql().to_string())
            .field("default", &self.default)
            .finish()
    }
}
