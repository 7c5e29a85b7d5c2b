//! Mapped objects and the classes exposing flags on them.

use crate::access::Value;
use crate::catalog::{ClassId, Mapper};
use crate::error::{FlagError, Result};
use crate::expression::Expression;
use crate::flag::ColumnFlag;
use crate::resolver::AttributeDirectory;
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Instance of a mapped class as seen by flags
pub trait MappedObject {
    /// Runtime class of the object
    fn class_id(&self) -> ClassId;

    fn attribute(&self, name: &str) -> Option<&Value>;

    fn set_attribute(&mut self, name: &str, value: Value) -> Result<()>;
}

/// Plain attribute bag for a mapped class.
///
/// Every attribute mapped by the class exists from construction, initially
/// NULL; attributes the class does not map are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    class_id: ClassId,
    attributes: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(mapper: &Mapper) -> Self {
        let attributes = mapper
            .properties()
            .iter()
            .map(|prop| (prop.key.clone(), Value::Null))
            .collect();
        Self {
            class_id: mapper.class_id(),
            attributes,
        }
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }
}

impl MappedObject for Record {
    fn class_id(&self) -> ClassId {
        self.class_id
    }

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: Value) -> Result<()> {
        match self.attributes.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(FlagError::UnknownAttribute {
                class: self.class_id,
                attribute: name.to_string(),
            }),
        }
    }
}

/// A mapped class together with its flags
#[derive(Debug)]
pub struct Model {
    mapper: Arc<Mapper>,
    flags: BTreeMap<String, Arc<ColumnFlag>>,
}

impl Model {
    pub fn builder(mapper: &Arc<Mapper>) -> ModelBuilder {
        ModelBuilder::new(mapper)
    }

    /// Start a subclass model carrying every flag of `parent`
    pub fn inherit(parent: &Model, mapper: &Arc<Mapper>) -> ModelBuilder {
        let mut builder = ModelBuilder::new(mapper);
        builder.flags = parent.flags.clone();
        builder
    }

    pub fn mapper(&self) -> &Arc<Mapper> {
        &self.mapper
    }

    pub fn class_id(&self) -> ClassId {
        self.mapper.class_id()
    }

    pub fn flag_names(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    pub fn flag(&self, name: &str) -> Result<&Arc<ColumnFlag>> {
        self.flags
            .get(name)
            .ok_or_else(|| FlagError::UnknownAttribute {
                class: self.class_id(),
                attribute: name.to_string(),
            })
    }

    /// Class-level predicate of a flag
    pub fn predicate(&self, name: &str) -> Result<Expression> {
        Ok(self.flag(name)?.predicate())
    }

    /// Empty record with the polymorphic identity filled in
    pub fn new_record(&self) -> Record {
        let mut record = Record::new(&self.mapper);
        if let Some(discriminator) = self.mapper.discriminator() {
            record
                .attributes
                .insert(discriminator.key.clone(), discriminator.identity.clone());
        }
        record
    }

    /// Build a record from initial values.
    ///
    /// Plain attributes are assigned first, then flags through their setters.
    pub fn create<I, K, V>(&self, attrs: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = self.new_record();
        let mut flags = Vec::new();
        for (name, value) in attrs {
            let name = name.as_ref();
            if self.flags.contains_key(name) {
                flags.push((name.to_string(), value.into()));
            } else {
                self.write(&mut record, name, value)?;
            }
        }
        for (name, value) in flags {
            self.write(&mut record, &name, value)?;
        }
        Ok(record)
    }

    /// Read a plain attribute, or a flag as a boolean
    pub fn read(&self, record: &Record, name: &str) -> Result<Value> {
        if let Some(flag) = self.flags.get(name) {
            return Ok(Value::Boolean(flag.get(record)?));
        }
        record
            .attribute(name)
            .cloned()
            .ok_or_else(|| FlagError::UnknownAttribute {
                class: record.class_id(),
                attribute: name.to_string(),
            })
    }

    /// Write a plain attribute, or assign a flag
    pub fn write(&self, record: &mut Record, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if let Some(flag) = self.flags.get(name) {
            return flag.set(record, value);
        }

        let property = self
            .mapper
            .property(name)
            .ok_or_else(|| FlagError::UnknownAttribute {
                class: self.class_id(),
                attribute: name.to_string(),
            })?;
        let data_type = property.column.data_type();
        if !value.is_compatible_with(data_type) {
            return Err(FlagError::IncompatibleValue {
                attribute: name.to_string(),
                data_type,
                value,
            });
        }
        record.set_attribute(name, value)
    }

    pub fn get_flag(&self, record: &Record, name: &str) -> Result<bool> {
        self.flag(name)?.get(record)
    }

    pub fn set_flag(&self, record: &mut Record, name: &str, value: impl Into<Value>) -> Result<()> {
        self.flag(name)?.set(record, value)
    }
}

#[derive(Debug)]
pub struct ModelBuilder {
    mapper: Arc<Mapper>,
    flags: BTreeMap<String, Arc<ColumnFlag>>,
}

impl ModelBuilder {
    pub fn new(mapper: &Arc<Mapper>) -> Self {
        Self {
            mapper: mapper.clone(),
            flags: BTreeMap::new(),
        }
    }

    pub fn flag(mut self, name: &str, flag: ColumnFlag) -> Self {
        self.flags.insert(name.to_string(), Arc::new(flag));
        self
    }

    /// Register every flag with the mapped class and finish the model.
    pub fn build(self, directory: &dyn AttributeDirectory) -> Result<Model> {
        let class = self.mapper.class_id();
        for (name, flag) in &self.flags {
            if self.mapper.has_attribute(name) {
                return Err(FlagError::AttributeConflict {
                    class,
                    attribute: name.clone(),
                });
            }
            flag.register(directory, class)?;
        }

        debug!(
            "Configured model '{}' with {} flags",
            self.mapper.class_name(),
            self.flags.len()
        );
        Ok(Model {
            mapper: self.mapper,
            flags: self.flags,
        })
    }
}
