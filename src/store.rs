//! In-memory row storage for mapped classes.
//!
//! Rows are kept in the same encoding as [`serialize_values`] produces, one
//! slot per row, so every read goes through a full decode exactly as a
//! reload from disk would. Snapshots persist the whole heap with `bincode`.

use crate::access::{DataType, Value, deserialize_values, serialize_values};
use crate::catalog::{Column, Table};
use crate::expression::{CompiledExpression, Expression, ExpressionError};
use crate::model::{MappedObject, Model, Record};
use anyhow::{Context, Result, bail};
use log::{debug, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u32);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row#{}", self.0)
    }
}

/// Persisted form of a [`TableStore`]
#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    table_name: String,
    schema: Vec<u8>,
    rows: Vec<Option<Vec<u8>>>,
}

pub struct TableStore {
    table: Arc<Table>,
    schema: Vec<DataType>,
    rows: RwLock<Vec<Option<Vec<u8>>>>,
}

impl TableStore {
    pub fn new(table: &Arc<Table>) -> Self {
        Self {
            table: table.clone(),
            schema: table.schema(),
            rows: RwLock::new(Vec::new()),
        }
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Number of live rows
    pub fn len(&self) -> usize {
        self.rows.read().iter().filter(|row| row.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, model: &Model, record: &Record) -> Result<RowId> {
        let data = self.encode(model, record)?;
        let mut rows = self.rows.write();
        let row_id = RowId(u32::try_from(rows.len()).context("Table store is full")?);
        rows.push(Some(data));
        debug!(
            "Inserted {} into '{}' as {}",
            row_id,
            self.table.table_name(),
            model.mapper().class_name()
        );
        Ok(row_id)
    }

    pub fn update(&self, model: &Model, row_id: RowId, record: &Record) -> Result<()> {
        let data = self.encode(model, record)?;
        let mut rows = self.rows.write();
        match rows.get_mut(row_id.0 as usize) {
            Some(slot) if slot.is_some() => {
                *slot = Some(data);
                debug!("Updated {} in '{}'", row_id, self.table.table_name());
                Ok(())
            }
            _ => bail!("Row {} not found in '{}'", row_id, self.table.table_name()),
        }
    }

    pub fn delete(&self, row_id: RowId) -> Result<()> {
        let mut rows = self.rows.write();
        match rows.get_mut(row_id.0 as usize) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                debug!("Deleted {} from '{}'", row_id, self.table.table_name());
                Ok(())
            }
            _ => bail!("Row {} not found in '{}'", row_id, self.table.table_name()),
        }
    }

    /// Decoded column values of a row, in table order
    pub fn values(&self, row_id: RowId) -> Result<Vec<Value>> {
        let rows = self.rows.read();
        let Some(Some(data)) = rows.get(row_id.0 as usize) else {
            bail!("Row {} not found in '{}'", row_id, self.table.table_name());
        };
        deserialize_values(data, &self.schema)
    }

    /// Reload a row into a fresh record of `model`'s class
    pub fn load(&self, model: &Model, row_id: RowId) -> Result<Record> {
        self.check_model(model)?;
        let values = self.values(row_id)?;
        self.decode(model, &values)
    }

    /// Rows of `model`'s class for which `predicate` is truthy.
    ///
    /// Subclass models only see rows carrying their polymorphic identity.
    pub fn filter(&self, model: &Model, predicate: &Expression) -> Result<Vec<(RowId, Record)>> {
        self.check_model(model)?;
        let compiled = self.compile(predicate)?;
        let identity = match (model.mapper().parent(), model.mapper().discriminator()) {
            (Some(_), Some(discriminator)) => {
                let key = model
                    .mapper()
                    .property(&discriminator.key)
                    .context("Discriminator is not mapped")?;
                Some((key.column.position(), &discriminator.identity))
            }
            _ => None,
        };

        let mut matches = Vec::new();
        for (row_id, values) in self.scan()? {
            if let Some((position, identity)) = identity {
                if values.get(position) != Some(identity) {
                    continue;
                }
            }
            if evaluate_row(&compiled, &values)?.is_truthy() {
                matches.push((row_id, self.decode(model, &values)?));
            }
        }
        Ok(matches)
    }

    /// Number of rows for which `predicate` is truthy, across all classes
    pub fn count(&self, predicate: &Expression) -> Result<usize> {
        let compiled = self.compile(predicate)?;
        let mut count = 0;
        for (_, values) in self.scan()? {
            if evaluate_row(&compiled, &values)?.is_truthy() {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let snapshot = StoreSnapshot {
            table_name: self.table.table_name().to_string(),
            schema: self.schema.iter().map(|data_type| *data_type as u8).collect(),
            rows: self.rows.read().clone(),
        };
        bincode::serialize(&snapshot).context("Failed to encode table snapshot")
    }

    /// Rebuild a store for `table` from [`TableStore::snapshot`] output
    pub fn restore(table: &Arc<Table>, bytes: &[u8]) -> Result<Self> {
        let snapshot: StoreSnapshot =
            bincode::deserialize(bytes).context("Failed to decode table snapshot")?;
        if snapshot.table_name != table.table_name() {
            bail!(
                "Snapshot of table '{}' cannot be restored into '{}'",
                snapshot.table_name,
                table.table_name()
            );
        }
        let schema = snapshot
            .schema
            .iter()
            .map(|code| DataType::from_u8(*code))
            .collect::<Result<Vec<_>>>()?;
        if schema != table.schema() {
            bail!(
                "Snapshot schema {:?} does not match table '{}'",
                schema,
                table.table_name()
            );
        }

        let store = Self {
            table: table.clone(),
            schema,
            rows: RwLock::new(snapshot.rows),
        };
        info!(
            "Restored {} rows into '{}'",
            store.len(),
            table.table_name()
        );
        Ok(store)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.snapshot()?)
            .with_context(|| format!("Failed to write snapshot to {}", path.display()))
    }

    pub fn open(table: &Arc<Table>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read snapshot from {}", path.display()))?;
        Self::restore(table, &bytes)
    }

    fn check_model(&self, model: &Model) -> Result<()> {
        let table = model.mapper().table();
        if table.table_id() != self.table.table_id() {
            bail!(
                "Class '{}' maps table '{}', not '{}'",
                model.mapper().class_name(),
                table.table_name(),
                self.table.table_name()
            );
        }
        Ok(())
    }

    fn compile(&self, predicate: &Expression) -> Result<CompiledExpression> {
        let compiled = CompiledExpression::new(predicate.clone())?;
        if let Some(column) = compiled.columns().iter().find(|c| !self.table.contains(c)) {
            bail!(
                "Column {} does not belong to table '{}'",
                column,
                self.table.table_name()
            );
        }
        Ok(compiled)
    }

    fn scan(&self) -> Result<Vec<(RowId, Vec<Value>)>> {
        let rows = self.rows.read();
        let mut decoded = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if let Some(data) = row {
                decoded.push((RowId(index as u32), deserialize_values(data, &self.schema)?));
            }
        }
        Ok(decoded)
    }

    fn encode(&self, model: &Model, record: &Record) -> Result<Vec<u8>> {
        self.check_model(model)?;
        let values: Vec<Value> = self
            .table
            .columns()
            .iter()
            .map(|column| column_value(model, record, column))
            .collect();
        serialize_values(&values, &self.schema)
    }

    fn decode(&self, model: &Model, values: &[Value]) -> Result<Record> {
        let mut record = model.new_record();
        for prop in model.mapper().properties() {
            let value = values
                .get(prop.column.position())
                .cloned()
                .unwrap_or(Value::Null);
            record.set_attribute(&prop.key, value)?;
        }
        Ok(record)
    }
}

/// Value stored for `column`; columns the class does not map are NULL.
fn column_value(model: &Model, record: &Record, column: &Column) -> Value {
    model
        .mapper()
        .attribute_names(column)
        .first()
        .and_then(|name| record.attribute(name))
        .cloned()
        .unwrap_or(Value::Null)
}

fn evaluate_row(compiled: &CompiledExpression, values: &[Value]) -> Result<Value> {
    let value = compiled.evaluate(|column| {
        values
            .get(column.position())
            .cloned()
            .ok_or_else(|| ExpressionError::ColumnNotFound {
                column: column.to_string(),
            })
    })?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, ColumnInfo, Mapper};
    use crate::flag::column_flag;
    use tempfile::tempdir;

    fn setup() -> (Catalog, Arc<Table>, Model) {
        let catalog = Catalog::new();
        let table = catalog
            .create_table(
                "message",
                vec![
                    ColumnInfo::new("id", DataType::Int32),
                    ColumnInfo::new("content", DataType::Varchar),
                ],
            )
            .unwrap();
        let mapper = catalog
            .map_class(Mapper::builder("Message", &table).all_columns())
            .unwrap();
        let content = table.get_column("content").unwrap();
        let model = Model::builder(&mapper)
            .flag("has_content", column_flag(content.expr()).build().unwrap())
            .build(&catalog)
            .unwrap();
        (catalog, table, model)
    }

    #[test]
    fn test_insert_load_update() -> Result<()> {
        let (_catalog, table, model) = setup();
        let store = TableStore::new(&table);

        let record = model.create([("id", Value::Int32(1)), ("content", Value::from("hi"))])?;
        let row_id = store.insert(&model, &record)?;
        assert_eq!(store.load(&model, row_id)?, record);

        let mut changed = record.clone();
        model.write(&mut changed, "content", Value::Null)?;
        store.update(&model, row_id, &changed)?;
        let loaded = store.load(&model, row_id)?;
        assert!(!model.get_flag(&loaded, "has_content")?);

        assert!(store.update(&model, RowId(9), &changed).is_err());
        assert!(store.load(&model, RowId(9)).is_err());
        Ok(())
    }

    #[test]
    fn test_filter_and_count() -> Result<()> {
        let (_catalog, table, model) = setup();
        let store = TableStore::new(&table);
        for (id, content) in [(1, Some("a")), (2, None), (3, Some("c"))] {
            let record = model.create([("id", Value::Int32(id)), ("content", content.into())])?;
            store.insert(&model, &record)?;
        }

        let predicate = model.predicate("has_content")?;
        let found: Vec<_> = store
            .filter(&model, &predicate)?
            .into_iter()
            .map(|(_, record)| record.attribute("id").cloned())
            .collect();
        assert_eq!(found, vec![Some(Value::Int32(1)), Some(Value::Int32(3))]);
        assert_eq!(store.count(&!predicate.clone())?, 1);
        assert_eq!(store.count(&Expression::and_(vec![]))?, 3);

        store.delete(RowId(0))?;
        assert_eq!(store.count(&predicate)?, 1);
        assert_eq!(store.len(), 2);
        assert!(store.delete(RowId(0)).is_err());
        Ok(())
    }

    #[test]
    fn test_foreign_columns_rejected() -> Result<()> {
        let (catalog, table, _model) = setup();
        let other = catalog.create_table("other", vec![ColumnInfo::new("x", DataType::Int32)])?;
        let x = other.get_column("x")?;
        let store = TableStore::new(&table);
        assert!(store.count(&x.expr()).is_err());
        Ok(())
    }

    #[test]
    fn test_snapshot_round_trip() -> Result<()> {
        let (_catalog, table, model) = setup();
        let store = TableStore::new(&table);
        let record = model.create([("id", Value::Int32(7)), ("content", Value::from("x"))])?;
        let row_id = store.insert(&model, &record)?;

        let dir = tempdir()?;
        let path = dir.path().join("message.snapshot");
        store.save_to(&path)?;
        let reopened = TableStore::open(&table, &path)?;
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.load(&model, row_id)?, record);

        let other = Table::new("message", vec![ColumnInfo::new("id", DataType::Int32)])?;
        assert!(TableStore::restore(&other, &store.snapshot()?).is_err());
        assert!(TableStore::restore(&table, b"garbage").is_err());
        Ok(())
    }
}
