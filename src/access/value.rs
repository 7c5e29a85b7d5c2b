use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use std::fmt;

/// Declared column types
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean = 1,
    Int32 = 2,
    Varchar = 4,
    Timestamp = 8,
}

impl DataType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(DataType::Boolean),
            2 => Ok(DataType::Int32),
            4 => Ok(DataType::Varchar),
            8 => Ok(DataType::Timestamp),
            _ => bail!("Unknown data type: {}", value),
        }
    }
}

/// Values flowing through expressions and stored rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Literal or evaluated IN-list; never stored.
    List(Vec<Value>),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null | Value::List(_) => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::String(_) => Some(DataType::Varchar),
            Value::Timestamp(_) => Some(DataType::Timestamp),
        }
    }

    /// Check if this value is compatible with the given data type
    pub fn is_compatible_with(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true, // NULL is compatible with any type
            (Value::Boolean(_), DataType::Boolean) => true,
            (Value::Int32(_), DataType::Int32) => true,
            (Value::String(_), DataType::Varchar) => true,
            (Value::Timestamp(_), DataType::Timestamp) => true,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness as used by the flag evaluator: NULL, false, 0, empty
    /// strings and empty lists are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Int32(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            Value::Timestamp(_) => true,
            Value::List(items) => !items.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    /// Renders the value as an SQL literal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Timestamp(ts) => write!(f, "'{}'", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Serialize values according to schema
pub fn serialize_values(values: &[Value], schema: &[DataType]) -> Result<Vec<u8>> {
    if values.len() != schema.len() {
        bail!(
            "Value count {} doesn't match schema length {}",
            values.len(),
            schema.len()
        );
    }

    let mut data = Vec::new();

    // NULL bitmap (1 bit per column, rounded up to bytes)
    let null_bitmap_size = schema.len().div_ceil(8);
    let mut null_bitmap = vec![0u8; null_bitmap_size];

    for (i, (value, expected_type)) in values.iter().zip(schema.iter()).enumerate() {
        match value {
            Value::Null => {
                null_bitmap[i / 8] |= 1 << (i % 8);
            }
            _ => {
                if !value.is_compatible_with(*expected_type) {
                    bail!(
                        "Value {:?} is not compatible with type {:?}",
                        value,
                        expected_type
                    );
                }
            }
        }
    }

    data.extend_from_slice(&null_bitmap);

    for (value, data_type) in values.iter().zip(schema.iter()) {
        match (value, data_type) {
            (Value::Null, _) => {}
            (Value::Boolean(b), DataType::Boolean) => {
                data.push(if *b { 1 } else { 0 });
            }
            (Value::Int32(i), DataType::Int32) => {
                data.extend_from_slice(&i.to_le_bytes());
            }
            (Value::String(s), DataType::Varchar) => {
                let bytes = s.as_bytes();
                data.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                data.extend_from_slice(bytes);
            }
            (Value::Timestamp(ts), DataType::Timestamp) => {
                let Some(nanos) = ts.timestamp_nanos_opt() else {
                    bail!("Timestamp {} cannot be stored with nanosecond precision", ts);
                };
                data.extend_from_slice(&nanos.to_le_bytes());
            }
            _ => unreachable!("Type compatibility already checked"),
        }
    }

    Ok(data)
}

/// Deserialize bytes according to schema
pub fn deserialize_values(data: &[u8], schema: &[DataType]) -> Result<Vec<Value>> {
    if schema.is_empty() {
        return Ok(vec![]);
    }

    let null_bitmap_size = schema.len().div_ceil(8);
    if data.len() < null_bitmap_size {
        bail!("Data too short for NULL bitmap");
    }

    let null_bitmap = &data[..null_bitmap_size];
    let mut offset = null_bitmap_size;
    let mut values = Vec::with_capacity(schema.len());

    for (i, data_type) in schema.iter().enumerate() {
        let is_null = (null_bitmap[i / 8] & (1 << (i % 8))) != 0;
        if is_null {
            values.push(Value::Null);
            continue;
        }

        match data_type {
            DataType::Boolean => {
                if offset >= data.len() {
                    bail!("Invalid boolean value: no data");
                }
                values.push(Value::Boolean(data[offset] != 0));
                offset += 1;
            }
            DataType::Int32 => {
                let bytes = read_array::<4>(data, offset, "int32")?;
                values.push(Value::Int32(i32::from_le_bytes(bytes)));
                offset += 4;
            }
            DataType::Varchar => {
                let len = u32::from_le_bytes(read_array::<4>(data, offset, "string length")?)
                    as usize;
                offset += 4;

                if offset + len > data.len() {
                    bail!("Invalid string value: string too long");
                }
                let s = String::from_utf8(data[offset..offset + len].to_vec())?;
                values.push(Value::String(s));
                offset += len;
            }
            DataType::Timestamp => {
                let nanos = i64::from_le_bytes(read_array::<8>(data, offset, "timestamp")?);
                values.push(Value::Timestamp(DateTime::<Utc>::from_timestamp_nanos(nanos)));
                offset += 8;
            }
        }
    }

    Ok(values)
}

fn read_array<const N: usize>(data: &[u8], offset: usize, what: &str) -> Result<[u8; N]> {
    match data.get(offset..offset + N) {
        Some(slice) => {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(slice);
            Ok(bytes)
        }
        None => bail!("Invalid {} value: not enough data", what),
    }
}
