use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DbError;

/// Name of the synthetic identity column every table starts with.
pub const ID_COLUMN: &str = "ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Str,
    Bool,
}

impl ColumnType {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "int" => Some(ColumnType::Int),
            "str" => Some(ColumnType::Str),
            "bool" => Some(ColumnType::Bool),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Str => "str",
            ColumnType::Bool => "bool",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored field value. Serialized as the bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Value {
    pub fn kind(&self) -> ColumnType {
        match self {
            Value::Int(_) => ColumnType::Int,
            Value::Str(_) => ColumnType::Str,
            Value::Bool(_) => ColumnType::Bool,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Strips one pair of matching `"` or `'` around `token`. Mismatched or
/// lone quotes are left alone.
pub fn strip_matching_quotes(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &token[1..token.len() - 1];
        }
    }
    token
}

/// A typed column. Persisted in the registry as `"name:type"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Column {
    pub name: String,
    pub col_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
        }
    }

    pub fn id() -> Self {
        Self::new(ID_COLUMN, ColumnType::Int)
    }

    /// Parses a `name:type` definition, splitting on the first `:`.
    pub fn parse_spec(spec: &str) -> Result<Self, DbError> {
        let (name, ty) = spec
            .split_once(':')
            .ok_or_else(|| DbError::InvalidColumnSpec(spec.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DbError::InvalidColumnSpec(spec.to_string()));
        }
        let ty = ty.trim();
        let col_type = ColumnType::parse(ty).ok_or_else(|| DbError::InvalidType(ty.to_string()))?;
        Ok(Self::new(name, col_type))
    }

    /// Converts a raw user token into a value of this column's type.
    pub fn coerce(&self, raw: &str) -> Result<Value, DbError> {
        let parse_error = || DbError::ParseError {
            value: raw.to_string(),
            expected: self.col_type,
        };
        match self.col_type {
            ColumnType::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| parse_error()),
            ColumnType::Bool => {
                let token = raw.trim();
                if token.eq_ignore_ascii_case("true") {
                    Ok(Value::Bool(true))
                } else if token.eq_ignore_ascii_case("false") {
                    Ok(Value::Bool(false))
                } else {
                    Err(parse_error())
                }
            }
            ColumnType::Str => Ok(Value::Str(strip_matching_quotes(raw).to_string())),
        }
    }

    /// Exact-kind check of a value against the declared type.
    pub fn check(&self, value: &Value) -> Result<(), DbError> {
        if value.kind() == self.col_type {
            Ok(())
        } else {
            Err(DbError::TypeMismatch {
                column: self.name.clone(),
                expected: self.col_type,
                actual: value.kind(),
            })
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.col_type)
    }
}

impl From<Column> for String {
    fn from(column: Column) -> Self {
        column.to_string()
    }
}

impl TryFrom<String> for Column {
    type Error = DbError;

    fn try_from(spec: String) -> Result<Self, Self::Error> {
        Column::parse_spec(&spec)
    }
}

/// One record: column name to value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Overwrites the column if present, appends it otherwise.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        let column = column.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.set(column, value);
        self
    }

    pub fn id(&self) -> Option<i64> {
        match self.get(ID_COLUMN) {
            Some(Value::Int(id)) => Some(*id),
            _ => None,
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ordered_map::serialize(&self.fields, serializer)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ordered_map::deserialize(deserializer).map(|fields| Row { fields })
    }
}

/// (De)serializes `Vec<(String, V)>` as a JSON object keeping key order.
pub(crate) mod ordered_map {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_map(entries.iter().map(|(key, value)| (key, value)))
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}
