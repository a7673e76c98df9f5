use serde::{Deserialize, Serialize};

/// A decoded value tree node.
///
/// Numbers are carried as `f64` regardless of wire width; 64-bit identifiers
/// that would lose precision are rendered as hex strings by the interpreter
/// instead. Struct nodes hold named [`Field`]s, array nodes hold uniform
/// items tagged with their element type name.
///
/// # Examples
/// ```
/// use opshark_core::Value;
///
/// let value = Value::number(42.0);
/// assert_eq!(value.as_number(), Some(42.0));
/// let json = serde_json::to_value(&value)?;
/// assert_eq!(json["kind"], "number");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Value {
    Number { value: f64 },
    String { value: String },
    Struct { fields: Vec<Field> },
    Array { items: Vec<Value>, element_type: String },
}

impl Value {
    pub fn number(value: f64) -> Self {
        Value::Number { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String {
            value: value.into(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String { value } => Some(value),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&[Field]> {
        match self {
            Value::Struct { fields } => Some(fields),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Looks up a direct child field of a struct node by name.
    ///
    /// # Examples
    /// ```
    /// use opshark_core::{Field, Value};
    ///
    /// let root = Value::Struct {
    ///     fields: vec![Field::new("timestamp", "u32", Value::number(7.0), 0, 4)],
    /// };
    /// assert_eq!(root.field("timestamp").unwrap().value.as_number(), Some(7.0));
    /// assert!(root.field("missing").is_none());
    /// ```
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.as_struct()?.iter().find(|field| field.name == name)
    }
}

/// A named field inside a struct node, with byte-range provenance.
///
/// `offset` is the absolute payload offset the field started at and `size`
/// the number of bytes it consumed, including everything nested under it.
/// `symbol` carries the label an enumerated field's raw value mapped to,
/// when the table knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Declared type tag, e.g. `u32`, `CString`, `Race`, `Stat[]`.
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub value: Value,
    pub offset: usize,
    pub size: usize,
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        value: Value,
        offset: usize,
        size: usize,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            symbol: None,
            value,
            offset,
            size,
        }
    }
}
