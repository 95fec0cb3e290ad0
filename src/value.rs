//! Typed argument values.

use std::fmt;

use crate::error::CommandError;

/// Declared type of an argument. List element types are fixed per argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Int,
    Float,
    Bool,
    StringList,
    IntList,
    FloatList,
    BoolList,
}

/// One typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StringList(Vec<String>),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    BoolList(Vec<bool>),
}

impl ValueType {
    /// Whether values of this type hold a list.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            ValueType::StringList | ValueType::IntList | ValueType::FloatList | ValueType::BoolList
        )
    }

    /// The list type with this type's element kind.
    pub fn list_of(self) -> ValueType {
        match self {
            ValueType::String | ValueType::StringList => ValueType::StringList,
            ValueType::Int | ValueType::IntList => ValueType::IntList,
            ValueType::Float | ValueType::FloatList => ValueType::FloatList,
            ValueType::Bool | ValueType::BoolList => ValueType::BoolList,
        }
    }

    /// Human-readable element kind, used in conversion errors.
    pub fn kind(self) -> &'static str {
        match self {
            ValueType::String | ValueType::StringList => "string",
            ValueType::Int | ValueType::IntList => "int",
            ValueType::Float | ValueType::FloatList => "float",
            ValueType::Bool | ValueType::BoolList => "bool",
        }
    }

    /// Convert raw tokens into a value of this type.
    ///
    /// Scalars take exactly the first token; an empty token list only converts
    /// for list types. The first token that fails to parse aborts the whole
    /// conversion.
    pub fn parse(self, tokens: &[String]) -> Result<Value, CommandError> {
        if !self.is_list() {
            let Some(token) = tokens.first() else {
                return Err(CommandError::Conversion {
                    token: String::new(),
                    kind: self.kind(),
                    message: "no value provided".to_string(),
                });
            };
            return self.parse_one(token);
        }

        let mut value = self.empty();
        for token in tokens {
            value = value.append(self.parse_one(token)?)?;
        }
        Ok(value)
    }

    fn parse_one(self, token: &str) -> Result<Value, CommandError> {
        let failed = |message: String| CommandError::Conversion {
            token: token.to_string(),
            kind: self.kind(),
            message,
        };
        match self {
            ValueType::String | ValueType::StringList => Ok(Value::String(token.to_string())),
            ValueType::Int | ValueType::IntList => token
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| failed(e.to_string())),
            ValueType::Float | ValueType::FloatList => token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| failed(e.to_string())),
            ValueType::Bool | ValueType::BoolList => parse_bool(token)
                .map(Value::Bool)
                .ok_or_else(|| failed("invalid syntax".to_string())),
        }
    }

    fn empty(self) -> Value {
        match self.list_of() {
            ValueType::IntList => Value::IntList(Vec::new()),
            ValueType::FloatList => Value::FloatList(Vec::new()),
            ValueType::BoolList => Value::BoolList(Vec::new()),
            _ => Value::StringList(Vec::new()),
        }
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    match token {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

impl Value {
    /// The declared type this value satisfies.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
            Value::StringList(_) => ValueType::StringList,
            Value::IntList(_) => ValueType::IntList,
            Value::FloatList(_) => ValueType::FloatList,
            Value::BoolList(_) => ValueType::BoolList,
        }
    }

    /// Number of elements for lists, 1 for scalars.
    pub fn len(&self) -> usize {
        match self {
            Value::StringList(v) => v.len(),
            Value::IntList(v) => v.len(),
            Value::FloatList(v) => v.len(),
            Value::BoolList(v) => v.len(),
            _ => 1,
        }
    }

    /// True only for empty lists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wrap a scalar into a one-element list; lists are returned unchanged.
    pub fn into_list(self) -> Value {
        match self {
            Value::String(s) => Value::StringList(vec![s]),
            Value::Int(i) => Value::IntList(vec![i]),
            Value::Float(f) => Value::FloatList(vec![f]),
            Value::Bool(b) => Value::BoolList(vec![b]),
            list => list,
        }
    }

    /// Append a scalar or a list of the same element kind.
    pub fn append(self, other: Value) -> Result<Value, CommandError> {
        let (want, got) = (self.value_type().list_of(), other.value_type().list_of());
        match (self.into_list(), other.into_list()) {
            (Value::StringList(mut a), Value::StringList(b)) => {
                a.extend(b);
                Ok(Value::StringList(a))
            }
            (Value::IntList(mut a), Value::IntList(b)) => {
                a.extend(b);
                Ok(Value::IntList(a))
            }
            (Value::FloatList(mut a), Value::FloatList(b)) => {
                a.extend(b);
                Ok(Value::FloatList(a))
            }
            (Value::BoolList(mut a), Value::BoolList(b)) => {
                a.extend(b);
                Ok(Value::BoolList(a))
            }
            _ => Err(CommandError::Execution(format!(
                "cannot append {} value to {} value",
                got.kind(),
                want.kind()
            ))),
        }
    }

    /// Render the value back into command-line tokens.
    pub fn to_tokens(&self) -> Vec<String> {
        match self {
            Value::String(s) => vec![s.clone()],
            Value::Int(i) => vec![i.to_string()],
            Value::Float(f) => vec![f.to_string()],
            Value::Bool(b) => vec![b.to_string()],
            Value::StringList(v) => v.clone(),
            Value::IntList(v) => v.iter().map(i64::to_string).collect(),
            Value::FloatList(v) => v.iter().map(f64::to_string).collect(),
            Value::BoolList(v) => v.iter().map(bool::to_string).collect(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Int(_) | Value::Float(_) | Value::Bool(_) => {
                write!(f, "{}", self.to_tokens().join(""))
            }
            _ => write!(f, "[{}]", self.to_tokens().join(" ")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringList(v)
    }
}

impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::StringList(v.into_iter().map(String::from).collect())
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntList(v)
    }
}
