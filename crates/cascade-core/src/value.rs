//! Typed configuration values and explicit coercions.
//!
//! Storage backends hold [`Value`]s without interpreting them; interpretation
//! happens at read time through the `to_*` coercions. The matrix is
//! deliberately explicit and total per target type:
//!
//! | target | accepted sources                                              |
//! |--------|---------------------------------------------------------------|
//! | bool   | bool; int 0/1; str/bytes `"true"`/`"1"`/`"t"` (and negations) |
//! | int    | int; bool (0/1); float (truncated); str/bytes decimal         |
//! | float  | float; int; str/bytes decimal                                 |
//! | string | str; bool; int; float; time (RFC 3339); bytes (UTF-8)         |
//! | time   | time; int (epoch seconds); str/bytes RFC 3339 or epoch digits |
//! | bytes  | bytes; str                                                    |
//!
//! Everything else fails with [`TypeError`], which callers can tell apart
//! from a missing key.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Error raised when a stored value cannot be coerced to the requested type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The source variant cannot represent the requested type at all.
    #[error("cannot represent {from} value as {to}")]
    Unconvertible {
        /// Variant name of the stored value.
        from: &'static str,
        /// Requested target type.
        to: &'static str,
    },
    /// The source variant was plausible but its content failed to parse.
    #[error("cannot read {value:?} as {to}: {reason}")]
    Parse {
        /// Rendered source value.
        value: String,
        /// Requested target type.
        to: &'static str,
        /// Parser detail.
        reason: String,
    },
}

/// A configuration value as held by a storage engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// UTF-8 text.
    Str(String),
    /// Point in time (UTC).
    Time(DateTime<Utc>),
    /// Raw bytes.
    Bytes(Bytes),
}

impl Value {
    /// Variant name, used in conversion errors and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Time(_) => "time",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Coerces to a boolean.
    ///
    /// # Errors
    ///
    /// Returns a [`TypeError`] for variants or contents outside the matrix.
    pub fn to_bool(&self) -> Result<bool, TypeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Int(n) => Err(TypeError::Parse {
                value: n.to_string(),
                to: "bool",
                reason: "expected 0 or 1".to_string(),
            }),
            Value::Str(s) => parse_bool(s),
            Value::Bytes(b) => parse_bool(utf8(b, "bool")?),
            _ => Err(self.unconvertible("bool")),
        }
    }

    /// Coerces to a signed integer. Floats are truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns a [`TypeError`] for variants or contents outside the matrix.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_int(&self) -> Result<i64, TypeError> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Float(f) => Ok(*f as i64),
            Value::Str(s) => parse_num::<i64>(s, "int"),
            Value::Bytes(b) => parse_num::<i64>(utf8(b, "int")?, "int"),
            Value::Time(_) => Err(self.unconvertible("int")),
        }
    }

    /// Coerces to a float.
    ///
    /// # Errors
    ///
    /// Returns a [`TypeError`] for variants or contents outside the matrix.
    #[allow(clippy::cast_precision_loss)]
    pub fn to_float(&self) -> Result<f64, TypeError> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            Value::Str(s) => parse_num::<f64>(s, "float"),
            Value::Bytes(b) => parse_num::<f64>(utf8(b, "float")?, "float"),
            _ => Err(self.unconvertible("float")),
        }
    }

    /// Coerces to owned text. Times render as RFC 3339.
    ///
    /// # Errors
    ///
    /// Returns a [`TypeError`] when the value is a non-UTF-8 byte string.
    pub fn to_str(&self) -> Result<String, TypeError> {
        match self {
            Value::Str(s) => Ok(s.clone()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Time(t) => Ok(t.to_rfc3339()),
            Value::Bytes(b) => Ok(utf8(b, "string")?.to_string()),
        }
    }

    /// Coerces to a UTC timestamp. Integers count epoch seconds; text is
    /// parsed as RFC 3339 first and as epoch seconds second.
    ///
    /// # Errors
    ///
    /// Returns a [`TypeError`] for variants or contents outside the matrix.
    pub fn to_time(&self) -> Result<DateTime<Utc>, TypeError> {
        match self {
            Value::Time(t) => Ok(*t),
            Value::Int(secs) => epoch_secs(*secs),
            Value::Str(s) => parse_time(s),
            Value::Bytes(b) => parse_time(utf8(b, "time")?),
            _ => Err(self.unconvertible("time")),
        }
    }

    /// Coerces to raw bytes. Text converts to its UTF-8 encoding; other
    /// variants do not convert.
    ///
    /// # Errors
    ///
    /// Returns a [`TypeError`] for non-text, non-byte variants.
    pub fn to_bytes(&self) -> Result<Bytes, TypeError> {
        match self {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Str(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
            _ => Err(self.unconvertible("bytes")),
        }
    }

    fn unconvertible(&self, to: &'static str) -> TypeError {
        TypeError::Unconvertible {
            from: self.kind(),
            to,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Time(t) => f.write_str(&t.to_rfc3339()),
            Value::Bytes(b) => write!(f, "bytes({})", b.len()),
        }
    }
}

fn parse_bool(s: &str) -> Result<bool, TypeError> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(TypeError::Parse {
            value: other.to_string(),
            to: "bool",
            reason: "unrecognized boolean literal".to_string(),
        }),
    }
}

fn parse_num<T>(s: &str, to: &'static str) -> Result<T, TypeError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    s.parse().map_err(|e: T::Err| TypeError::Parse {
        value: s.to_string(),
        to,
        reason: e.to_string(),
    })
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, TypeError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(t) => Ok(t.with_timezone(&Utc)),
        Err(rfc_err) => match s.parse::<i64>() {
            Ok(secs) => epoch_secs(secs),
            Err(_) => Err(TypeError::Parse {
                value: s.to_string(),
                to: "time",
                reason: rfc_err.to_string(),
            }),
        },
    }
}

fn epoch_secs(secs: i64) -> Result<DateTime<Utc>, TypeError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| TypeError::Parse {
        value: secs.to_string(),
        to: "time",
        reason: "epoch seconds out of range".to_string(),
    })
}

fn utf8<'a>(bytes: &'a Bytes, to: &'static str) -> Result<&'a str, TypeError> {
    std::str::from_utf8(bytes).map_err(|e| TypeError::Parse {
        value: format!("bytes({})", bytes.len()),
        to,
        reason: e.to_string(),
    })
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(v))
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(Bytes::copy_from_slice(v))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
