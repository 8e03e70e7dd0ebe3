use super::ty::Ty;
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};

/// A runtime attribute value.
///
/// Record instances are represented as values so that the bound behaviors on
/// a [`Field`] (append, scan, zero-check) and the soft-delete setters can
/// operate without runtime type introspection. Nullable and optional states
/// are both represented as [`Value::Null`].
///
/// [`Field`]: crate::schema::Field
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Time(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::I64(_) => "I64",
            Value::F64(_) => "F64",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Time(_) => "Time",
        }
    }
}

/// Default value-append behavior: writes the value as a SQL literal.
pub(crate) fn append_default(out: &mut String, value: &Value) {
    use std::fmt::Write;

    match value {
        Value::Null => out.push_str("NULL"),
        Value::Bool(true) => out.push_str("TRUE"),
        Value::Bool(false) => out.push_str("FALSE"),
        Value::I64(v) => {
            let _ = write!(out, "{v}");
        }
        Value::F64(v) => {
            let _ = write!(out, "{v}");
        }
        Value::String(s) => {
            out.push('\'');
            for ch in s.chars() {
                if ch == '\'' {
                    out.push('\'');
                }
                out.push(ch);
            }
            out.push('\'');
        }
        Value::Bytes(b) => {
            out.push_str("X'");
            for byte in b {
                let _ = write!(out, "{byte:02X}");
            }
            out.push('\'');
        }
        Value::Time(t) => {
            let _ = write!(out, "'{}'", t.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        }
    }
}

/// Default zero-check behavior.
///
/// `Null` is zero for every type; otherwise a value is zero when it equals
/// its type's empty/default state. The zero timestamp is the Unix epoch.
pub(crate) fn is_zero_default(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::I64(v) => *v == 0,
        Value::F64(v) => *v == 0.0,
        Value::String(s) => s.is_empty(),
        Value::Bytes(b) => b.is_empty(),
        Value::Time(t) => *t == DateTime::<Utc>::UNIX_EPOCH,
    }
}

/// Default value-scan behavior: converts `src` to the field's static type
/// and assigns it in place.
pub(crate) fn scan_default(ty: &Ty, dest: &mut Value, src: Value) -> Result<()> {
    *dest = coerce(ty, src)?;
    Ok(())
}

fn coerce(ty: &Ty, src: Value) -> Result<Value> {
    if src.is_null() {
        return Ok(Value::Null);
    }

    let conversion_err = |src: &Value| Error::type_conversion(src.kind(), ty.to_string());

    Ok(match ty.indirect() {
        Ty::Bool => match src {
            v @ Value::Bool(_) => v,
            other => return Err(conversion_err(&other)),
        },
        Ty::I64 | Ty::NullI64 => match src {
            v @ Value::I64(_) => v,
            Value::Time(t) => Value::I64(epoch_nanos(&t)),
            other => return Err(conversion_err(&other)),
        },
        Ty::F64 => match src {
            v @ Value::F64(_) => v,
            Value::I64(v) => Value::F64(v as f64),
            other => return Err(conversion_err(&other)),
        },
        Ty::String => match src {
            v @ Value::String(_) => v,
            Value::Time(t) => Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            other => return Err(conversion_err(&other)),
        },
        Ty::Bytes => match src {
            v @ Value::Bytes(_) => v,
            Value::String(s) => Value::Bytes(s.into_bytes()),
            other => return Err(conversion_err(&other)),
        },
        Ty::Time | Ty::NullTime => match src {
            v @ Value::Time(_) => v,
            Value::String(s) => match DateTime::parse_from_rfc3339(&s) {
                Ok(t) => Value::Time(t.with_timezone(&Utc)),
                Err(_) => return Err(conversion_err(&Value::String(s))),
            },
            other => return Err(conversion_err(&other)),
        },
        Ty::Slice(_) | Ty::Struct(_) | Ty::Option(_) => return Err(conversion_err(&src)),
    })
}

/// Nanoseconds since the Unix epoch; saturates outside the representable
/// range (years 1677..=2262).
pub(crate) fn epoch_nanos(t: &DateTime<Utc>) -> i64 {
    t.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_literals() {
        let mut out = String::new();
        append_default(&mut out, &Value::I64(42));
        out.push(',');
        append_default(&mut out, &Value::String("it's".into()));
        out.push(',');
        append_default(&mut out, &Value::Null);
        assert_eq!(out, "42,'it''s',NULL");
    }

    #[test]
    fn zero_checks() {
        assert!(is_zero_default(&Value::Null));
        assert!(is_zero_default(&Value::I64(0)));
        assert!(is_zero_default(&Value::String(String::new())));
        assert!(!is_zero_default(&Value::I64(7)));
        assert!(is_zero_default(&Value::Time(DateTime::<Utc>::UNIX_EPOCH)));
        assert!(!is_zero_default(&Value::Time(Utc::now())));
    }

    #[test]
    fn scan_converts_time_to_integer() {
        let mut dest = Value::Null;
        let now = Utc::now();
        scan_default(&Ty::NullI64, &mut dest, Value::Time(now)).unwrap();
        assert_eq!(dest, Value::I64(epoch_nanos(&now)));
    }

    #[test]
    fn scan_rejects_mismatched_kinds() {
        let mut dest = Value::Null;
        let err = scan_default(&Ty::Bool, &mut dest, Value::String("yes".into())).unwrap_err();
        assert!(err.is_type_conversion());
    }

    #[test]
    fn scan_null_assigns_null() {
        let mut dest = Value::I64(3);
        scan_default(&Ty::I64, &mut dest, Value::Null).unwrap();
        assert!(dest.is_null());
    }
}
