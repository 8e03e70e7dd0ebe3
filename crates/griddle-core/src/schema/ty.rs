use std::fmt;
use std::sync::Arc;

/// Identity of a registered record type.
///
/// Record types are declared explicitly (see [`RecordDesc`]) rather than
/// discovered through runtime introspection, so their identity is the
/// declared type name.
///
/// [`RecordDesc`]: crate::schema::RecordDesc
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

/// The static type of a declared attribute.
///
/// This is the declarative replacement for reflection: a record description
/// names each attribute's shape with a `Ty`, and field discovery, relation
/// resolution, and soft-delete selection all dispatch on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    Bool,
    I64,
    F64,
    String,
    Bytes,
    /// A plain timestamp.
    Time,
    /// A nullable timestamp (SQL NULL when unset).
    NullTime,
    /// A nullable 64-bit integer.
    NullI64,
    /// An optional (pointer-like) wrapper around another type.
    Option(Box<Ty>),
    /// An ordered sequence of another type.
    Slice(Box<Ty>),
    /// A registered record type.
    Struct(TypeKey),
}

impl Ty {
    pub fn option(inner: Ty) -> Ty {
        Ty::Option(Box::new(inner))
    }

    pub fn slice(elem: Ty) -> Ty {
        Ty::Slice(Box::new(elem))
    }

    pub fn strukt(name: impl AsRef<str>) -> Ty {
        Ty::Struct(TypeKey::new(name))
    }

    /// Peels `Option` wrappers off, yielding the base type.
    pub fn indirect(&self) -> &Ty {
        let mut ty = self;
        while let Ty::Option(inner) = ty {
            ty = inner;
        }
        ty
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Ty::Struct(_))
    }

    pub fn as_struct(&self) -> Option<&TypeKey> {
        match self {
            Ty::Struct(key) => Some(key),
            _ => None,
        }
    }

    pub fn as_slice_elem(&self) -> Option<&Ty> {
        match self {
            Ty::Slice(elem) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Bool => f.write_str("bool"),
            Ty::I64 => f.write_str("i64"),
            Ty::F64 => f.write_str("f64"),
            Ty::String => f.write_str("string"),
            Ty::Bytes => f.write_str("bytes"),
            Ty::Time => f.write_str("time"),
            Ty::NullTime => f.write_str("null-time"),
            Ty::NullI64 => f.write_str("null-i64"),
            Ty::Option(inner) => write!(f, "option<{inner}>"),
            Ty::Slice(elem) => write!(f, "slice<{elem}>"),
            Ty::Struct(key) => write!(f, "struct {key}"),
        }
    }
}
