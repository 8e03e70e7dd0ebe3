use super::ty::{Ty, TypeKey};

/// A declarative record type description.
///
/// This is the startup-time replacement for runtime type introspection: the
/// host program declares each record type's attributes (name, static type,
/// schema tag) explicitly and registers the description with a [`Tables`]
/// registry, which builds the [`Table`] metadata from it on first reference.
///
/// [`Tables`]: crate::schema::Tables
/// [`Table`]: crate::schema::Table
#[derive(Debug, Clone)]
pub struct RecordDesc {
    /// Declared type name; also the record's registry identity.
    pub name: String,

    /// Identity anchor tag: overrides the table's name, alias, and
    /// select-name (`_` as the name clears it).
    pub identity: Option<String>,

    /// Declared attributes, in order.
    pub fields: Vec<FieldDesc>,
}

/// A declared attribute.
#[derive(Debug, Clone)]
pub struct FieldDesc {
    /// Attribute name, e.g. `AuthorID`.
    pub name: String,

    /// Static type.
    pub ty: Ty,

    /// Schema tag, parsed with [`SchemaTag`].
    ///
    /// [`SchemaTag`]: crate::schema::SchemaTag
    pub tag: String,

    /// True for embedded attributes: the attribute's record type contributes
    /// its fields as if they were declared directly on the owner.
    pub embedded: bool,
}

impl RecordDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: None,
            fields: Vec::new(),
        }
    }

    /// Declares the table identity anchor tag.
    pub fn with_identity(mut self, tag: impl Into<String>) -> Self {
        self.identity = Some(tag.into());
        self
    }

    /// Declares an attribute.
    pub fn field(mut self, name: impl Into<String>, ty: Ty, tag: impl Into<String>) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            ty,
            tag: tag.into(),
            embedded: false,
        });
        self
    }

    /// Declares an embedded attribute whose fields are flattened into this
    /// record.
    pub fn embed(mut self, name: impl Into<String>, ty: Ty, tag: impl Into<String>) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            ty,
            tag: tag.into(),
            embedded: true,
        });
        self
    }

    pub fn key(&self) -> TypeKey {
        TypeKey::new(&self.name)
    }
}
