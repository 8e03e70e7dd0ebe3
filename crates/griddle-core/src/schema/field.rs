use super::dialect::SqlIdent;
use super::tag::SchemaTag;
use super::ty::Ty;
use super::value::{self, Value};
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// Bound value-append behavior: writes a value as a SQL literal.
pub type AppendFn = Arc<dyn Fn(&mut String, &Value) + Send + Sync>;

/// Bound value-scan behavior: converts a source value to the field's static
/// type and assigns it in place.
pub type ScanFn = Arc<dyn Fn(&mut Value, Value) -> Result<()> + Send + Sync>;

/// Bound zero-check behavior.
pub type IsZeroFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Per-column metadata for one mapped attribute.
#[derive(Clone)]
pub struct Field {
    /// Resolved column name.
    pub name: String,

    /// Quoted form of [`name`](Field::name).
    pub sql_name: SqlIdent,

    /// The original declared attribute name.
    pub attr_name: String,

    /// Dereferenced base type of the attribute.
    pub ty: Ty,

    /// Ordered access-path steps from the record root to the attribute.
    /// Assigned once at discovery; a clone created during inlining gets its
    /// parent's path prepended.
    pub index: Vec<usize>,

    /// The parsed schema tag the field was declared with.
    pub tag: SchemaTag,

    pub is_pk: bool,
    pub auto_increment: bool,
    pub not_null: bool,
    pub null_zero: bool,

    /// Default SQL expression, passed through opaquely.
    pub sql_default: Option<String>,

    /// Referential actions, passed through opaquely.
    pub on_delete: Option<String>,
    pub on_update: Option<String>,

    /// Explicit SQL type override from the tag.
    pub user_sql_type: Option<String>,

    /// SQL type discovered from the static type.
    pub discovered_sql_type: String,

    /// SQL type to use when generating the table; set by the dialect hook,
    /// falls back to [`sql_type`](Field::sql_type).
    pub create_table_sql_type: Option<String>,

    pub append: AppendFn,
    pub scan: ScanFn,
    pub is_zero: IsZeroFn,
}

impl Field {
    /// The effective SQL type: the explicit override if any, otherwise the
    /// discovered type.
    pub fn sql_type(&self) -> &str {
        self.user_sql_type
            .as_deref()
            .unwrap_or(&self.discovered_sql_type)
    }

    /// The SQL type used if a table is generated for this field.
    pub fn create_sql_type(&self) -> &str {
        self.create_table_sql_type
            .as_deref()
            .unwrap_or_else(|| self.sql_type())
    }

    pub(crate) fn mark_as_pk(&mut self) {
        self.is_pk = true;
    }

    /// Scans `src` into `dest` through the bound conversion, surfacing any
    /// conversion failure.
    pub fn scan_with_check(&self, dest: &mut Value, src: Value) -> Result<()> {
        (self.scan)(dest, src)
    }

    /// Clones this field for inlining under `parent`, prefixing names with
    /// the parent's and prepending the parent's access path. The clone is an
    /// independent copy; mutating it never aliases the original.
    pub(crate) fn clone_for_inline(
        &self,
        parent: &Field,
        quote: impl FnOnce(&str) -> SqlIdent,
    ) -> Field {
        let mut clone = self.clone();
        clone.attr_name = format!("{}_{}", parent.attr_name, self.attr_name);
        clone.name = format!("{}__{}", parent.name, self.name);
        clone.sql_name = quote(&clone.name);
        let mut index = Vec::with_capacity(parent.index.len() + self.index.len());
        index.extend_from_slice(&parent.index);
        index.extend_from_slice(&self.index);
        clone.index = index;
        clone
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("attr_name", &self.attr_name)
            .field("ty", &self.ty)
            .field("index", &self.index)
            .field("is_pk", &self.is_pk)
            .field("auto_increment", &self.auto_increment)
            .field("not_null", &self.not_null)
            .field("null_zero", &self.null_zero)
            .finish_non_exhaustive()
    }
}

/// Default append binding.
pub(crate) fn bind_append(_ty: &Ty) -> AppendFn {
    Arc::new(value::append_default)
}

/// Default scan binding for the given static type.
pub(crate) fn bind_scan(ty: &Ty) -> ScanFn {
    let ty = ty.clone();
    Arc::new(move |dest, src| value::scan_default(&ty, dest, src))
}

/// Default zero-check binding.
pub(crate) fn bind_is_zero(_ty: &Ty) -> IsZeroFn {
    Arc::new(value::is_zero_default)
}
