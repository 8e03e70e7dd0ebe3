use super::field::Field;
use super::ty::Ty;
use std::fmt;

/// SQL type names used by the default discovery rules.
pub mod sqltype {
    pub const BOOLEAN: &str = "BOOLEAN";
    pub const BIGINT: &str = "BIGINT";
    pub const DOUBLE_PRECISION: &str = "DOUBLE PRECISION";
    pub const VARCHAR: &str = "VARCHAR";
    pub const BLOB: &str = "BLOB";
    pub const TIMESTAMPTZ: &str = "TIMESTAMPTZ";
}

/// Infers a SQL type from a static type.
pub fn detect(ty: &Ty) -> &'static str {
    match ty.indirect() {
        Ty::Bool => sqltype::BOOLEAN,
        Ty::I64 | Ty::NullI64 => sqltype::BIGINT,
        Ty::F64 => sqltype::DOUBLE_PRECISION,
        Ty::String => sqltype::VARCHAR,
        Ty::Bytes => sqltype::BLOB,
        Ty::Time | Ty::NullTime => sqltype::TIMESTAMPTZ,
        Ty::Slice(_) | Ty::Struct(_) | Ty::Option(_) => sqltype::VARCHAR,
    }
}

/// A quoted SQL identifier, safe to splice into generated SQL.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct SqlIdent(String);

impl SqlIdent {
    pub(crate) fn raw(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SqlIdent({})", self.0)
    }
}

/// The per-type-system hook a table registry is parameterized with:
/// identifier quoting, SQL type discovery, and a once-per-field
/// customization callback.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    /// Appends `name` to `out` as a quoted identifier.
    fn append_ident(&self, out: &mut String, name: &str) {
        out.push('"');
        for ch in name.chars() {
            if ch == '"' {
                out.push('"');
            }
            out.push(ch);
        }
        out.push('"');
    }

    /// Discovers the SQL type for a static type.
    fn detect_sql_type(&self, ty: &Ty) -> String {
        detect(ty).to_string()
    }

    /// Invoked once per field during construction; may adjust the field's
    /// creation SQL type or rebind its value-conversion behaviors.
    fn on_field(&self, _field: &mut Field) {}
}

/// Quotes an identifier through the dialect. Empty names stay empty.
pub(crate) fn quote_ident(dialect: &dyn Dialect, name: &str) -> SqlIdent {
    if name.is_empty() {
        return SqlIdent::default();
    }
    let mut out = String::with_capacity(name.len() + 2);
    dialect.append_ident(&mut out, name);
    SqlIdent::raw(out)
}

/// Quotes a table name unless it contains a placeholder or parentheses, in
/// which case it is taken as a ready-made SQL expression.
pub(crate) fn quote_table_name(dialect: &dyn Dialect, name: &str) -> SqlIdent {
    if name.contains(['?', '(', ')']) {
        return SqlIdent::raw(name.to_string());
    }
    quote_ident(dialect, name)
}

/// The stock double-quoting dialect with default type discovery.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDialect;

impl Dialect for StandardDialect {
    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quotes() {
        let ident = quote_ident(&StandardDialect, r#"we"ird"#);
        assert_eq!(ident.as_str(), r#""we""ird""#);
    }

    #[test]
    fn expression_table_names_pass_through() {
        let ident = quote_table_name(&StandardDialect, "generate_series(0, 100)");
        assert_eq!(ident.as_str(), "generate_series(0, 100)");

        let ident = quote_table_name(&StandardDialect, "books");
        assert_eq!(ident.as_str(), "\"books\"");
    }

    #[test]
    fn detect_maps_base_types() {
        assert_eq!(detect(&Ty::I64), sqltype::BIGINT);
        assert_eq!(detect(&Ty::option(Ty::Time)), sqltype::TIMESTAMPTZ);
        assert_eq!(detect(&Ty::NullI64), sqltype::BIGINT);
        assert_eq!(detect(&Ty::String), sqltype::VARCHAR);
    }
}
