pub mod naming;
pub use naming::Inflector;

mod ty;
pub use ty::{Ty, TypeKey};

mod value;
pub use value::Value;

mod tag;
pub use tag::SchemaTag;

mod desc;
pub use desc::{FieldDesc, RecordDesc};

pub mod dialect;
pub use dialect::{Dialect, SqlIdent, StandardDialect};

mod field;
pub use field::{AppendFn, Field, IsZeroFn, ScanFn};

mod soft_delete;
pub use soft_delete::SoftDeleteFn;

mod relation;
pub use relation::{Relation, RelationKind};

mod table;
pub use table::Table;

mod tables;
pub use tables::{Tables, TablesBuilder};
