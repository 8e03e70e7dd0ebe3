use super::field::Field;
use super::naming;
use super::table::Table;
use super::tables::Tables;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    HasOne,
    BelongsTo,
    HasMany,
    ManyToMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationKind::HasOne => "has-one",
            RelationKind::BelongsTo => "belongs-to",
            RelationKind::HasMany => "has-many",
            RelationKind::ManyToMany => "many-to-many",
        })
    }
}

/// A resolved relation between two tables.
///
/// `base_fields` and `join_fields` are parallel lists pairing columns on the
/// owning (base) side with columns on the related (join) side. For
/// many-to-many relations the junction table and its two pairings are carried
/// in the `m2m_*` fields, and `base_fields`/`join_fields` hold the endpoint
/// tables' primary keys.
pub struct Relation {
    pub kind: RelationKind,

    /// The attribute the relation was declared on. Removed from the owning
    /// table's column list once resolved.
    pub field: Arc<Field>,

    pub join_table: Arc<Table>,
    pub base_fields: Vec<Arc<Field>>,
    pub join_fields: Vec<Arc<Field>>,

    pub m2m_table: Option<Arc<Table>>,
    pub m2m_base_fields: Vec<Arc<Field>>,
    pub m2m_join_fields: Vec<Arc<Field>>,

    /// For polymorphic has-many: the join-side discriminator column and the
    /// value that selects rows belonging to the base table.
    pub polymorphic_field: Option<Arc<Field>>,
    pub polymorphic_value: Option<String>,
}

impl Relation {
    fn new(kind: RelationKind, field: Arc<Field>, join_table: Arc<Table>) -> Relation {
        Relation {
            kind,
            field,
            join_table,
            base_fields: Vec::new(),
            join_fields: Vec::new(),
            m2m_table: None,
            m2m_base_fields: Vec::new(),
            m2m_join_fields: Vec::new(),
            polymorphic_field: None,
            polymorphic_value: None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.field.attr_name)
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("kind", &self.kind)
            .field("field", &self.field.attr_name)
            .field("join_table", &self.join_table.type_name)
            .field("base_fields", &self.base_fields)
            .field("join_fields", &self.join_fields)
            .finish_non_exhaustive()
    }
}

/// Inspects a field's tag and, if it declares a relation, runs the matching
/// resolution algorithm. Fields without a relation tag resolve to `None`.
pub(crate) fn resolve(
    tables: &Tables,
    table: &Arc<Table>,
    field: &Arc<Field>,
) -> Result<Option<Relation>> {
    if let Some(kind) = field.tag.option("rel") {
        let rel = match kind {
            "has-one" => has_one(tables, table, field)?,
            "belongs-to" => belongs_to(tables, table, field)?,
            "has-many" => has_many(tables, table, field)?,
            other => {
                return Err(Error::invalid_schema(format!(
                    "{}.{} has unknown relation={other}",
                    table.type_name, field.attr_name,
                )));
            }
        };
        return Ok(Some(rel));
    }
    if field.tag.has_option("m2m") {
        return Ok(Some(m2m(tables, table, field)?));
    }
    if field.tag.has_option("join") {
        tracing::warn!(
            "{}.{} option \"join\" requires a relation type",
            table.type_name,
            field.attr_name,
        );
    }
    Ok(None)
}

/// The foreign key lives on the base table and points at the related table's
/// primary keys. By convention the FK column is `<attr>_<pk>`, falling back
/// to the bare pk name.
pub(crate) fn has_one(tables: &Tables, base: &Arc<Table>, field: &Arc<Field>) -> Result<Relation> {
    let join_table = struct_target(tables, base, field, RelationKind::HasOne)?;

    if let Err(err) = join_table.check_pks() {
        return Err(Error::invalid_schema(format!(
            "{} has-one {}: {err}",
            base.type_name, field.attr_name,
        )));
    }

    let mut rel = Relation::new(RelationKind::HasOne, field.clone(), join_table.clone());

    if let Some(join) = field.tag.option("join") {
        let (base_columns, join_columns) = parse_relation_join(join)?;
        for (base_column, join_column) in base_columns.iter().zip(&join_columns) {
            let Some(f) = base.lookup_field(base_column) else {
                return Err(Error::invalid_schema(format!(
                    "{} has-one {}: {} must have column {}",
                    base.type_name, field.attr_name, base.type_name, base_column,
                )));
            };
            rel.base_fields.push(f);

            let Some(f) = join_table.lookup_field(join_column) else {
                return Err(Error::invalid_schema(format!(
                    "{} has-one {}: {} must have column {}",
                    base.type_name, field.attr_name, join_table.type_name, join_column,
                )));
            };
            rel.join_fields.push(f);
        }
        return Ok(rel);
    }

    let join_pks = join_table.pks();
    rel.join_fields = join_pks.clone();

    let fk_prefix = format!("{}_", naming::underscore(&field.attr_name));
    for join_pk in &join_pks {
        let fk_name = format!("{fk_prefix}{}", join_pk.name);
        if let Some(f) = base.lookup_field(&fk_name) {
            rel.base_fields.push(f);
            continue;
        }
        if let Some(f) = base.lookup_field(&join_pk.name) {
            rel.base_fields.push(f);
            continue;
        }
        return Err(Error::invalid_schema(format!(
            "{} has-one {}: {} must have column {} (to override, use join:base_column=join_column tag on {}.{} field)",
            base.type_name,
            field.attr_name,
            base.type_name,
            fk_name,
            base.type_name,
            field.attr_name,
        )));
    }
    Ok(rel)
}

/// The foreign key lives on the related (join) table and points back at the
/// base table's primary keys. The conventional FK column is
/// `<base_model>_<pk>`, falling back to the bare pk name.
fn belongs_to(tables: &Tables, base: &Arc<Table>, field: &Arc<Field>) -> Result<Relation> {
    let join_table = struct_target(tables, base, field, RelationKind::BelongsTo)?;

    if let Err(err) = base.check_pks() {
        return Err(Error::invalid_schema(format!(
            "{} belongs-to {}: {err}",
            base.type_name, field.attr_name,
        )));
    }

    let mut rel = Relation::new(RelationKind::BelongsTo, field.clone(), join_table.clone());

    if let Some(join) = field.tag.option("join") {
        let (base_columns, join_columns) = parse_relation_join(join)?;
        for (base_column, join_column) in base_columns.iter().zip(&join_columns) {
            let Some(f) = base.lookup_field(base_column) else {
                return Err(Error::invalid_schema(format!(
                    "{} belongs-to {}: {} must have column {}",
                    base.type_name, field.attr_name, base.type_name, base_column,
                )));
            };
            rel.base_fields.push(f);

            let Some(f) = join_table.lookup_field(join_column) else {
                return Err(Error::invalid_schema(format!(
                    "{} belongs-to {}: {} must have column {}",
                    base.type_name, field.attr_name, join_table.type_name, join_column,
                )));
            };
            rel.join_fields.push(f);
        }
        return Ok(rel);
    }

    let base_pks = base.pks();
    rel.base_fields = base_pks.clone();

    let fk_prefix = format!("{}_", base.model_name);
    for base_pk in &base_pks {
        let fk_name = format!("{fk_prefix}{}", base_pk.name);
        if let Some(f) = join_table.lookup_field(&fk_name) {
            rel.join_fields.push(f);
            continue;
        }
        if let Some(f) = join_table.lookup_field(&base_pk.name) {
            rel.join_fields.push(f);
            continue;
        }
        return Err(Error::invalid_schema(format!(
            "{} belongs-to {}: {} must have column {} (to override, use join:base_column=join_column tag on {}.{} field)",
            base.type_name,
            field.attr_name,
            join_table.type_name,
            fk_name,
            base.type_name,
            field.attr_name,
        )));
    }
    Ok(rel)
}

/// One base row owns many join rows; the FK lives on the join table. Supports
/// a polymorphic discriminator column on the join side, either declared as
/// the `type` pseudo-column in an explicit join list or defaulting to
/// `<base_model>_type`.
fn has_many(tables: &Tables, base: &Arc<Table>, field: &Arc<Field>) -> Result<Relation> {
    if let Err(err) = base.check_pks() {
        return Err(Error::invalid_schema(format!(
            "{} has-many {}: {err}",
            base.type_name, field.attr_name,
        )));
    }

    let join_table = slice_target(tables, base, field, RelationKind::HasMany)?;

    let is_polymorphic = field.tag.has_option("polymorphic");
    let mut polymorphic_value = field
        .tag
        .option("polymorphic")
        .unwrap_or_default()
        .to_string();
    let mut polymorphic_column = String::new();

    let mut rel = Relation::new(RelationKind::HasMany, field.clone(), join_table.clone());

    if let Some(join) = field.tag.option("join") {
        let (base_columns, join_columns) = parse_relation_join(join)?;
        for (base_column, join_column) in base_columns.iter().zip(&join_columns) {
            if is_polymorphic && base_column.as_str() == "type" {
                polymorphic_column = join_column.clone();
                continue;
            }

            let Some(f) = base.lookup_field(base_column) else {
                return Err(Error::invalid_schema(format!(
                    "{} has-many {}: {} must have column {}",
                    base.type_name, field.attr_name, base.type_name, base_column,
                )));
            };
            rel.base_fields.push(f);

            let Some(f) = join_table.lookup_field(join_column) else {
                return Err(Error::invalid_schema(format!(
                    "{} has-many {}: {} must have column {}",
                    base.type_name, field.attr_name, join_table.type_name, join_column,
                )));
            };
            rel.join_fields.push(f);
        }
    } else {
        let base_pks = base.pks();
        rel.base_fields = base_pks.clone();

        let fk_prefix = format!("{}_", base.model_name);
        if is_polymorphic {
            polymorphic_column = format!("{fk_prefix}type");
        }

        for base_pk in &base_pks {
            let fk_name = format!("{fk_prefix}{}", base_pk.name);
            if let Some(f) = join_table.lookup_field(&fk_name) {
                rel.join_fields.push(f);
                continue;
            }
            if let Some(f) = join_table.lookup_field(&base_pk.name) {
                rel.join_fields.push(f);
                continue;
            }
            return Err(Error::invalid_schema(format!(
                "{} has-many {}: {} must have column {} (to override, use join:base_column=join_column tag on {}.{} field)",
                base.type_name,
                field.attr_name,
                join_table.type_name,
                fk_name,
                base.type_name,
                field.attr_name,
            )));
        }
    }

    if is_polymorphic {
        let Some(f) = join_table.lookup_field(&polymorphic_column) else {
            return Err(Error::invalid_schema(format!(
                "{} has-many {}: {} must have polymorphic column {}",
                base.type_name, field.attr_name, join_table.type_name, polymorphic_column,
            )));
        };
        rel.polymorphic_field = Some(f);

        if polymorphic_value.is_empty() {
            polymorphic_value = base.model_name.clone();
        }
        rel.polymorphic_value = Some(polymorphic_value);
    }

    Ok(rel)
}

/// Resolved as two has-one relations declared on the junction table: one
/// pointing at the base type, one at the related type. The junction is looked
/// up by its resolved table name, so it must be registered.
fn m2m(tables: &Tables, base: &Arc<Table>, field: &Arc<Field>) -> Result<Relation> {
    let join_table = slice_target(tables, base, field, RelationKind::ManyToMany)?;

    for (table, side) in [(base, "base"), (&join_table, "join")] {
        if let Err(err) = table.check_pks() {
            return Err(Error::invalid_schema(format!(
                "{} many-to-many {}: {side} {err}",
                base.type_name, field.attr_name,
            )));
        }
    }

    let m2m_name = field.tag.option("m2m").unwrap_or_default();
    if m2m_name.is_empty() {
        return Err(Error::invalid_schema(format!(
            "{}.{} must name a junction table in its m2m option",
            base.type_name, field.attr_name,
        )));
    }
    let Some(m2m_table) = tables.by_name(m2m_name) else {
        return Err(Error::invalid_schema(format!(
            "can't find m2m table={m2m_name} (use a tables registry that has it registered)"
        )));
    };

    let (left_attr, right_attr) = match field.tag.option("join") {
        Some(join) => {
            let (left, right) = parse_relation_join(join)?;
            (left[0].clone(), right[0].clone())
        }
        None => (base.type_name.clone(), join_table.type_name.clone()),
    };

    let lookup_junction_attr = |attr: &str| -> Result<Arc<Field>> {
        m2m_table.field_by_attr_name(attr).ok_or_else(|| {
            Error::invalid_schema(format!(
                "{} many-to-many {}: {} must have field {} (to override, use join:LeftField=RightField tag on {}.{} field)",
                base.type_name,
                field.attr_name,
                m2m_table.type_name,
                attr,
                base.type_name,
                field.attr_name,
            ))
        })
    };
    let left_field = lookup_junction_attr(&left_attr)?;
    let right_field = lookup_junction_attr(&right_attr)?;

    let left_rel = has_one(tables, &m2m_table, &left_field)?;
    let right_rel = has_one(tables, &m2m_table, &right_field)?;

    let mut rel = Relation::new(RelationKind::ManyToMany, field.clone(), join_table);
    rel.m2m_table = Some(m2m_table);
    rel.base_fields = left_rel.join_fields;
    rel.m2m_base_fields = left_rel.base_fields;
    rel.join_fields = right_rel.join_fields;
    rel.m2m_join_fields = right_rel.base_fields;
    Ok(rel)
}

/// Resolves a record-shaped relation field to its target table, in
/// phase-1-complete form.
fn struct_target(
    tables: &Tables,
    base: &Arc<Table>,
    field: &Arc<Field>,
    kind: RelationKind,
) -> Result<Arc<Table>> {
    let Some(key) = field.ty.indirect().as_struct() else {
        return Err(Error::invalid_schema(format!(
            "{}.{} {kind} relation requires a record type, got {}",
            base.type_name, field.attr_name, field.ty,
        )));
    };
    tables.ref_(key)
}

/// Resolves a slice-of-records relation field to its element's table, in
/// phase-1-complete form.
fn slice_target(
    tables: &Tables,
    base: &Arc<Table>,
    field: &Arc<Field>,
    kind: RelationKind,
) -> Result<Arc<Table>> {
    let Some(elem) = field.ty.indirect().as_slice_elem() else {
        return Err(Error::invalid_schema(format!(
            "{}.{} {kind} relation requires a slice, got {}",
            base.type_name, field.attr_name, field.ty,
        )));
    };
    let Some(key) = elem.indirect().as_struct() else {
        return Err(Error::invalid_schema(format!(
            "{}.{} {kind} relation requires a slice of records, got {}",
            base.type_name, field.attr_name, field.ty,
        )));
    };
    tables.ref_(key)
}

/// Parses a `join` option value into parallel base-side and join-side column
/// lists. Pairs are comma-separated `base=join` items; repeated `join:`
/// options in the tag accumulate into the same list.
fn parse_relation_join(join: &str) -> Result<(Vec<String>, Vec<String>)> {
    let mut base_columns = Vec::new();
    let mut join_columns = Vec::new();

    for pair in join.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((base_column, join_column)) = pair.split_once('=') else {
            return Err(Error::invalid_schema(format!(
                "can't parse relation join: {pair:?}"
            )));
        };
        base_columns.push(base_column.trim().to_string());
        join_columns.push(join_column.trim().to_string());
    }

    if base_columns.is_empty() {
        return Err(Error::invalid_schema(format!(
            "can't parse relation join: {join:?}"
        )));
    }
    Ok((base_columns, join_columns))
}
