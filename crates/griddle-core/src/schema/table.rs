use super::desc::{FieldDesc, RecordDesc};
use super::dialect::{self, Dialect, SqlIdent};
use super::field::{self, Field};
use super::naming::{self, Inflector};
use super::relation::Relation;
use super::soft_delete::{self, SoftDeleteFn};
use super::tag::{self, SchemaTag};
use super::tables::Tables;
use super::ty::TypeKey;
use crate::{Error, Result};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Per-record-type table metadata.
///
/// Built lazily by a [`Tables`] registry in two phases: field discovery, then
/// inlining and relation resolution. Once the registry publishes a fully
/// built table it is treated as immutable and shared by any number of
/// concurrent readers; only the field map's lock is exercised after
/// publication, while another table's construction inlines fields through
/// this one.
pub struct Table {
    dialect: Arc<dyn Dialect>,

    /// Registry identity of the record type.
    pub key: TypeKey,

    pub type_name: String,
    pub model_name: String,

    /// Resolved table name and its quoted, select-time, and aliased forms.
    /// `sql_name_for_selects` may differ from `sql_name` when the type is
    /// mapped to a view or expression for reads.
    pub name: String,
    pub sql_name: SqlIdent,
    pub sql_name_for_selects: SqlIdent,
    pub alias: SqlIdent,

    // Mutated while relations are resolved in phase 2; read-only afterwards.
    fields: RwLock<Vec<Arc<Field>>>,
    pks: RwLock<Vec<Arc<Field>>>,
    data_fields: RwLock<Vec<Arc<Field>>>,
    field_map: RwLock<HashMap<String, Arc<Field>>>,
    relations: RwLock<IndexMap<String, Arc<Relation>>>,

    unique: HashMap<String, Vec<Arc<Field>>>,
    soft_delete_field: Option<Arc<Field>>,
    soft_delete_updater: Option<SoftDeleteFn>,

    // Every discovered field, skipped ones included. Read only.
    all_fields: Vec<Arc<Field>>,

    // Scratch list for phase 2, discarded afterwards.
    skipped_fields: Mutex<Vec<Arc<Field>>>,
}

impl Table {
    pub(crate) fn new(
        key: TypeKey,
        declared_name: &str,
        dialect: Arc<dyn Dialect>,
        inflector: &Inflector,
    ) -> Table {
        let type_name = naming::exported(declared_name);
        let model_name = naming::underscore(declared_name);
        let table_name = inflector(&model_name);
        let alias = dialect::quote_ident(&*dialect, &model_name);

        let mut table = Table {
            dialect,
            key,
            type_name,
            model_name,
            name: String::new(),
            sql_name: SqlIdent::default(),
            sql_name_for_selects: SqlIdent::default(),
            alias,
            fields: RwLock::new(Vec::new()),
            pks: RwLock::new(Vec::new()),
            data_fields: RwLock::new(Vec::new()),
            field_map: RwLock::new(HashMap::new()),
            relations: RwLock::new(IndexMap::new()),
            unique: HashMap::new(),
            soft_delete_field: None,
            soft_delete_updater: None,
            all_fields: Vec::new(),
            skipped_fields: Mutex::new(Vec::new()),
        };
        table.set_name(&table_name);
        table
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.sql_name = self.quote_ident(name);
        self.sql_name_for_selects = self.quote_ident(name);
        if self.alias.is_empty() {
            self.alias = self.quote_ident(name);
        }
    }

    pub(crate) fn quote_ident(&self, name: &str) -> SqlIdent {
        dialect::quote_ident(&*self.dialect, name)
    }

    /// Returns an error if the table has no primary keys.
    pub fn check_pks(&self) -> Result<()> {
        if self.pks.read().is_empty() {
            return Err(Error::missing_primary_key(self.type_name.as_str()));
        }
        Ok(())
    }

    pub fn fields(&self) -> Vec<Arc<Field>> {
        self.fields.read().clone()
    }

    pub fn pks(&self) -> Vec<Arc<Field>> {
        self.pks.read().clone()
    }

    pub fn data_fields(&self) -> Vec<Arc<Field>> {
        self.data_fields.read().clone()
    }

    /// Every discovered field, including skipped ones.
    pub fn all_fields(&self) -> &[Arc<Field>] {
        &self.all_fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_map.read().contains_key(name)
    }

    pub fn field(&self, name: &str) -> Result<Arc<Field>> {
        self.lookup_field(name)
            .ok_or_else(|| Error::unknown_column(self.type_name.as_str(), name))
    }

    /// Field lookup by resolved column name or registered alias.
    pub(crate) fn lookup_field(&self, name: &str) -> Option<Arc<Field>> {
        self.field_map.read().get(name).cloned()
    }

    /// Field lookup by original attribute name.
    pub fn field_by_attr_name(&self, name: &str) -> Option<Arc<Field>> {
        self.all_fields
            .iter()
            .find(|f| f.attr_name == name)
            .cloned()
    }

    pub fn relations(&self) -> IndexMap<String, Arc<Relation>> {
        self.relations.read().clone()
    }

    pub fn relation(&self, name: &str) -> Option<Arc<Relation>> {
        self.relations.read().get(name).cloned()
    }

    /// Named unique-constraint groups; a field may belong to several.
    pub fn unique(&self) -> &HashMap<String, Vec<Arc<Field>>> {
        &self.unique
    }

    pub fn soft_delete_field(&self) -> Option<&Arc<Field>> {
        self.soft_delete_field.as_ref()
    }

    /// The deletion-marking closure bound at construction, if the table has
    /// a soft-delete field.
    pub fn soft_delete_updater(&self) -> Option<&SoftDeleteFn> {
        self.soft_delete_updater.as_ref()
    }

    // ------------------------------------------------------------------
    // Phase 1: field discovery. The table is exclusively owned here.
    // ------------------------------------------------------------------

    pub(crate) fn init_fields(&mut self, tables: &Tables, desc: &RecordDesc) -> Result<()> {
        self.process_identity(desc);
        self.add_fields(tables, desc, &[])?;

        if self.pks.get_mut().is_empty() {
            self.promote_fallback_pk();
        }
        Ok(())
    }

    fn process_identity(&mut self, desc: &RecordDesc) {
        let Some(identity) = &desc.identity else {
            return;
        };
        let tag = SchemaTag::parse(identity);

        if tag::is_known_table_option(&tag.name) {
            tracing::warn!(
                "{} identity tag name {:?} is also an option name; is it a mistake?",
                self.type_name,
                tag.name,
            );
        }
        for (option, _) in tag.options() {
            if !tag::is_known_table_option(option) {
                tracing::warn!(
                    "{} identity tag has unknown option: {:?}",
                    self.type_name,
                    option,
                );
            }
        }

        if tag.name == "_" {
            self.set_name("");
        } else if !tag.name.is_empty() {
            let name = tag.name.clone();
            self.set_name(&name);
        }

        if let Some(select) = tag.option("select") {
            self.sql_name_for_selects = dialect::quote_table_name(&*self.dialect, select);
        }
        if let Some(alias) = tag.option("alias") {
            self.alias = self.quote_ident(alias);
        }
    }

    fn add_fields(&mut self, tables: &Tables, desc: &RecordDesc, base_index: &[usize]) -> Result<()> {
        for (i, fd) in desc.fields.iter().enumerate() {
            let mut index = Vec::with_capacity(base_index.len() + 1);
            index.extend_from_slice(base_index);
            index.push(i);

            if fd.embedded {
                let tag = SchemaTag::parse(&fd.tag);
                if tag.name == "-" {
                    continue;
                }
                let Some(key) = fd.ty.indirect().as_struct() else {
                    continue;
                };

                let sub = tables.desc(key)?;
                self.add_fields(tables, &sub, &index)?;

                if tag.has_option("inherit") {
                    // Table-per-hierarchy sharing: adopt the embedded type's
                    // full naming identity.
                    let embedded = tables.ref_(key)?;
                    self.type_name = embedded.type_name.clone();
                    self.model_name = embedded.model_name.clone();
                    self.sql_name = embedded.sql_name.clone();
                    self.sql_name_for_selects = embedded.sql_name_for_selects.clone();
                    self.alias = embedded.alias.clone();
                }
                continue;
            }

            if let Some(new) = self.new_field(fd, index)? {
                self.add_field(new);
            }
        }
        Ok(())
    }

    fn new_field(&mut self, fd: &FieldDesc, index: Vec<usize>) -> Result<Option<Arc<Field>>> {
        let tag = SchemaTag::parse(&fd.tag);
        let default_name = naming::underscore(&fd.name);

        if !tag.name.is_empty()
            && tag.name != default_name
            && tag::is_known_field_option(&tag.name)
        {
            tracing::warn!(
                "{}.{} tag name {:?} is also an option name; is it a mistake?",
                self.type_name,
                fd.name,
                tag.name,
            );
        }
        for (option, _) in tag.options() {
            if !tag::is_known_field_option(option) {
                tracing::warn!(
                    "{}.{} has unknown tag option: {:?}",
                    self.type_name,
                    fd.name,
                    option,
                );
            }
        }

        let skip = tag.name == "-";
        let sql_name = if !skip && !tag.name.is_empty() {
            tag.name.clone()
        } else {
            default_name
        };

        if let Some(existing) = self.field_map.get_mut().get(&sql_name).cloned() {
            if existing.index == index {
                // Idempotent re-discovery through another embedding path.
                return Ok(None);
            }
            self.remove_field_mut(&existing);
        }

        let ty = fd.ty.indirect().clone();
        let mut new = Field {
            name: sql_name.clone(),
            sql_name: dialect::quote_ident(&*self.dialect, &sql_name),
            attr_name: fd.name.clone(),
            index,
            tag: tag.clone(),
            is_pk: false,
            auto_increment: tag.has_option("autoincrement"),
            not_null: tag.has_option("notnull"),
            null_zero: tag.has_option("nullzero"),
            sql_default: tag.option("default").map(str::to_string),
            on_delete: tag.option("on_delete").map(str::to_string),
            on_update: tag.option("on_update").map(str::to_string),
            user_sql_type: tag.option("type").map(str::to_string),
            discovered_sql_type: String::new(),
            create_table_sql_type: None,
            append: field::bind_append(&ty),
            scan: field::bind_scan(&ty),
            is_zero: field::bind_is_zero(&ty),
            ty,
        };
        if tag.has_option("pk") {
            new.mark_as_pk();
        }
        new.discovered_sql_type = self.dialect.detect_sql_type(&new.ty);

        let dialect = self.dialect.clone();
        dialect.on_field(&mut new);

        let soft_delete = tag.has_option("soft_delete");
        if soft_delete && !skip {
            new.null_zero = true;
        }

        let new = Arc::new(new);

        if let Some(groups) = tag.option("unique") {
            for group in groups.split(',').map(str::trim).filter(|g| !g.is_empty()) {
                self.unique
                    .entry(group.to_string())
                    .or_default()
                    .push(new.clone());
            }
        }
        if let Some(alias) = tag.option("alias") {
            self.field_map
                .get_mut()
                .insert(alias.to_string(), new.clone());
        }

        self.all_fields.push(new.clone());

        if skip {
            self.skipped_fields.get_mut().push(new.clone());
            self.field_map.get_mut().insert(new.name.clone(), new);
            return Ok(None);
        }

        if soft_delete {
            self.soft_delete_field = Some(new.clone());
            self.soft_delete_updater = Some(soft_delete::updater(&fd.ty, &new));
        }

        Ok(Some(new))
    }

    fn add_field(&mut self, new: Arc<Field>) {
        self.fields.get_mut().push(new.clone());
        if new.is_pk {
            self.pks.get_mut().push(new.clone());
        } else {
            self.data_fields.get_mut().push(new.clone());
        }
        self.field_map.get_mut().insert(new.name.clone(), new);
    }

    fn remove_field_mut(&mut self, removed: &Arc<Field>) {
        self.fields.get_mut().retain(|f| !Arc::ptr_eq(f, removed));
        if removed.is_pk {
            self.pks.get_mut().retain(|f| !Arc::ptr_eq(f, removed));
        } else {
            self.data_fields
                .get_mut()
                .retain(|f| !Arc::ptr_eq(f, removed));
        }
        self.field_map.get_mut().remove(&removed.name);
    }

    /// No field was tagged as primary key: fall back to conventional key
    /// names. The first match becomes the sole primary key and is marked
    /// auto-increment.
    fn promote_fallback_pk(&mut self) {
        let names = [
            "id".to_string(),
            "uuid".to_string(),
            format!("pk_{}", self.model_name),
        ];
        let Some(old) = names
            .iter()
            .find_map(|name| self.field_map.get_mut().get(name.as_str()).cloned())
        else {
            return;
        };

        let mut promoted = (*old).clone();
        promoted.mark_as_pk();
        promoted.auto_increment = true;
        let promoted = Arc::new(promoted);

        for f in self.fields.get_mut().iter_mut() {
            if Arc::ptr_eq(f, &old) {
                *f = promoted.clone();
            }
        }
        self.data_fields.get_mut().retain(|f| !Arc::ptr_eq(f, &old));
        *self.pks.get_mut() = vec![promoted.clone()];
        for f in self.field_map.get_mut().values_mut() {
            if Arc::ptr_eq(f, &old) {
                *f = promoted.clone();
            }
        }
        for f in self.all_fields.iter_mut() {
            if Arc::ptr_eq(f, &old) {
                *f = promoted.clone();
            }
        }
        for f in self.skipped_fields.get_mut().iter_mut() {
            if Arc::ptr_eq(f, &old) {
                *f = promoted.clone();
            }
        }
        for group in self.unique.values_mut() {
            for f in group.iter_mut() {
                if Arc::ptr_eq(f, &old) {
                    *f = promoted.clone();
                }
            }
        }
        if let Some(f) = &mut self.soft_delete_field {
            if Arc::ptr_eq(f, &old) {
                *f = promoted.clone();
            }
        }
    }

    // ------------------------------------------------------------------
    // Phase 2: inlining and relation resolution. The table may already be
    // visible through the registry for self-referential types, so mutation
    // goes through the locks.
    // ------------------------------------------------------------------

    pub(crate) fn field_at(&self, index: usize) -> Option<Arc<Field>> {
        self.fields.read().get(index).cloned()
    }

    /// Removes a resolved relation field from the column lists. The field
    /// map entry stays, so the attribute remains addressable by name.
    pub(crate) fn remove_field(&self, removed: &Arc<Field>) {
        self.fields.write().retain(|f| !Arc::ptr_eq(f, removed));
        self.data_fields.write().retain(|f| !Arc::ptr_eq(f, removed));
    }

    /// Registers a resolved relation under its owning field's attribute
    /// name, which must be unique per table.
    pub(crate) fn add_relation(&self, rel: Relation) -> Result<()> {
        let name = rel.field.attr_name.clone();
        let mut relations = self.relations.write();
        if relations.contains_key(&name) {
            return Err(Error::invalid_schema(format!(
                "{self} already has relation={name}"
            )));
        }
        relations.insert(name, Arc::new(rel));
        Ok(())
    }

    pub(crate) fn init_inlines(&self, tables: &Tables) -> Result<()> {
        let skipped: Vec<Arc<Field>> = self.skipped_fields.lock().clone();
        for f in &skipped {
            if f.ty.indirect().is_struct() {
                self.inline_struct_field(tables, f)?;
            }
        }
        Ok(())
    }

    pub(crate) fn inline_struct_field(&self, tables: &Tables, f: &Arc<Field>) -> Result<()> {
        // Seed the visited set with this table's own type so self-referential
        // structures terminate.
        let mut visited = HashSet::from([self.key.clone()]);
        self.inline_fields(tables, f, &mut visited)
    }

    /// Flattens a record-shaped field's columns into this table's field map
    /// under `<parent>_<child>` / `<parent>__<child>` names. First
    /// registration wins; an already-present name is left untouched.
    fn inline_fields(
        &self,
        tables: &Tables,
        strct: &Arc<Field>,
        visited: &mut HashSet<TypeKey>,
    ) -> Result<()> {
        let Some(key) = strct.ty.indirect().as_struct() else {
            return Ok(());
        };
        if !visited.insert(key.clone()) {
            return Ok(());
        }

        let join_table = tables.ref_(key)?;
        for f in join_table.all_fields() {
            let clone = Arc::new(f.clone_for_inline(strct, |name| self.quote_ident(name)));

            {
                let mut field_map = self.field_map.write();
                field_map
                    .entry(clone.name.clone())
                    .or_insert_with(|| clone.clone());
            }

            if let Some(nested) = clone.ty.indirect().as_struct() {
                if !visited.contains(nested) {
                    self.inline_fields(tables, &clone, visited)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn clear_skipped(&self) {
        let mut skipped = self.skipped_fields.lock();
        skipped.clear();
        skipped.shrink_to_fit();
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model={}", self.type_name)
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("key", &self.key)
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("fields", &*self.fields.read())
            .field("pks", &*self.pks.read())
            .finish_non_exhaustive()
    }
}
