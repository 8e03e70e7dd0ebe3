use super::desc::RecordDesc;
use super::dialect::{Dialect, StandardDialect};
use super::naming::{self, default_inflector, Inflector};
use super::relation;
use super::table::Table;
use super::tag::SchemaTag;
use super::ty::TypeKey;
use crate::{Error, Result};
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// The table registry: builds and caches [`Table`] metadata for registered
/// record descriptions, lazily and concurrently.
///
/// Construction is split in two phases. Phase 1 discovers fields from the
/// description; phase 2 inlines record-shaped columns and resolves
/// relations. Internal references taken while building (relation targets,
/// inlined types, inherited identities) only require the target to have
/// completed phase 1, so mutually referential types cannot deadlock each
/// other: each in-progress entry is published after phase 1 and upgraded in
/// place.
///
/// A failed build is cached on the in-progress entry and replayed to every
/// later caller, so a broken description fails deterministically instead of
/// being retried.
pub struct Tables {
    dialect: Arc<dyn Dialect>,
    inflector: Inflector,

    descs: RwLock<HashMap<TypeKey, Arc<RecordDesc>>>,
    completed: RwLock<HashMap<TypeKey, Arc<Table>>>,
    in_progress: Mutex<HashMap<TypeKey, Arc<InProgress>>>,
}

struct InProgress {
    phase1: Mutex<Phase1>,
    ready: Condvar,
    init2: Mutex<Init2>,
}

enum Phase1 {
    Building,
    Ready(Arc<Table>),
    Failed(Error),
}

enum Init2 {
    Pending,
    Done,
    Failed(Error),
}

impl InProgress {
    fn new() -> InProgress {
        InProgress {
            phase1: Mutex::new(Phase1::Building),
            ready: Condvar::new(),
            init2: Mutex::new(Init2::Pending),
        }
    }
}

/// Configures and creates a [`Tables`] registry.
pub struct TablesBuilder {
    dialect: Arc<dyn Dialect>,
    inflector: Inflector,
}

impl Default for TablesBuilder {
    fn default() -> Self {
        TablesBuilder {
            dialect: Arc::new(StandardDialect),
            inflector: default_inflector(),
        }
    }
}

impl TablesBuilder {
    /// Sets the dialect the registry's tables quote identifiers and discover
    /// SQL types with.
    pub fn dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Arc::new(dialect);
        self
    }

    /// Sets the model-name-to-table-name inflector. Scoped to the registry
    /// being built; tables built by other registries are unaffected.
    pub fn inflector(mut self, inflector: Inflector) -> Self {
        self.inflector = inflector;
        self
    }

    pub fn build(self) -> Tables {
        Tables {
            dialect: self.dialect,
            inflector: self.inflector,
            descs: RwLock::new(HashMap::new()),
            completed: RwLock::new(HashMap::new()),
            in_progress: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for Tables {
    fn default() -> Self {
        Tables::builder().build()
    }
}

impl Tables {
    pub fn builder() -> TablesBuilder {
        TablesBuilder::default()
    }

    /// Registers a record description, returning its registry key. Must be
    /// called before the type is referenced, directly or through another
    /// type's relation or embedding. Re-registering replaces the description
    /// but does not rebuild an already built table.
    pub fn register(&self, desc: RecordDesc) -> TypeKey {
        let key = desc.key();
        self.descs.write().insert(key.clone(), Arc::new(desc));
        key
    }

    pub(crate) fn desc(&self, key: &TypeKey) -> Result<Arc<RecordDesc>> {
        self.descs.read().get(key).cloned().ok_or_else(|| {
            Error::invalid_schema(format!(
                "no record description registered for type={key}"
            ))
        })
    }

    /// Returns the fully built table for a registered type, building it on
    /// first call.
    pub fn get(&self, key: &TypeKey) -> Result<Arc<Table>> {
        self.table(key, false)
    }

    /// Returns the table in at least phase-1-complete form: fields are
    /// discovered, relations may not be resolved yet. Used internally while
    /// another table's construction needs this one, which keeps cycles of
    /// mutually referential types from deadlocking.
    pub(crate) fn ref_(&self, key: &TypeKey) -> Result<Arc<Table>> {
        self.table(key, true)
    }

    /// Finds a registered type by its resolved table name and returns its
    /// table in phase-1-complete form. The name is resolved from the
    /// description alone: an identity tag override if present, otherwise the
    /// inflected model name. `_` identity names match nothing.
    pub(crate) fn by_name(&self, name: &str) -> Option<Arc<Table>> {
        let key = {
            let descs = self.descs.read();
            descs.iter().find_map(|(key, desc)| {
                (self.declared_table_name(desc).as_deref() == Some(name)).then(|| key.clone())
            })
        }?;
        self.ref_(&key).ok()
    }

    fn declared_table_name(&self, desc: &RecordDesc) -> Option<String> {
        if let Some(identity) = &desc.identity {
            let tag = SchemaTag::parse(identity);
            match tag.name.as_str() {
                "_" => return None,
                "" => {}
                name => return Some(name.to_string()),
            }
        }
        Some((self.inflector)(&naming::underscore(&desc.name)))
    }

    fn table(&self, key: &TypeKey, allow_in_progress: bool) -> Result<Arc<Table>> {
        if let Some(table) = self.completed.read().get(key) {
            return Ok(table.clone());
        }

        let (entry, creator) = {
            let mut in_progress = self.in_progress.lock();
            // A concurrent builder may have completed between the read above
            // and taking this lock.
            if let Some(table) = self.completed.read().get(key) {
                return Ok(table.clone());
            }
            match in_progress.get(key) {
                Some(entry) => (entry.clone(), false),
                None => {
                    let entry = Arc::new(InProgress::new());
                    in_progress.insert(key.clone(), entry.clone());
                    (entry, true)
                }
            }
        };

        let table = if creator {
            tracing::debug!(type_key = %key, "building table metadata");
            let built = self.build_phase1(key);
            let mut phase1 = entry.phase1.lock();
            match built {
                Ok(table) => {
                    *phase1 = Phase1::Ready(table.clone());
                    entry.ready.notify_all();
                    table
                }
                Err(err) => {
                    *phase1 = Phase1::Failed(err.clone());
                    entry.ready.notify_all();
                    return Err(err);
                }
            }
        } else {
            let mut phase1 = entry.phase1.lock();
            loop {
                match &*phase1 {
                    Phase1::Building => entry.ready.wait(&mut phase1),
                    Phase1::Ready(table) => break table.clone(),
                    Phase1::Failed(err) => return Err(err.clone()),
                }
            }
        };

        if allow_in_progress {
            return Ok(table);
        }

        {
            let mut init2 = entry.init2.lock();
            match &*init2 {
                Init2::Done => {}
                Init2::Failed(err) => return Err(err.clone()),
                Init2::Pending => match self.init2(&table) {
                    Ok(()) => *init2 = Init2::Done,
                    Err(err) => {
                        *init2 = Init2::Failed(err.clone());
                        return Err(err);
                    }
                },
            }
        }

        self.completed.write().insert(key.clone(), table.clone());
        self.in_progress.lock().remove(key);
        Ok(table)
    }

    fn build_phase1(&self, key: &TypeKey) -> Result<Arc<Table>> {
        let desc = self.desc(key)?;
        let mut table = Table::new(key.clone(), &desc.name, self.dialect.clone(), &self.inflector);
        table.init_fields(self, &desc)?;
        Ok(Arc::new(table))
    }

    fn init2(&self, table: &Arc<Table>) -> Result<()> {
        table.init_inlines(self)?;
        self.init_relations(table)?;
        table.clear_skipped();
        Ok(())
    }

    /// Walks the field list resolving relations. A field that resolves to a
    /// relation is removed from the column lists, so the index only advances
    /// past non-relation fields. Surviving record-shaped fields have their
    /// columns inlined.
    fn init_relations(&self, table: &Arc<Table>) -> Result<()> {
        let mut index = 0;
        while let Some(field) = table.field_at(index) {
            if let Some(rel) = relation::resolve(self, table, &field)? {
                tracing::debug!(table = %table, relation = %rel, "resolved relation");
                table.add_relation(rel)?;
                table.remove_field(&field);
            } else {
                index += 1;
            }

            if field.ty.indirect().is_struct() {
                table.inline_struct_field(self, &field)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Ty;

    #[test]
    fn unregistered_type_is_an_error() {
        let tables = Tables::default();
        let err = tables.get(&TypeKey::new("Ghost")).unwrap_err();
        assert!(err.is_invalid_schema());
    }

    #[test]
    fn failed_builds_are_replayed() {
        let tables = Tables::default();
        let key = tables.register(
            RecordDesc::new("Pet")
                .field("ID", Ty::I64, "id,pk")
                .field("Owner", Ty::option(Ty::strukt("Owner")), "rel:owns"),
        );

        let first = tables.get(&key).unwrap_err();
        let second = tables.get(&key).unwrap_err();
        assert!(first.is_invalid_schema());
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn by_name_honors_identity_overrides() {
        let tables = Tables::default();
        tables.register(
            RecordDesc::new("Article")
                .with_identity("writeups")
                .field("ID", Ty::I64, "id,pk"),
        );
        tables.register(RecordDesc::new("Comment").field("ID", Ty::I64, "id,pk"));

        assert!(tables.by_name("writeups").is_some());
        assert!(tables.by_name("articles").is_none());
        assert!(tables.by_name("comments").is_some());
    }
}
