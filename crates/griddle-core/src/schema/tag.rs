use indexmap::IndexMap;

/// A parsed per-attribute schema tag.
///
/// Tags are comma-separated: the first bare item is the column name override
/// (`-` suppresses the column, `_` is the clear-name sentinel on identity
/// tags), every other item is either a flag option (`pk`) or a keyed option
/// (`rel:belongs-to`). A repeated keyed option accumulates its values into a
/// single comma-joined value, preserving order, which is how multi-column
/// `join` pair lists and multiple `unique` group names are declared.
#[derive(Debug, Clone, Default)]
pub struct SchemaTag {
    pub name: String,
    options: IndexMap<String, String>,
}

impl SchemaTag {
    pub fn parse(tag: &str) -> SchemaTag {
        let mut parsed = SchemaTag::default();

        for (i, item) in tag.split(',').map(str::trim).enumerate() {
            if item.is_empty() {
                continue;
            }
            match item.split_once(':') {
                None if i == 0 => parsed.name = item.to_string(),
                None => {
                    parsed.options.entry(item.to_string()).or_default();
                }
                Some((key, value)) => match parsed.options.entry(key.to_string()) {
                    indexmap::map::Entry::Occupied(mut entry) => {
                        let merged = entry.get_mut();
                        if !merged.is_empty() {
                            merged.push(',');
                        }
                        merged.push_str(value);
                    }
                    indexmap::map::Entry::Vacant(entry) => {
                        entry.insert(value.to_string());
                    }
                },
            }
        }

        parsed
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Options recognized on a table identity tag.
pub(crate) fn is_known_table_option(name: &str) -> bool {
    matches!(name, "alias" | "select")
}

/// Options recognized on a field tag.
pub(crate) fn is_known_field_option(name: &str) -> bool {
    matches!(
        name,
        "alias"
            | "type"
            | "notnull"
            | "nullzero"
            | "default"
            | "unique"
            | "soft_delete"
            | "on_delete"
            | "on_update"
            | "pk"
            | "autoincrement"
            | "rel"
            | "join"
            | "m2m"
            | "polymorphic"
    )
}
