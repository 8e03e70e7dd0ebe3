use heck::{ToSnakeCase, ToUpperCamelCase};
use std::sync::Arc;

/// Pluralizes a model name into a table name, e.g. `my_article` becomes
/// `my_articles`.
///
/// The inflector is injected into [`Tables`] at construction time and scoped
/// to that registry instance; swapping it affects tables built afterwards by
/// that registry only.
///
/// [`Tables`]: crate::schema::Tables
pub type Inflector = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// The default English singular-to-plural inflector.
pub fn default_inflector() -> Inflector {
    Arc::new(|name| pluralizer::pluralize(name, 2, false))
}

/// Converts an attribute- or type-style identifier to a column-style one,
/// e.g. `AuthorID` becomes `author_id`.
pub fn underscore(name: &str) -> String {
    name.to_snake_case()
}

/// Converts an identifier to its exported, type-style form, e.g. `my_article`
/// becomes `MyArticle`.
pub fn exported(name: &str) -> String {
    name.to_upper_camel_case()
}
