use super::Error;

/// Error when a table has no primary keys.
///
/// Unlike [`Error::invalid_schema`], this is an ordinary recoverable error:
/// a table without primary keys builds fine and only fails when a caller
/// explicitly requires keys (`Table::check_pks`) or when a relation
/// algorithm needs them during construction.
#[derive(Debug)]
pub(super) struct MissingPrimaryKeyError {
    model: Box<str>,
}

impl std::error::Error for MissingPrimaryKeyError {}

impl core::fmt::Display for MissingPrimaryKeyError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "model={} does not have primary keys", self.model)
    }
}

impl Error {
    /// Creates a missing primary key error for the named model.
    pub fn missing_primary_key(model: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::MissingPrimaryKey(MissingPrimaryKeyError {
            model: model.into().into(),
        }))
    }

    /// Returns `true` if this error is a missing primary key error.
    pub fn is_missing_primary_key(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::MissingPrimaryKey(_))
    }
}
