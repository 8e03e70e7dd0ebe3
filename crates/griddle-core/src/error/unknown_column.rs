use super::Error;

/// Error when a column lookup on a table misses.
#[derive(Debug)]
pub(super) struct UnknownColumnError {
    model: Box<str>,
    column: Box<str>,
}

impl std::error::Error for UnknownColumnError {}

impl core::fmt::Display for UnknownColumnError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "model={} does not have column={}",
            self.model, self.column
        )
    }
}

impl Error {
    /// Creates an unknown column error.
    pub fn unknown_column(model: impl Into<String>, column: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::UnknownColumn(UnknownColumnError {
            model: model.into().into(),
            column: column.into().into(),
        }))
    }

    /// Returns `true` if this error is an unknown column error.
    pub fn is_unknown_column(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnknownColumn(_))
    }
}
