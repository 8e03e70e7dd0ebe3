use super::Error;

/// Error when a schema declaration is structurally invalid.
///
/// This occurs when:
/// - A relation tag names an unrecognized kind
/// - A has-many or many-to-many field is not a sequence type
/// - A foreign-key column cannot be resolved, explicitly or by convention
/// - A relation name is registered twice on the same table
/// - A junction type or junction-side field is missing
///
/// These are programmer mistakes discoverable at startup; construction aborts
/// rather than publishing a partially resolved table.
#[derive(Debug)]
pub(super) struct InvalidSchemaError {
    message: Box<str>,
}

impl std::error::Error for InvalidSchemaError {}

impl core::fmt::Display for InvalidSchemaError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid schema: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidSchema(InvalidSchemaError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid schema error.
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidSchema(_))
    }
}
