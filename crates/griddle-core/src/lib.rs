mod error;
pub use error::Error;

pub mod schema;
pub use schema::Tables;

/// A Result type alias that uses griddle's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
