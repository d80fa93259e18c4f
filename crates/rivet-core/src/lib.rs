#[macro_use]
mod macros;

pub mod driver;
pub use driver::Gateway;

mod error;
pub use error::{Error, IntoError};

mod name;
pub use name::Name;

pub mod value;
pub use value::{Tuple, Value};

/// A Result type alias that uses Rivet's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
