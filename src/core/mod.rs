pub mod error;
pub mod object;
pub mod value;

pub use error::{AdapterError, ConfigurationError, MappingError, Result, UnitOfWorkError};
pub use object::{Mapped, MappedClass, ObjectHandle, ObjectId};
pub use value::{FieldValue, Value};
