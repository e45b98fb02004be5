pub mod lifecycle;
pub mod validate;

pub use lifecycle::{NewRequest, RequestError};
pub use validate::ValidationError;
