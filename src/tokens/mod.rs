pub mod bearer;
pub mod generator;
pub mod session;

pub use generator::generate_token;
