//! CLI commands implementation

pub mod get;
pub mod load;
pub mod search;
pub mod status;
pub mod validate;

pub use get::*;
pub use load::*;
pub use search::*;
pub use status::*;
pub use validate::*;
