pub mod context;
pub mod value;

pub use context::*;
pub use value::*;
