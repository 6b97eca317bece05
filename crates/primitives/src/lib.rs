mod path;
mod types;
pub mod walker;


pub use path::*;
pub use types::*;
