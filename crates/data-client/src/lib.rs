mod types;
pub mod reqwest;


pub use types::*;
