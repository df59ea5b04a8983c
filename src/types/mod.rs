pub mod errors;
pub mod triple;

pub use errors::{Error, ErrorKind, Result};
pub use triple::FileTriple;
