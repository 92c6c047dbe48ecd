pub mod encoding;
pub mod router;
pub mod url_builder;

pub use router::{Dispatch, Router};
