//! Retrieval core: ordered entity retrieval and closure expansion

pub mod closure;
pub mod results;
pub mod retrieval;

pub use closure::ClosureResolver;
pub use results::{EntityResults, dedupe_by_id};
pub use retrieval::RetrievalEngine;
