//! Nested product trees assembled from flat retrieval results
//!
//! [`HierarchyIndex`] precomputes foreign-key groups and id lookups once;
//! [`HierarchyAssembler`] walks product edges with a visited set so shared
//! or cyclic references end in stub nodes.

pub mod builder;
pub mod index;
pub mod listing;
pub mod node;
pub mod schema;

pub use builder::HierarchyAssembler;
pub use index::HierarchyIndex;
pub use listing::{CalculationListing, ProductPricing, pricing_by_product};
pub use node::ProductNode;
