//! Client-side plumbing between the operations and whatever renders them.

pub mod enrich;
pub mod issuer;
pub mod live;

pub use enrich::{fetch_authors, next_enriched, settled_enriched, AuthorCard, Enriched};
pub use issuer::{FailurePolicy, Issuer, Outcome};
pub use live::{ErrorPolicy, LiveView, ViewState};
