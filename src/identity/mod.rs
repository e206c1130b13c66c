mod matcher;
mod registry;

pub use matcher::{cosine_similarity, Identification, IdentityMatch, IdentityMatcher};
pub use registry::{IdentityEntry, IdentityRegistry, Metadata};
