//! Shared error type, domain types, collaborator traits and channels

pub mod channels;
pub mod errors;
pub mod traits;
pub mod types;
