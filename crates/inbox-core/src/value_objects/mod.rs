//! Value objects - identifiers shared across the domain

mod ids;

pub use ids::{IdParseError, MessageId, UserId};
