//! # Domain Models
//!
//! Value types shared by the upstream adapter, the favorites store and the
//! live feed.

/// The normalized `Trial` entity.
pub mod trial;

pub use trial::Trial;
