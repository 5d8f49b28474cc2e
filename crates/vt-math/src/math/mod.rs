//! Core math modules.

pub mod categorical;
pub mod stable;
pub mod summary;
