//! Pure helpers shared by domain types.

pub mod timestamp;
