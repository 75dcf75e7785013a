pub mod identifiers;
pub mod policy;
pub mod profile;
pub mod score;
pub mod tables;
