pub mod domain;
pub mod error;
pub mod preset;
pub mod protocol;
