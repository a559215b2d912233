pub mod aggregate;
pub mod derived;
pub mod error;
pub mod merge;
