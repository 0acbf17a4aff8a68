//! Data models for the PMR client

pub mod registration;
pub mod workspace;

pub use registration::*;
pub use workspace::*;
