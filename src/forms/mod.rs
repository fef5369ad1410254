//! Request-bound form definitions.
pub mod profile;
