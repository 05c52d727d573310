//! Application services.

pub mod sound;
