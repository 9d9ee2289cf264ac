//! Application services layer.

pub mod error;
pub mod feed;
pub mod repos;
pub mod serialize;
