//! Presentation layer: template structs and rendering helpers.

pub mod views;
