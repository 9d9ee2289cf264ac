//! Racconto: a small server-rendered publishing site.
//!
//! Posts carry authors, tags, likes and comments; popularity rankings are
//! computed at query time and the two expensive aggregates are served through
//! a TTL-bounded read-path cache. Layout follows a layered split: `domain`
//! (entities and invariants), `application` (aggregation, serialization,
//! errors), `cache` (read-path cache), `infra` (Postgres, HTTP, telemetry)
//! and `presentation` (templates).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
