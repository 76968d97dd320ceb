//! Member Search API Library
//!
//! Members, teams and a dynamic search over the two: sparse search
//! conditions become predicates that run against PostgreSQL or an
//! in-memory store through an explicit unit of work.

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
