//! Map location resolution for the EasyCorkage restaurant directory.
//!
//! Restaurant submissions usually carry a Naver Map link instead of a
//! coordinate. This crate recovers a coordinate from such links
//! ([`extract`]), caches the result ([`cache`], [`resolver`]), falls back to a
//! place lookup when only a place ID is present ([`place`], [`api`]), and
//! keeps a local restaurant store in sync ([`db`], [`location`]).

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod extract;
pub mod geo;
pub mod location;
pub mod logging;
pub mod models;
pub mod place;
pub mod resolver;

pub use geo::{Bounds, Coordinate, DefaultReason, Resolution, Source, DEFAULT_COORDINATE};
pub use resolver::Resolver;
