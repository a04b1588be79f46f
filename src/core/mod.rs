//! Core library modules for baryscore
//!
//! This module contains the internal implementation details of the baryscore library.

pub mod error;
pub mod estimator;
pub mod fetch;
pub mod geo;
pub mod geocode;
pub mod grid;
pub mod links;
pub mod overpass;
pub mod payload;
pub mod planner;
pub mod scoring;
pub mod search;
pub mod session;
pub mod source;
pub mod static_data;
pub mod types;

