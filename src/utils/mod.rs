//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `pubhub` crate.
//!
//! It holds the broker error type and the logging bootstrap used by the
//! demonstration binary.

pub mod error;
pub mod logging;
