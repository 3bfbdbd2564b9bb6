//! Attribute paths.
//!
//! [`resolve_path`] turns a declared dotted path into typed segments once, at
//! registry build time. [`JoinCache`] turns resolved paths into joins at every
//! build.

pub mod joins;
pub mod resolver;

pub use joins::{JoinCache, JoinMode, Location};
pub use resolver::{AttributePath, PathSegment, resolve_path};
