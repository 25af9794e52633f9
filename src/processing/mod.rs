//! Numeric core: every stage is a pure function over owned or borrowed vectors.
//!
//! ```text
//!  signal ──► smoothing ──► peak (approximate) ──► baseline ──► subtract ──► peak (final)
//!                                                     │
//!                                                penalized solve
//! ```

pub mod baseline;
pub mod peak;
pub mod penalized;
pub mod pipeline;
pub mod smoothing;
