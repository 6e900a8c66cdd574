//! Field catalog for the transaction schema.
//!
//! Static lookup tables consumed by rule generation and evaluation:
//! - field descriptors (name, type, description)
//! - natural-language alias → canonical field name
//! - operator phrase → canonical operator symbol
//!
//! Pure lookup, no state.

mod catalog;

pub use catalog::*;
