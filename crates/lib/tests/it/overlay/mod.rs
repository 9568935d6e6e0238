//! Overlay integration tests
//!
//! Tests are organized by component: maps, sequences, roots and delegates.
//! `properties` covers the end-to-end guarantees of the overlay as a whole.

mod delegate_tests;
mod helpers;
mod map_tests;
mod properties;
mod seq_tests;
