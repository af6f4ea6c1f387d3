//! End-to-end tests at the query level.
//!
//! Each test file covers one scenario: statements go in through a write
//! transaction, session or loaded document, and results come back through
//! an answer.

#![cfg(test)]

mod helpers;

mod test_ask_construct;
mod test_close_safety;
mod test_concurrent_readers;
mod test_connection_factory;
mod test_filter_double_negation;
mod test_flattening;
mod test_join_commutativity;
mod test_knows_scenario;
mod test_load_file;
mod test_optional_totality;
mod test_transitive_cycle;
