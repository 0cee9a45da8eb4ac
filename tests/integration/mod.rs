//! Integration tests for the generator stub binding layer

mod complex_stub;
mod config_integration;
mod placement;
mod simple_stub;
mod test_utils;
