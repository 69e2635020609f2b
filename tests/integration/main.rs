//! Integration test modules.

mod catalog_config_test;
mod concurrency_test;
mod plans_test;
