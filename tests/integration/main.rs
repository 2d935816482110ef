//! Binary-level tests: argument validation, config handling, and a oneshot
//! smoke run.

mod arg_tests;
mod config_tests;
mod util;
