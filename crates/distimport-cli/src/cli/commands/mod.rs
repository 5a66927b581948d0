//! CLI command handlers.

mod import;

#[cfg(test)]
pub(crate) use import::build_request;
pub use import::run_import;
