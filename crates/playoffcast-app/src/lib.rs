// Library root: re-exports all modules so integration tests and the binary
// share the service's public API.

pub mod config;
pub mod live;
pub mod store;
pub mod updater;
