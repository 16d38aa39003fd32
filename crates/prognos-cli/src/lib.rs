//! prognos-cli: configuration, upload handling and the HTTP server behind
//! the `prognos` binary.
pub mod config;
pub mod server;
pub mod uploads;
