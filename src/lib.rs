pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod i18n;
pub mod mutations;
pub mod ports;
pub mod query;
pub mod session;
pub mod telemetry;
