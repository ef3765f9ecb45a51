mod common;
mod features;

pub mod alert;
pub mod config;
pub mod data_model;
pub mod error;
pub mod probe;
pub mod probe_engine;
pub mod registry;
pub mod runtime;
pub mod settings;
pub mod storage;
pub mod validator;

/// Logs to stderr at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
