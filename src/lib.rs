pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod generators;
pub mod services;
pub mod sources;
pub mod storage;
