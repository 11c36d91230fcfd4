pub mod config;
pub mod database;
pub mod logging;
pub mod security;
pub mod storage;
