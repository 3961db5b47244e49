pub mod api;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod errors;
pub mod logging;
pub mod storage;
pub mod tui;
