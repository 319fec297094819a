//! Command handlers

pub mod config;
pub mod domains;
pub mod init;
pub mod ip;
pub mod server;
pub mod stats;
pub mod user;
