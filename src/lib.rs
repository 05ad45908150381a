pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod logging;
pub mod questions;
