// src/lib.rs

//! pagewatch library
//!
//! Watches a fixed set of listing pages, reports entries not seen in any
//! earlier run to a Telegram chat, and keeps the seen entries in a remote
//! document between stateless runs.

pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
