// src/lib.rs

//! govwatch: watches government publication pages for new documents

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
