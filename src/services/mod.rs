// src/services/mod.rs

pub mod fixtures;
pub mod quiz_session;
