// src/models/mod.rs

pub mod attempt;
pub mod quiz;
pub mod selected_answer;
pub mod user;
