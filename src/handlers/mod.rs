// src/handlers/mod.rs

pub mod admin;
pub mod results;
pub mod sessions;
