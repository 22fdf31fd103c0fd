// src/models/mod.rs

pub mod question;
pub mod student;
pub mod test;
pub mod test_record;
