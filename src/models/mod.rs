// src/models/mod.rs

pub mod attempt;
pub mod completed_quiz;
pub mod question;
pub mod user;
