// src/handlers/mod.rs

pub mod attempts;
pub mod auth;
pub mod completed;
pub mod materials;
pub mod questions;
pub mod quizzes;
