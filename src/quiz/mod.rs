// src/quiz/mod.rs

pub mod attempt;
pub mod grading;
pub mod integrity;
pub mod reconcile;
pub mod registry;
