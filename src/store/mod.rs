// src/store/mod.rs

pub mod collections;
pub mod profiles;
