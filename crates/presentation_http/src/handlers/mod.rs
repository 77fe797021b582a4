//! HTTP request handlers

pub mod admin;
pub mod articles;
pub mod system;
