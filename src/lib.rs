//! Library entry point for the manifest-images CLI.

pub mod collector;
pub mod commands;
pub mod config;
pub mod error;
pub mod manifest;
pub mod model;
pub mod scanner;
