//! Core functionality: outline documents, notes drawers, focus mode, dependency checks and configuration

pub mod capture;
pub mod config;
pub mod deps;
pub mod document;
pub mod drawer;
pub mod focus;
pub mod outline;
pub mod wordcount;
