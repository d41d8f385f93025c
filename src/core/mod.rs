//! Configuration, shared models, and collaborator ports

pub mod config;
pub mod models;
pub mod ports;
