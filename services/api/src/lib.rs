pub mod adapters;
pub mod config;
pub mod error;
pub mod pdf;
pub mod stores;
pub mod web;
