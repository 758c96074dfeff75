//! Command handlers

pub mod backup;
pub mod book;
pub mod collection;
pub mod config;
pub mod reading;
pub mod stats;
pub mod status;
pub mod transfer;
