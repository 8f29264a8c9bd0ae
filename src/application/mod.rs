//! Application layer - Use cases and the ports they require

pub mod dto;
pub mod ports;
pub mod services;
