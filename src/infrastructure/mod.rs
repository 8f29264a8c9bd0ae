//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Ollama: LLM integration for turn outcomes and identities
//! - ComfyUI: character artwork generation
//! - Generator: composition of both behind the generator port
//! - WebSocket: real-time communication with the battle view
//! - Config: application configuration
//! - State: shared application state
//! - Clock: real-time implementation of the clock port

pub mod clock;
pub mod comfyui;
pub mod config;
pub mod generator;
pub mod ollama;
pub mod state;
pub mod websocket;
