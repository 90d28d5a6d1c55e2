//! VoiceBuddy Library
//!
//! Core modules for the VoiceBuddy conversational voice assistant.

pub mod audio;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod llm;
pub mod qr;
pub mod stt;
pub mod tts;
pub mod weather;
