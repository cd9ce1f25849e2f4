// src/services/mod.rs

//! Collaborators behind the HTTP layer: context and data providers, the chat
//! client, report rendering and the gamification store.

pub mod chat;
pub mod context;
pub mod gamification;
pub mod nasa_power;
pub mod report;
pub mod soil;
pub mod weather;
