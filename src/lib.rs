//! Retrans: Reflective Translation Pipeline
//!
//! Translates text in three sequential model calls: a draft translation, an
//! expert critique of that draft, and a refined translation that applies the
//! critique. Each call goes through a [`gateway::CompletionGateway`].

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod pipeline;
pub mod provider;
