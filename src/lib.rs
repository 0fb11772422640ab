//! `cybersim` - Cybersecurity awareness attack simulations
//!
//! This library provides the scenario decks, the session engine that walks a
//! trainee through them, the scoring strategies, and the client for the
//! backend that stores results.

pub mod api;
pub mod cli;
pub mod dashboard;
pub mod deck;
pub mod emitter;
pub mod error;
pub mod observability;
pub mod scoring;
pub mod session;
