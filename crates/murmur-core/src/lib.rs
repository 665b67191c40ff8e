//! Murmur Core — shared domain abstractions.
//!
//! This crate defines the notification event model and the fundamental
//! traits and error types the delivery subsystem depends on. It contains
//! no infrastructure code.

pub mod clock;
pub mod error;
pub mod event;
pub mod identity;
