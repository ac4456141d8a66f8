//! Newbie Guard Bot Library
//!
//! A group chat guard that verifies newcomers and posts moderation notices.
//!
//! This crate provides the core functionality for:
//! - Loading and validating greeting questions and notification templates
//! - Tracking newcomers until they answer or time out
//! - Rotating notification texts so they do not repeat back to back
//! - Handling moderation commands via chat messages

pub mod admission;
pub mod commands;
pub mod config;
pub mod greeting;
pub mod notification;
pub mod platform;
