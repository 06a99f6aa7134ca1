//! Gesture synthesis - logical touch sequences to pointer events
//!
//! This crate provides the touch layer of the agent:
//! - Coordinate resolution relative to the screen or an element
//! - Raw down / up / move injection and a reliable long-press
//! - Multi-pointer frame synthesis at a fixed sampling rate, with pinch as
//!   a two-finger instance
//! - Drag, swipe and flick on top of the platform primitives

pub mod errors;
pub mod frames;
pub mod position;
mod synthesizer;
pub mod types;

pub use errors::*;
pub use position::{resolve_point, translate_coordinate};
pub use synthesizer::*;
pub use types::*;
