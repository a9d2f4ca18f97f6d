//! Polarimetric image composition.
//!
//! Photos of one scene taken through a polarizer rotated by a fixed step between shots are
//! folded into a single HSV image: hue marks the polarizer angle where each pixel was brightest,
//! saturation how strongly its brightness varied, and value its mean brightness.

pub mod cli;
pub mod compose;
pub mod error;
pub mod hsv;
pub mod intensity;
pub mod polarimetric;
pub mod render;
pub mod source;
