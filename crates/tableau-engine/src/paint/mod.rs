//! Color model shared between the scene layer and renderers.

pub mod color;

pub use color::Color;
