//! Layered interactive scenes.
//!
//! A scene is a stack of parallax layers plus a set of color-keyed hotspots.
//! Every frame the scene renders the hotspot masks into an offscreen target,
//! reads back the texel under the pointer, discards hits hidden behind nearer
//! layers, and emits edge-triggered hover/click events for the host.
//!
//! GPU work sits behind [`pick::PickSurface`]; [`gpu::GpuPickSurface`] is the
//! wgpu implementation and [`pick::SoftPickSurface`] rasterizes on the CPU.

pub mod color_key;
pub mod compositor;
pub mod config;
pub mod definition;
pub mod drift;
pub mod error;
pub mod gpu;
pub mod hit;
pub mod layer;
pub mod pick;
pub mod quad;
pub mod registry;
pub mod scene;
pub mod tween;

pub use color_key::ColorKey;
pub use compositor::Compositor;
pub use config::{HighlightStyle, SceneConfig, SceneSettings};
pub use definition::SceneDefinition;
pub use error::SceneError;
pub use hit::{HitTester, Pick};
pub use layer::Layer;
pub use registry::{InteractiveItem, ItemId, ItemRegistry};
pub use scene::{ClickState, CursorHint, Scene, SceneEvent};
