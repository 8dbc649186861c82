use crate::color_key::ColorKey;

/// Errors raised while loading or validating a scene definition.
///
/// Frame-time problems (missing textures, failed readbacks) are not errors;
/// they degrade to transparent layers or "no hit" and are logged.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("invalid color key '{0}': expected six hex digits")]
    InvalidColorKey(String),

    #[error("color key {0} is reserved for \"no hit\"")]
    ReservedColorKey(ColorKey),

    #[error("items '{first}' and '{second}' share color key {key}")]
    DuplicateColorKey {
        key: ColorKey,
        first: String,
        second: String,
    },

    #[error("duplicate item name '{0}'")]
    DuplicateItemName(String),

    #[error("layers '{first}' and '{second}' share render order {order}")]
    DuplicateRenderOrder {
        order: i32,
        first: String,
        second: String,
    },

    #[error("layer '{layer}': state '{state}' refers to unknown state '{target}'")]
    UnknownState {
        layer: String,
        state: String,
        target: String,
    },

    #[error("layer '{layer}': state '{state}' has {weights} weights for {targets} next states")]
    WeightMismatch {
        layer: String,
        state: String,
        weights: usize,
        targets: usize,
    },

    #[error("layer '{layer}': state '{state}' has min {min}s > max {max}s")]
    InvalidDuration {
        layer: String,
        state: String,
        min: f32,
        max: f32,
    },

    #[error("failed to parse scene definition: {0}")]
    Parse(#[from] toml::de::Error),
}
