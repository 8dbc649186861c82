//! Scene definitions as loaded from TOML.
//!
//! ```toml
//! scale_addon = 0.05
//!
//! [[layers]]
//! texture = "sky"
//! render_order = 0
//! parallax = 0.01
//! idle_drift = 0.004
//!
//! [[layers]]
//! texture = "foreground"
//! render_order = 2
//! opaque = true
//!
//! [[items]]
//! name = "door"
//! color = "#ff0000"
//! mask = "door_mask"
//! render_order = 0
//! description = "A heavy oak door"
//! ```

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::color_key::ColorKey;
use crate::error::SceneError;

/// Layers, hotspots and global scale of one scene.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneDefinition {
    #[serde(default)]
    pub layers: Vec<LayerDef>,

    #[serde(default)]
    pub items: Vec<ItemDef>,

    /// Extra quad scale so parallax never reveals layer edges.
    #[serde(default)]
    pub scale_addon: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerDef {
    /// Texture name; also addresses the layer in host calls.
    pub texture: String,

    /// Lower is farther.
    pub render_order: i32,

    /// Occludes every farther hotspot wherever it is drawn.
    #[serde(default)]
    pub opaque: bool,

    /// Parallax factor: fraction of the target size the layer moves at full
    /// pointer deflection.
    #[serde(default, alias = "shift_multiplier")]
    pub parallax: f32,

    /// Idle drift range, as a fraction of the target size. 0 disables drift.
    #[serde(default, alias = "animated_idle")]
    pub idle_drift: f32,

    /// Starts at opacity 0.
    #[serde(default)]
    pub hidden: bool,

    /// Starts with its own blur applied (`samples` taps).
    #[serde(default)]
    pub blurred: bool,

    #[serde(default)]
    pub samples: u32,

    #[serde(default)]
    pub variants: Vec<VariantDef>,

    /// Continuous horizontal scroll instead of pointer parallax.
    #[serde(default)]
    pub animate_shift: Option<AnimateShiftDef>,

    /// Animated texture states; the first entry is the initial state.
    #[serde(default)]
    pub states: Vec<TextureStateDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantDef {
    pub name: String,
    pub texture: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimateShiftDef {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    #[serde(default)]
    pub is_left: bool,

    /// Texture widths per 60 Hz frame.
    pub speed: f32,
}

fn enabled_by_default() -> bool {
    true
}

/// One node of an animated texture graph. Durations are in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct TextureStateDef {
    pub texture: String,

    /// Textures of the states this one may transition into.
    #[serde(default, alias = "next_textures")]
    pub next: Vec<String>,

    /// Relative weights for `next`; empty means uniform.
    #[serde(default, alias = "transition_probabilities")]
    pub weights: Vec<f32>,

    pub min_duration: f32,
    pub base_duration: f32,
    pub max_duration: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemDef {
    pub name: String,
    pub color: ColorKey,
    pub mask: String,
    pub render_order: i32,
    #[serde(default)]
    pub description: String,
}

impl SceneDefinition {
    /// Parses and validates a TOML definition.
    pub fn from_toml_str(source: &str) -> Result<Self, SceneError> {
        let def: SceneDefinition = toml::from_str(source)?;
        def.validate()?;
        Ok(def)
    }

    /// Checks every load-time invariant:
    /// - hotspot keys are unique and never `(0, 0, 0)`
    /// - hotspot names are unique
    /// - layer render orders are unique
    /// - animated state graphs are closed and well-formed
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut keys: HashMap<ColorKey, &str> = HashMap::new();
        let mut names: HashSet<&str> = HashSet::new();
        for item in &self.items {
            if item.color.is_none() {
                return Err(SceneError::ReservedColorKey(item.color));
            }
            if let Some(first) = keys.insert(item.color, &item.name) {
                return Err(SceneError::DuplicateColorKey {
                    key: item.color,
                    first: first.to_string(),
                    second: item.name.clone(),
                });
            }
            if !names.insert(&item.name) {
                return Err(SceneError::DuplicateItemName(item.name.clone()));
            }
        }

        let mut orders: HashMap<i32, &str> = HashMap::new();
        for layer in &self.layers {
            if let Some(first) = orders.insert(layer.render_order, &layer.texture) {
                return Err(SceneError::DuplicateRenderOrder {
                    order: layer.render_order,
                    first: first.to_string(),
                    second: layer.texture.clone(),
                });
            }
            layer.validate_states()?;
        }

        Ok(())
    }
}

impl LayerDef {
    fn validate_states(&self) -> Result<(), SceneError> {
        let known: HashSet<&str> = self.states.iter().map(|s| s.texture.as_str()).collect();
        for state in &self.states {
            if let Some(target) = state.next.iter().find(|t| !known.contains(t.as_str())) {
                return Err(SceneError::UnknownState {
                    layer: self.texture.clone(),
                    state: state.texture.clone(),
                    target: target.clone(),
                });
            }
            if !state.weights.is_empty() && state.weights.len() != state.next.len() {
                return Err(SceneError::WeightMismatch {
                    layer: self.texture.clone(),
                    state: state.texture.clone(),
                    weights: state.weights.len(),
                    targets: state.next.len(),
                });
            }
            if state.min_duration > state.max_duration {
                return Err(SceneError::InvalidDuration {
                    layer: self.texture.clone(),
                    state: state.texture.clone(),
                    min: state.min_duration,
                    max: state.max_duration,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LAYERS: &str = r##"
        scale_addon = 0.05

        [[layers]]
        texture = "sky"
        render_order = 0
        parallax = 0.01
        idle_drift = 0.004

        [[layers]]
        texture = "front"
        render_order = 1
        opaque = true
        hidden = true

        [[items]]
        name = "door"
        color = "#ff0000"
        mask = "door_mask"
        render_order = 0
        description = "A heavy oak door"
    "##;

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn parses_layers_and_items() {
        let def = SceneDefinition::from_toml_str(TWO_LAYERS).unwrap();
        assert_eq!(def.layers.len(), 2);
        assert!(def.layers[1].opaque && def.layers[1].hidden);
        assert_eq!(def.items[0].color, ColorKey::new(255, 0, 0));
        assert!((def.scale_addon - 0.05).abs() < 1e-6);
    }

    #[test]
    fn accepts_legacy_field_aliases() {
        let def = SceneDefinition::from_toml_str(
            r#"
            [[layers]]
            texture = "bg"
            render_order = 0
            shift_multiplier = 0.02
            animated_idle = 0.01

            [[layers.states]]
            texture = "bg"
            next_textures = ["bg"]
            transition_probabilities = [1.0]
            min_duration = 1.0
            base_duration = 2.0
            max_duration = 3.0
            "#,
        )
        .unwrap();
        assert!((def.layers[0].parallax - 0.02).abs() < 1e-6);
        assert!((def.layers[0].idle_drift - 0.01).abs() < 1e-6);
        assert_eq!(def.layers[0].states[0].weights, vec![1.0]);
    }

    #[test]
    fn bad_hex_is_a_parse_error() {
        let err = SceneDefinition::from_toml_str(
            r#"
            [[items]]
            name = "x"
            color = "red"
            mask = "m"
            render_order = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }

    // ── validation ────────────────────────────────────────────────────────

    fn item(name: &str, color: ColorKey) -> ItemDef {
        ItemDef {
            name: name.into(),
            color,
            mask: format!("{name}_mask"),
            render_order: 0,
            description: String::new(),
        }
    }

    #[test]
    fn duplicate_color_keys_are_rejected() {
        let def = SceneDefinition {
            items: vec![item("a", ColorKey::new(1, 2, 3)), item("b", ColorKey::new(1, 2, 3))],
            ..Default::default()
        };
        match def.validate() {
            Err(SceneError::DuplicateColorKey { first, second, .. }) => {
                assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn black_is_reserved() {
        let def = SceneDefinition {
            items: vec![item("a", ColorKey::NONE)],
            ..Default::default()
        };
        assert!(matches!(def.validate(), Err(SceneError::ReservedColorKey(_))));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let def = SceneDefinition {
            items: vec![item("a", ColorKey::new(1, 0, 0)), item("a", ColorKey::new(2, 0, 0))],
            ..Default::default()
        };
        assert!(matches!(def.validate(), Err(SceneError::DuplicateItemName(n)) if n == "a"));
    }

    #[test]
    fn duplicate_render_orders_are_rejected() {
        let src = r#"
            [[layers]]
            texture = "a"
            render_order = 3
            [[layers]]
            texture = "b"
            render_order = 3
        "#;
        assert!(matches!(
            SceneDefinition::from_toml_str(src),
            Err(SceneError::DuplicateRenderOrder { order: 3, .. })
        ));
    }

    #[test]
    fn state_graph_must_be_closed() {
        let src = r#"
            [[layers]]
            texture = "fire"
            render_order = 0
            [[layers.states]]
            texture = "fire_a"
            next = ["fire_b"]
            min_duration = 0.1
            base_duration = 0.2
            max_duration = 0.3
        "#;
        assert!(matches!(
            SceneDefinition::from_toml_str(src),
            Err(SceneError::UnknownState { target, .. }) if target == "fire_b"
        ));
    }

    #[test]
    fn weights_must_match_targets() {
        let src = r#"
            [[layers]]
            texture = "fire"
            render_order = 0
            [[layers.states]]
            texture = "fire_a"
            next = ["fire_a"]
            weights = [0.5, 0.5]
            min_duration = 0.1
            base_duration = 0.2
            max_duration = 0.3
        "#;
        assert!(matches!(
            SceneDefinition::from_toml_str(src),
            Err(SceneError::WeightMismatch { weights: 2, targets: 1, .. })
        ));
    }
}
