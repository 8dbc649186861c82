//! Scene files: a [`SceneDefinition`] plus an optional `[scene]` table of
//! [`SceneConfig`] overrides.
//!
//! ```toml
//! [scene]
//! target_width = 512
//! blur_ms = 300
//!
//! [[layers]]
//! texture = "sky"
//! render_order = 0
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tableau_scene::{SceneConfig, SceneDefinition};

pub struct SceneFile {
    pub definition: SceneDefinition,
    pub config: SceneConfig,
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    scene: SceneOverrides,
}

/// Millisecond fields map onto the `Duration` fields of the same stem.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SceneOverrides {
    target_width: Option<u32>,
    scene_transition_ms: Option<u64>,
    fade_ms: Option<u64>,
    blur_ms: Option<u64>,
    blur_samples: Option<u32>,
    blur_dark_strength: Option<f32>,
    shift_ms: Option<u64>,
    drift_period_ms: Option<u64>,
    zoom_factor: Option<f32>,
    zoom_ms: Option<u64>,
    pointer_smoothing: Option<f32>,
    pick_interval_ms: Option<u64>,
    glow_period_ms: Option<u64>,
    design_aspect: Option<f32>,
}

impl SceneOverrides {
    fn apply(&self, mut cfg: SceneConfig) -> SceneConfig {
        let ms = Duration::from_millis;

        if let Some(v) = self.scene_transition_ms {
            cfg = cfg.with_scene_transition(ms(v));
        }
        if let Some(v) = self.target_width {
            cfg.target_width = v;
        }
        if let Some(v) = self.fade_ms {
            cfg.fade_duration = ms(v);
        }
        if let Some(v) = self.blur_ms {
            cfg.blur_duration = ms(v);
        }
        if let Some(v) = self.blur_samples {
            cfg.blur_samples = v;
        }
        if let Some(v) = self.blur_dark_strength {
            cfg.blur_dark_strength = v;
        }
        if let Some(v) = self.shift_ms {
            cfg.shift_duration = ms(v);
        }
        if let Some(v) = self.drift_period_ms {
            cfg.drift_period = ms(v);
        }
        if let Some(v) = self.zoom_factor {
            cfg.zoom_factor = v;
        }
        if let Some(v) = self.zoom_ms {
            cfg.zoom_duration = ms(v);
        }
        if let Some(v) = self.pointer_smoothing {
            cfg.pointer_smoothing = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.pick_interval_ms {
            cfg.pick_interval = ms(v);
        }
        if let Some(v) = self.glow_period_ms {
            cfg.glow_period = ms(v);
        }
        if let Some(v) = self.design_aspect {
            cfg.design_aspect = v;
        }
        cfg
    }
}

pub fn parse(source: &str) -> Result<SceneFile> {
    let definition = SceneDefinition::from_toml_str(source).context("invalid scene definition")?;
    let manifest: Manifest = toml::from_str(source).context("invalid [scene] table")?;
    Ok(SceneFile {
        definition,
        config: manifest.scene.apply(SceneConfig::default()),
    })
}

pub fn load(path: &Path) -> Result<SceneFile> {
    let source = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse(&source).with_context(|| format!("loading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r##"
[scene]
target_width = 512
scene_transition_ms = 400
blur_ms = 300
pointer_smoothing = 4.0

[[layers]]
texture = "sky"
render_order = 0

[[items]]
name = "door"
color = "#ff0000"
mask = "door_mask"
render_order = 0
"##;

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let file = parse(SCENE).unwrap();
        let cfg = &file.config;

        assert_eq!(cfg.target_width, 512);
        assert_eq!(cfg.blur_duration, Duration::from_millis(300));
        assert_eq!(cfg.click_debounce, Duration::from_millis(600));
        assert_eq!(cfg.pointer_smoothing, 1.0);
        assert_eq!(cfg.fade_duration, SceneConfig::default().fade_duration);

        assert_eq!(file.definition.layers.len(), 1);
        assert_eq!(file.definition.items[0].name, "door");
    }

    #[test]
    fn scene_table_is_optional() {
        let file = parse("[[layers]]\ntexture = \"sky\"\nrender_order = 0\n").unwrap();
        assert_eq!(file.config.target_width, SceneConfig::default().target_width);
    }

    #[test]
    fn unknown_override_is_rejected() {
        assert!(parse("[scene]\nblur_seconds = 2\n").is_err());
    }

    #[test]
    fn invalid_definition_is_rejected() {
        let src = r##"
[[items]]
name = "void"
color = "#000000"
mask = "m"
render_order = 0
"##;
        assert!(parse(src).is_err());
    }
}
