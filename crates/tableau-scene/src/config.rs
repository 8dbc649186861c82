use std::time::Duration;

use tableau_engine::paint::Color;

/// Highlight tint drawn over the picked item's mask.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HighlightStyle {
    pub color: Color,
    /// Peak opacity of the shimmer.
    pub shimmer_opacity: f32,
    /// Resting opacity of the tint.
    pub selected_opacity: f32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            color: Color::from_srgb_u8(0xee, 0xb4, 0xff, 0xff),
            shimmer_opacity: 0.8,
            selected_opacity: 0.4,
        }
    }
}

/// Scene tuning. Defaults reproduce the stock interaction timings.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Pick target size in pixels along the viewport's longer side; the
    /// other side follows the viewport aspect.
    pub target_width: u32,
    pub scene_transition: Duration,
    /// Clicks inside this window after a confirmed click are ignored.
    pub click_debounce: Duration,
    pub fade_duration: Duration,
    pub blur_duration: Duration,
    pub blur_samples: u32,
    pub blur_dark_strength: f32,
    pub shift_duration: Duration,
    /// One idle-drift swing between two targets.
    pub drift_period: Duration,
    pub zoom_factor: f32,
    pub zoom_duration: Duration,
    /// Per-frame cursor filter factor; 1.0 follows the pointer exactly.
    pub pointer_smoothing: f32,
    /// Minimum time between mask passes; zero picks every frame.
    pub pick_interval: Duration,
    pub highlight: HighlightStyle,
    pub glow_period: Duration,
    /// Width over height of the authored artwork.
    pub design_aspect: f32,
}

impl SceneConfig {
    /// Sets the transition length and derives the click debounce from it.
    pub fn with_scene_transition(mut self, transition: Duration) -> Self {
        self.scene_transition = transition;
        self.click_debounce = transition * 3 / 2;
        self
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            target_width: 1024,
            scene_transition: Duration::from_millis(250),
            click_debounce: Duration::from_millis(375),
            fade_duration: Duration::from_millis(400),
            blur_duration: Duration::from_millis(400),
            blur_samples: 30,
            blur_dark_strength: 0.8,
            shift_duration: Duration::from_millis(1200),
            drift_period: Duration::from_secs_f32(100.0 / 60.0),
            zoom_factor: 1.5,
            zoom_duration: Duration::from_millis(400),
            pointer_smoothing: 1.0,
            pick_interval: Duration::ZERO,
            highlight: HighlightStyle::default(),
            glow_period: Duration::from_secs(4),
            design_aspect: 1920.0 / 1080.0,
        }
    }
}

/// User-facing toggles, changeable at runtime.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SceneSettings {
    /// Parallax and idle drift.
    pub scene_shift_enabled: bool,
    pub blur_enabled: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            scene_shift_enabled: true,
            blur_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debounce_tracks_transition() {
        let cfg = SceneConfig::default();
        assert_eq!(cfg.click_debounce, cfg.scene_transition * 3 / 2);

        let slow = SceneConfig::default().with_scene_transition(Duration::from_millis(400));
        assert_eq!(slow.click_debounce, Duration::from_millis(600));
    }
}
