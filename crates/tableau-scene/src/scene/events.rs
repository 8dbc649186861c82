use tableau_engine::coords::Vec2;

/// Notifications for the host UI, buffered until [`super::Scene::drain_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// The hovered item changed; `None` when the pointer left all items.
    HoverItem(Option<String>),
    /// Description of the newly hovered item.
    HoverDescription(Option<String>),
    /// A click resolved; `None` for clicks on empty space.
    SceneClick(Option<String>),
    /// A layer moved; feeds animators that follow layer motion.
    TextureShift { render_order: i32, offset: Vec2 },
}

impl SceneEvent {
    /// Wire name used by hosts that dispatch events by string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HoverItem(_) => "hover_item",
            Self::HoverDescription(_) => "hover_description",
            Self::SceneClick(_) => "scene_click",
            Self::TextureShift { .. } => "texture_shift",
        }
    }
}

/// Cursor shape the host should show.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CursorHint {
    #[default]
    Default,
    Pointer,
}
