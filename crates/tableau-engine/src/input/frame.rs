use std::collections::HashSet;

use super::types::{InputEvent, Key, MouseButton, PointerButtonEvent};

/// Per-frame input deltas.
///
/// `InputState` holds the current state (held keys/buttons, pointer position);
/// `InputFrame` holds what changed since the last frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,

    pub buttons_pressed: HashSet<MouseButton>,
    pub buttons_released: HashSet<MouseButton>,

    /// True when at least one pointer move arrived this frame.
    pub pointer_moved: bool,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.pointer_moved = false;
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    /// Button releases with their positions, in arrival order. A release is
    /// what a scene treats as a click.
    pub fn releases(&self, button: MouseButton) -> impl Iterator<Item = &PointerButtonEvent> + '_ {
        self.events.iter().filter_map(move |ev| match ev {
            InputEvent::PointerButton(pb)
                if pb.button == button && pb.state == super::MouseButtonState::Released =>
            {
                Some(pb)
            }
            _ => None,
        })
    }
}
