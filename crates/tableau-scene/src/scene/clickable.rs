/// Whether the scene currently reacts to the pointer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ClickState {
    #[default]
    Active,
    Suspended,
}

/// Tracks the two reasons for suspension; either one suspends.
#[derive(Debug, Copy, Clone, Default)]
pub struct Clickability {
    modal_open: bool,
    transitioning: bool,
}

impl Clickability {
    pub fn state(&self) -> ClickState {
        if self.modal_open || self.transitioning {
            ClickState::Suspended
        } else {
            ClickState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == ClickState::Active
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Returns the new state if it changed.
    pub fn set_modal_open(&mut self, open: bool) -> Option<ClickState> {
        self.update(|c| c.modal_open = open)
    }

    /// Returns the new state if it changed.
    pub fn set_transitioning(&mut self, transitioning: bool) -> Option<ClickState> {
        self.update(|c| c.transitioning = transitioning)
    }

    fn update(&mut self, f: impl FnOnce(&mut Self)) -> Option<ClickState> {
        let before = self.state();
        f(self);
        let after = self.state();
        (before != after).then_some(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn either_reason_suspends() {
        let mut c = Clickability::default();
        assert_eq!(c.state(), ClickState::Active);

        assert_eq!(c.set_modal_open(true), Some(ClickState::Suspended));
        assert_eq!(c.set_transitioning(true), None);
        assert_eq!(c.set_modal_open(false), None);
        assert_eq!(c.set_transitioning(false), Some(ClickState::Active));
    }
}
