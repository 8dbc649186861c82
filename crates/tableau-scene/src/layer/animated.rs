use std::f32::consts::TAU;

use rand::Rng;
use tableau_engine::texture::TextureId;

use crate::definition::TextureStateDef;

#[derive(Debug, Clone)]
struct State {
    name: String,
    texture: Option<TextureId>,
    /// (state index, weight)
    next: Vec<(usize, f32)>,
    weighted: bool,
    min: f32,
    base: f32,
    max: f32,
}

/// A layer texture that hops between states of a small graph.
///
/// The following state is chosen as soon as a state is entered; the switch
/// happens once the sampled duration has elapsed.
#[derive(Debug, Clone)]
pub struct AnimatedTexture {
    states: Vec<State>,
    current: usize,
    upcoming: usize,
    remaining: f32,
}

impl AnimatedTexture {
    /// Returns `None` for an empty graph. Edges to unknown states are dropped.
    pub fn new(
        defs: &[TextureStateDef],
        mut resolve: impl FnMut(&str) -> Option<TextureId>,
        rng: &mut impl Rng,
    ) -> Option<Self> {
        if defs.is_empty() {
            return None;
        }

        let states = defs
            .iter()
            .map(|def| {
                let weighted = def.weights.len() == def.next.len() && !def.weights.is_empty();
                let next = def
                    .next
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| {
                        let idx = defs.iter().position(|d| &d.texture == name)?;
                        let w = if weighted { def.weights[i].max(0.0) } else { 1.0 };
                        Some((idx, w))
                    })
                    .collect();
                State {
                    name: def.texture.clone(),
                    texture: resolve(&def.texture),
                    next,
                    weighted,
                    min: def.min_duration.min(def.max_duration),
                    base: def.base_duration,
                    max: def.max_duration.max(def.min_duration),
                }
            })
            .collect();

        let mut anim = Self {
            states,
            current: 0,
            upcoming: 0,
            remaining: 0.0,
        };
        anim.enter(0, rng);
        Some(anim)
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.states[self.current].texture
    }

    pub fn state_name(&self) -> &str {
        &self.states[self.current].name
    }

    pub fn upcoming_name(&self) -> &str {
        &self.states[self.upcoming].name
    }

    /// Seconds left in the current state.
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Advances by `dt` seconds. Returns true if the state changed.
    pub fn advance(&mut self, dt: f32, rng: &mut impl Rng) -> bool {
        self.remaining -= dt.max(0.0);
        if self.remaining > 0.0 {
            return false;
        }
        let prev = self.current;
        self.enter(self.upcoming, rng);
        prev != self.current
    }

    fn enter(&mut self, index: usize, rng: &mut impl Rng) {
        self.current = index;
        let state = &self.states[index];
        self.upcoming = pick_next(state, rng).unwrap_or(index);
        self.remaining = sample_duration(state, rng);
    }
}

fn pick_next(state: &State, rng: &mut impl Rng) -> Option<usize> {
    if state.next.is_empty() {
        return None;
    }
    if !state.weighted {
        return Some(state.next[rng.gen_range(0..state.next.len())].0);
    }

    let total: f32 = state.next.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Some(state.next[rng.gen_range(0..state.next.len())].0);
    }

    let mut roll = rng.r#gen::<f32>() * total;
    for &(idx, w) in &state.next {
        if roll < w {
            return Some(idx);
        }
        roll -= w;
    }
    state.next.last().map(|&(idx, _)| idx)
}

/// `base + N(0,1)·(max−min)/4`, clamped to `[min, max]`.
fn sample_duration(state: &State, rng: &mut impl Rng) -> f32 {
    let spread = (state.max - state.min) / 4.0;
    (state.base + standard_normal(rng) * spread).clamp(state.min, state.max)
}

/// Box–Muller.
fn standard_normal(rng: &mut impl Rng) -> f32 {
    let u1 = 1.0 - rng.r#gen::<f32>(); // (0, 1]
    let u2 = rng.r#gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn state(name: &str, next: &[&str], weights: &[f32]) -> TextureStateDef {
        TextureStateDef {
            texture: name.into(),
            next: next.iter().map(|s| s.to_string()).collect(),
            weights: weights.to_vec(),
            min_duration: 0.5,
            base_duration: 1.0,
            max_duration: 1.5,
        }
    }

    #[test]
    fn empty_graph_is_none() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(AnimatedTexture::new(&[], |_| None, &mut rng).is_none());
    }

    #[test]
    fn durations_stay_clamped() {
        let mut rng = StdRng::seed_from_u64(11);
        let s = State {
            name: "a".into(),
            texture: None,
            next: vec![],
            weighted: false,
            min: 0.5,
            base: 1.0,
            max: 1.5,
        };
        for _ in 0..2_000 {
            let d = sample_duration(&s, &mut rng);
            assert!((0.5..=1.5).contains(&d), "{d}");
        }
    }

    #[test]
    fn weighted_choice_follows_normalized_weights() {
        let mut rng = StdRng::seed_from_u64(21);
        let s = State {
            name: "a".into(),
            texture: None,
            next: vec![(1, 3.0), (2, 1.0)],
            weighted: true,
            min: 0.5,
            base: 1.0,
            max: 1.5,
        };
        let runs = 4_000;
        let to_b = (0..runs)
            .filter(|_| pick_next(&s, &mut rng) == Some(1))
            .count();
        let share = to_b as f32 / runs as f32;
        assert!((0.72..=0.78).contains(&share), "{share}");
    }

    #[test]
    fn dead_end_state_stays_put() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut anim = AnimatedTexture::new(&[state("idle", &[], &[])], |_| None, &mut rng).unwrap();
        assert!(!anim.advance(10.0, &mut rng));
        assert_eq!(anim.state_name(), "idle");
    }

    #[test]
    fn zero_weight_edge_is_never_taken() {
        let mut rng = StdRng::seed_from_u64(9);
        let defs = [
            state("a", &["b", "c"], &[1.0, 0.0]),
            state("b", &["a"], &[]),
            state("c", &["a"], &[]),
        ];
        let mut anim = AnimatedTexture::new(&defs, |_| None, &mut rng).unwrap();
        for _ in 0..200 {
            anim.advance(2.0, &mut rng);
            assert_ne!(anim.state_name(), "c");
        }
    }

    #[test]
    fn switches_to_preselected_state_after_duration() {
        let mut rng = StdRng::seed_from_u64(2);
        let defs = [state("a", &["b"], &[]), state("b", &["a"], &[])];
        let mut anim = AnimatedTexture::new(&defs, |_| None, &mut rng).unwrap();
        assert_eq!(anim.upcoming_name(), "b");

        assert!(!anim.advance(0.1, &mut rng));
        assert!(anim.advance(1.5, &mut rng));
        assert_eq!(anim.state_name(), "b");
        assert_eq!(anim.upcoming_name(), "a");
    }
}
