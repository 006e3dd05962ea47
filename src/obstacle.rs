use rand::Rng;
use tracing::debug;

use crate::config::ObstacleConfig;
use crate::entity::Body;
use crate::geometry::{Rect, Vec2};

/// One half of a pipe pair.
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub body: Body,
    pub is_bottom: bool,
    passed: bool,
}

impl Obstacle {
    /// `edge_y` is the bottom edge of a top obstacle or the top edge of a bottom one.
    /// The obstacle enters from the right with its left edge on `spawn_x`.
    fn new(config: &ObstacleConfig, spawn_x: f32, edge_y: f32, is_bottom: bool) -> Self {
        let half = config.height / 2.0;
        let center_y = if is_bottom { edge_y + half } else { edge_y - half };
        let body = Body::new(
            Vec2::new(spawn_x + config.width / 2.0, center_y),
            Vec2::new(-config.scroll_speed, 0.0),
            Vec2::ZERO,
            Vec2::new(config.width, config.height),
        );
        Self { body, is_bottom, passed: false }
    }

    pub fn bounds(&self) -> Rect {
        self.body.bounds()
    }

    pub fn passed(&self) -> bool {
        self.passed
    }
}

/// The part of a pipe pair the sensors look at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gate {
    pub right: f32,
    /// Bottom edge of the top obstacle.
    pub upper_edge: f32,
    /// Top edge of the bottom obstacle.
    pub lower_edge: f32,
}

/// Fires on a fixed interval of accumulated elapsed time.
#[derive(Clone, Debug)]
pub struct SpawnTimer {
    interval_ms: f32,
    elapsed_ms: f32,
}

impl SpawnTimer {
    pub fn new(interval_ms: f32) -> Self {
        Self { interval_ms, elapsed_ms: 0.0 }
    }

    /// Returns how many spawns are due after `elapsed_ms` more time. Non-finite or
    /// negative readings are dropped, and a timer without a positive interval never fires.
    pub fn advance(&mut self, elapsed_ms: f32) -> usize {
        if !(elapsed_ms.is_finite() && elapsed_ms >= 0.0 && self.interval_ms > 0.0) {
            return 0;
        }
        self.elapsed_ms += elapsed_ms;
        let mut fired = 0;
        while self.elapsed_ms >= self.interval_ms {
            self.elapsed_ms -= self.interval_ms;
            fired += 1;
        }
        fired
    }
}

/// Top and bottom obstacles kept as parallel, equal-length sequences, plus the scoring gate.
#[derive(Clone, Debug)]
pub struct ObstacleField {
    config: ObstacleConfig,
    play_width: f32,
    play_height: f32,
    top: Vec<Obstacle>,
    bottom: Vec<Obstacle>,
    next_gate: usize,
}

impl ObstacleField {
    pub fn new(config: ObstacleConfig, play_width: f32, play_height: f32) -> Self {
        Self {
            config,
            play_width,
            play_height,
            top: Vec::new(),
            bottom: Vec::new(),
            next_gate: 0,
        }
    }

    /// Spawn a pair whose gap center is sampled uniformly around mid-height.
    pub fn spawn_pair(&mut self, rng: &mut impl Rng) {
        let mid = self.play_height / 2.0;
        let band = self.config.gap_band;
        let center = if band > 0.0 { rng.gen_range(mid - band..=mid + band) } else { mid };
        self.spawn_pair_at(center);
    }

    pub fn spawn_pair_at(&mut self, center_y: f32) {
        let half_gap = self.config.gap / 2.0;
        debug!(center_y, pairs = self.top.len() + 1, "spawning obstacle pair");
        self.top.push(Obstacle::new(&self.config, self.play_width, center_y - half_gap, false));
        self.bottom.push(Obstacle::new(&self.config, self.play_width, center_y + half_gap, true));
    }

    pub fn advance(&mut self, dt: f32) {
        for obstacle in self.top.iter_mut().chain(self.bottom.iter_mut()) {
            obstacle.body.advance(dt);
        }
    }

    /// Drop pairs that scrolled off the left edge and shift the gate index down to match.
    /// Returns the number of pairs removed.
    pub fn recycle(&mut self) -> usize {
        let before = self.top.len();
        self.top.retain(|obstacle| obstacle.bounds().right() > 0.0);
        self.bottom.retain(|obstacle| obstacle.bounds().right() > 0.0);
        let removed = before - self.top.len();
        if removed > 0 {
            self.next_gate = self.next_gate.saturating_sub(removed);
        }
        removed
    }

    /// Whether `rect` overlaps any live obstacle.
    pub fn collides(&self, rect: &Rect) -> bool {
        self.top.iter().chain(self.bottom.iter()).any(|obstacle| obstacle.bounds().intersects(rect))
    }

    /// The gate sensors read: the next unscored pair, or a virtual gate at the right edge
    /// centered on the play area when none is live.
    pub fn gate(&self) -> Gate {
        match (self.top.get(self.next_gate), self.bottom.get(self.next_gate)) {
            (Some(top), Some(bottom)) => Gate {
                right: top.bounds().right(),
                upper_edge: top.bounds().bottom(),
                lower_edge: bottom.bounds().top(),
            },
            _ => {
                let half_gap = self.config.gap / 2.0;
                Gate {
                    right: self.play_width,
                    upper_edge: self.play_height / 2.0 - half_gap,
                    lower_edge: self.play_height / 2.0 + half_gap,
                }
            }
        }
    }

    /// Right edge of the scoring gate, if any, with its passed flag.
    pub fn scoring_gate(&self) -> Option<(f32, bool)> {
        self.top.get(self.next_gate).map(|top| (top.bounds().right(), top.passed))
    }

    /// Flag the current gate pair as passed. Returns false if it already was.
    pub fn mark_gate_passed(&mut self) -> bool {
        let index = self.next_gate;
        match (self.top.get_mut(index), self.bottom.get_mut(index)) {
            (Some(top), Some(bottom)) if !top.passed => {
                top.passed = true;
                bottom.passed = true;
                true
            }
            _ => false,
        }
    }

    /// Move the gate to the next pair once the current one has been passed.
    pub fn advance_gate_if_passed(&mut self) -> bool {
        if self.scoring_gate().is_some_and(|(_, passed)| passed) {
            self.next_gate += 1;
            true
        } else {
            false
        }
    }

    pub fn next_gate(&self) -> usize {
        self.next_gate
    }

    pub fn top(&self) -> &[Obstacle] {
        &self.top
    }

    pub fn bottom(&self) -> &[Obstacle] {
        &self.bottom
    }

    pub fn len(&self) -> usize {
        self.top.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn set_next_gate(&mut self, index: usize) {
        self.next_gate = index;
    }
}
