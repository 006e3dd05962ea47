use crate::config::PhysicsConfig;
use crate::entity::Body;
use crate::geometry::{Rect, Vec2};
use crate::obstacle::Gate;

pub const SENSOR_COUNT: usize = 4;

/// One simulated bird.
#[derive(Clone, Debug)]
pub struct Agent {
    pub body: Body,
    pub color: [u8; 3],
    jump_velocity: f32,
}

impl Agent {
    pub fn new(physics: &PhysicsConfig, play_width: f32, play_height: f32, color: [u8; 3]) -> Self {
        let body = Body::new(
            Vec2::new(play_width * physics.start_x, play_height * physics.start_y),
            Vec2::ZERO,
            Vec2::new(0.0, physics.gravity),
            Vec2::new(physics.agent_width, physics.agent_height),
        );
        Self { body, color, jump_velocity: physics.jump_velocity }
    }

    /// Overrides the vertical velocity, it does not add to it.
    pub fn jump(&mut self) {
        self.body.velocity.y = self.jump_velocity;
    }

    pub fn bounds(&self) -> Rect {
        self.body.bounds()
    }

    /// Center height, horizontal distance to the gate, and distances to both gap edges.
    pub fn sensors(&self, gate: &Gate) -> [f32; SENSOR_COUNT] {
        let bounds = self.bounds();
        let center_y = bounds.center.y;
        [
            center_y,
            (bounds.left() - gate.right).abs(),
            (center_y - gate.upper_edge).abs(),
            (center_y - gate.lower_edge).abs(),
        ]
    }

    pub fn is_out_of_bounds(&self, play_height: f32) -> bool {
        let bounds = self.bounds();
        bounds.top() < 0.0 || bounds.bottom() > play_height
    }
}
