use crate::geometry::{Rect, Vec2};

/// Kinematic state shared by agents and obstacles.
#[derive(Clone, Debug)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    bounds: Rect,
}

impl Body {
    pub fn new(position: Vec2, velocity: Vec2, acceleration: Vec2, size: Vec2) -> Self {
        Self { position, velocity, acceleration, bounds: Rect::from_center(position, size) }
    }

    /// Advance one tick. `dt` scales acceleration only; velocity is applied per tick.
    pub fn advance(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
        self.position += self.velocity;
        self.bounds.center = self.position;
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Move without integrating velocity.
    pub fn place(&mut self, position: Vec2) {
        self.position = position;
        self.bounds.center = position;
    }
}
