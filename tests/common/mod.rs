#![allow(dead_code)]

use flappy_neuroevolution::SimConfig;

pub type Policy = fn(&[f32]) -> Vec<f32>;

/// Never jumps.
pub fn idle(_: &[f32]) -> Vec<f32> {
    vec![0.0]
}

/// Jumps once the agent sinks more than 40 units below the middle of the gap ahead.
pub fn hover(inputs: &[f32]) -> Vec<f32> {
    let (to_upper_edge, to_lower_edge) = (inputs[2], inputs[3]);
    vec![if to_upper_edge > to_lower_edge + 80.0 { 1.0 } else { 0.0 }]
}

/// Default play area with every gap centered on mid-height.
pub fn centered_gaps() -> SimConfig {
    let mut config = SimConfig::default();
    config.obstacles.gap_band = 0.0;
    config.run.seed = Some(17);
    config
}
