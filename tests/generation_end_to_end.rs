mod common;

use common::{Policy, centered_gaps, hover, idle};
use flappy_neuroevolution::{GenerationState, Phase, Termination};

#[test]
fn falling_agent_dies_when_it_drops_below_the_play_area() {
    let config = centered_gaps();
    let mut state = GenerationState::new(&config, 1, vec![idle as Policy], 1);

    // y(n) = start + g * n(n+1)/2 with no jumps; death is the first n whose bottom edge passes 720.
    let start = config.play_height() * config.physics.start_y;
    let half_height = config.physics.agent_height / 2.0;
    let expected = (1u64..)
        .find(|&n| start + config.physics.gravity * (n * (n + 1)) as f32 / 2.0 + half_height > 720.0)
        .expect("agent eventually falls");
    assert_eq!(expected, 35);

    for tick in 1..expected {
        assert_eq!(state.step(1.0), None, "agent died early on tick {tick}");
        let pilot = &state.pilots()[0];
        assert_eq!(pilot.agent.bounds().center, pilot.agent.body.position);
    }
    assert_eq!(state.step(1.0), Some(Termination::Extinct));
    assert_eq!(state.ticks(), expected);
    assert_eq!(state.alive(), 0);

    let fitness = state.into_fitness();
    assert!((fitness[0] - (expected as f32 * 0.01 - 1.0)).abs() < 1e-4);
}

#[test]
fn hovering_agent_scores_on_the_tick_it_clears_the_first_pipe() {
    let config = centered_gaps();
    let mut state = GenerationState::new(&config, 1, vec![hover as Policy], 1);

    // First pipe's right edge starts at 1360 and scrolls 3 units per tick; the agent's
    // left edge sits at 359, so it clears the pipe on tick 334.
    for _ in 0..333 {
        assert_eq!(state.step(1.0), None);
    }
    assert_eq!(state.score(), 0);
    assert_eq!(state.next_gate(), 0);
    assert!(!state.obstacles().top()[0].passed());

    assert_eq!(state.step(1.0), None);
    assert_eq!(state.score(), 1);
    assert_eq!(state.next_gate(), 1);
    assert!(state.obstacles().top()[0].passed());
    assert!((state.fitness()[0] - (334.0 * 0.01 + 10.0)).abs() < 1e-3);

    assert_eq!(state.step(1.0), None);
    assert_eq!(state.score(), 1);
}

#[test]
fn hovering_agent_runs_until_the_score_cap() {
    let config = centered_gaps();
    let mut state = GenerationState::new(&config, 1, vec![hover as Policy], 1);

    let mut termination = None;
    for _ in 0..5_000 {
        termination = state.step(1.0);
        if termination.is_some() {
            break;
        }
    }

    assert_eq!(termination, Some(Termination::ScoreCap));
    assert_eq!(state.phase(), Phase::Terminated(Termination::ScoreCap));
    assert_eq!(state.score(), config.run.score_cap + 1);
    assert_eq!(state.alive(), 1);
    assert!(state.fitness()[0] > 16.0 * 10.0);
}

#[test]
fn generation_wiped_out_on_first_tick_skips_scoring() {
    // The agent starts past the first pipe, so scoring would trigger if it survived.
    let mut config = centered_gaps();
    config.physics.start_x = 1.2;

    let mut survivor = GenerationState::new(&config, 1, vec![idle as Policy], 1);
    assert_eq!(survivor.step(1.0), None);
    assert_eq!(survivor.score(), 1);
    assert!((survivor.fitness()[0] - 10.01).abs() < 1e-4);

    config.screen.height = 40;
    let mut doomed = GenerationState::new(&config, 1, vec![idle as Policy; 3], 1);
    assert_eq!(doomed.step(1.0), Some(Termination::Extinct));
    assert_eq!(doomed.ticks(), 1);
    assert_eq!(doomed.score(), 0);
    assert_eq!(doomed.next_gate(), 0);
    assert!(!doomed.obstacles().top()[0].passed());
    for fitness in doomed.into_fitness() {
        assert!((fitness - (0.01 - 1.0)).abs() < 1e-6);
    }
}

#[test]
fn obstacles_are_recycled_once_off_screen() {
    let config = centered_gaps();
    let mut state = GenerationState::new(&config, 1, vec![hover as Policy], 1);

    let mut max_pairs = 0;
    for _ in 0..1_200 {
        assert_eq!(state.step(1.0), None);
        let obstacles = state.obstacles();
        assert_eq!(obstacles.top().len(), obstacles.bottom().len());
        assert!(obstacles.top().iter().all(|obstacle| obstacle.bounds().right() > 0.0));
        assert!(state.next_gate() <= obstacles.len());
        max_pairs = max_pairs.max(obstacles.len());
    }
    // 1360 units of travel at 3 per tick with a pair every 120 ticks.
    assert!(max_pairs <= 5, "{max_pairs} pairs alive at once");
    assert!(state.score() >= 7);
}
