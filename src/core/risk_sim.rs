use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::models::{Direction, Setup};

const MAX_STEPS: usize = 48;
pub const DEFAULT_ITERATIONS: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Percent of paths that hit the stop first.
    pub ruin_probability: f64,
    /// Percent of paths that hit the first target first.
    pub success_probability: f64,
    /// Percent of paths still between stop and target after the horizon.
    pub neutral_probability: f64,
    /// 0-100 composite: success weighted up, ruin weighted down.
    pub safety_score: f64,
    pub median_pnl: f64,
    pub iterations: usize,
}

impl SimulationResult {
    /// Safe default for setups that cannot be simulated.
    fn degenerate() -> Self {
        Self {
            ruin_probability: 0.0,
            success_probability: 0.0,
            neutral_probability: 0.0,
            safety_score: 100.0,
            median_pnl: 0.0,
            iterations: 0,
        }
    }
}

enum PathEnd {
    Target(f64),
    Stop(f64),
    Neutral(f64),
}

/// Random-walk Monte Carlo over a setup's entry/stop/first-target geometry.
/// Each step is an approximate standard normal (sum of six uniforms,
/// recentered and scaled) applied at a quarter-ATR step size.
pub struct RiskSimulator {
    pub iterations: usize,
}

impl RiskSimulator {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    pub fn run(&self, setup: &Setup, atr: f64, rng: &mut impl Rng) -> SimulationResult {
        let entry = setup.entry.optimal;
        let target = match setup.first_target() {
            Some(t) => t,
            None => return SimulationResult::degenerate(),
        };
        if entry <= 0.0 || atr <= 0.0 || (setup.stop - entry).abs() < f64::EPSILON {
            return SimulationResult::degenerate();
        }

        let step_size = atr / 4.0;
        let mut tp_hits = 0usize;
        let mut sl_hits = 0usize;
        let mut pnls: Vec<f64> = Vec::with_capacity(self.iterations);

        for _ in 0..self.iterations {
            match walk_path(entry, setup.stop, target, setup.direction, step_size, rng) {
                PathEnd::Target(p) => {
                    tp_hits += 1;
                    pnls.push(signed_pnl(entry, p, setup.direction));
                }
                PathEnd::Stop(p) => {
                    sl_hits += 1;
                    pnls.push(signed_pnl(entry, p, setup.direction));
                }
                PathEnd::Neutral(p) => pnls.push(signed_pnl(entry, p, setup.direction)),
            }
        }

        let total = self.iterations as f64;
        let ruin = round2(sl_hits as f64 / total * 100.0);
        let success = round2(tp_hits as f64 / total * 100.0);
        let neutral = round2((self.iterations - tp_hits - sl_hits) as f64 / total * 100.0);
        let safety = round2((success * 1.5 - ruin * 0.5).clamp(0.0, 100.0));

        SimulationResult {
            ruin_probability: ruin,
            success_probability: success,
            neutral_probability: neutral,
            safety_score: safety,
            median_pnl: round4(median(&mut pnls)),
            iterations: self.iterations,
        }
    }

    /// Reproducible run for tests and audit replays.
    pub fn run_seeded(&self, setup: &Setup, atr: f64, seed: u64) -> SimulationResult {
        let mut rng = StdRng::seed_from_u64(seed);
        self.run(setup, atr, &mut rng)
    }
}

impl Default for RiskSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

fn walk_path(
    entry: f64,
    stop: f64,
    target: f64,
    direction: Direction,
    step_size: f64,
    rng: &mut impl Rng,
) -> PathEnd {
    let mut price = entry;
    for _ in 0..MAX_STEPS {
        let gauss: f64 = ((0..6).map(|_| rng.gen::<f64>()).sum::<f64>() - 3.0) / 1.5;
        price += step_size * gauss;

        match direction {
            Direction::Bullish => {
                if price >= target {
                    return PathEnd::Target(target);
                }
                if price <= stop {
                    return PathEnd::Stop(stop);
                }
            }
            Direction::Bearish => {
                if price <= target {
                    return PathEnd::Target(target);
                }
                if price >= stop {
                    return PathEnd::Stop(stop);
                }
            }
        }
    }
    PathEnd::Neutral(price)
}

fn signed_pnl(entry: f64, exit: f64, direction: Direction) -> f64 {
    match direction {
        Direction::Bullish => exit - entry,
        Direction::Bearish => entry - exit,
    }
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round4(x: f64) -> f64 {
    (x * 10000.0).round() / 10000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryZone, Timeframe};

    fn long_setup(entry: f64, stop: f64, target: f64) -> Setup {
        Setup {
            symbol: "BTC-USD".to_string(),
            timeframe: Timeframe::H1,
            direction: Direction::Bullish,
            strategy: "breaker".to_string(),
            entry: EntryZone {
                optimal: entry,
                tolerance: entry * 0.001,
            },
            stop,
            targets: vec![target],
            risk_reward: (target - entry) / (entry - stop),
            confidence: 0.7,
            edge_score: None,
            breakdown: None,
        }
    }

    #[test]
    fn probabilities_sum_to_hundred() {
        let sim = RiskSimulator::new(1000);
        let setup = long_setup(100.0, 95.0, 110.0);
        for seed in [1u64, 7, 42, 99] {
            let r = sim.run_seeded(&setup, 2.0, seed);
            let sum = r.ruin_probability + r.success_probability + r.neutral_probability;
            assert!((sum - 100.0).abs() < 0.11, "seed {seed}: sum {sum}");
        }
    }

    #[test]
    fn same_seed_is_reproducible() {
        let sim = RiskSimulator::new(500);
        let setup = long_setup(100.0, 95.0, 110.0);
        let a = sim.run_seeded(&setup, 2.0, 1234);
        let b = sim.run_seeded(&setup, 2.0, 1234);
        assert_eq!(a.ruin_probability, b.ruin_probability);
        assert_eq!(a.success_probability, b.success_probability);
        assert_eq!(a.median_pnl, b.median_pnl);
    }

    #[test]
    fn nearer_stop_raises_ruin() {
        let sim = RiskSimulator::new(1000);
        let tight = sim.run_seeded(&long_setup(100.0, 99.0, 110.0), 2.0, 7);
        let wide = sim.run_seeded(&long_setup(100.0, 90.0, 110.0), 2.0, 7);
        assert!(
            tight.ruin_probability > wide.ruin_probability,
            "tight stop {} should ruin more than wide stop {}",
            tight.ruin_probability,
            wide.ruin_probability
        );
    }

    #[test]
    fn safety_score_bounded() {
        let sim = RiskSimulator::new(1000);
        for (stop, target) in [(99.5, 120.0), (90.0, 100.5), (95.0, 105.0)] {
            let r = sim.run_seeded(&long_setup(100.0, stop, target), 2.0, 3);
            assert!((0.0..=100.0).contains(&r.safety_score));
        }
    }

    #[test]
    fn short_setup_walks_inverted() {
        let sim = RiskSimulator::new(1000);
        let mut setup = long_setup(100.0, 101.0, 95.0);
        setup.direction = Direction::Bearish;
        let r = sim.run_seeded(&setup, 2.0, 11);
        // Near stop above, far target below: stop-outs dominate
        assert!(r.ruin_probability > r.success_probability);
    }

    #[test]
    fn degenerate_setups_short_circuit() {
        let sim = RiskSimulator::new(1000);

        let mut no_targets = long_setup(100.0, 95.0, 110.0);
        no_targets.targets.clear();
        let r = sim.run_seeded(&no_targets, 2.0, 1);
        assert_eq!(r.iterations, 0);
        assert!((r.safety_score - 100.0).abs() < 1e-9);
        assert!((r.ruin_probability - 0.0).abs() < 1e-9);

        let zero_stop_distance = long_setup(100.0, 100.0, 110.0);
        let r = sim.run_seeded(&zero_stop_distance, 2.0, 1);
        assert_eq!(r.iterations, 0);

        let r = sim.run_seeded(&long_setup(100.0, 95.0, 110.0), 0.0, 1);
        assert_eq!(r.iterations, 0, "zero ATR cannot walk");
    }
}
