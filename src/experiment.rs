use crate::error::SimResult;
use crate::reset::ResetPolicy;
use crate::simulation::Simulation;
use crate::stats::{mean, median, percentile};
use crate::types::{OutcomeWeights, SimulationConfig};
use serde::{Deserialize, Serialize};

/// Configuration knobs a parameter sweep can vary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    /// Squish factor of the high-start phase reset
    SquishFactor,
    /// Cap of the low-start phase reset
    HardCap,
    MaxMmrDistance,
    /// Skill weight; the mmr weight becomes `1 - value`
    SkillWeight,
}

impl SweepParameter {
    pub fn apply(&self, config: &mut SimulationConfig, value: f64) {
        match self {
            SweepParameter::SquishFactor => {
                config.phase_b.reset = ResetPolicy::MedianSquish { factor: value };
            }
            SweepParameter::HardCap => {
                config.phase_a.reset = ResetPolicy::HardCap { cap: value.round() as i64 };
            }
            SweepParameter::MaxMmrDistance => config.max_mmr_distance = value.round() as i64,
            SweepParameter::SkillWeight => {
                config.outcome_weights = OutcomeWeights {
                    mmr: 1.0 - value,
                    skill: value,
                };
            }
        }
    }
}

/// Final distribution summary of one run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub parameter_value: Option<f64>,
    pub population: usize,
    pub seasons: usize,
    pub total_matches: usize,
    pub skipped_matches: usize,
    pub mean_mmr: f64,
    pub median_mmr: f64,
    pub mmr_p90: f64,
    pub mean_real_skill: f64,
}

impl RunSummary {
    fn from_simulation(sim: &Simulation, parameter_value: Option<f64>) -> Self {
        let mmrs = sim.pool.mmr_values();
        let skills: Vec<i64> = sim.pool.players().iter().map(|p| p.real_skill).collect();
        Self {
            parameter_value,
            population: sim.pool.len(),
            seasons: sim.stats.seasons_completed,
            total_matches: sim.stats.total_matches,
            skipped_matches: sim.stats.skipped_matches,
            mean_mmr: mean(&mmrs).unwrap_or(0.0),
            median_mmr: median(&mmrs).unwrap_or(0.0),
            mmr_p90: percentile(&mmrs, 0.9).unwrap_or(0.0),
            mean_real_skill: mean(&skills).unwrap_or(0.0),
        }
    }
}

/// Run the full simulation once per value, each with seed `seed + i`
/// (wrapping, so every `u64` seed is usable)
pub fn run_sweep(
    base: &SimulationConfig,
    parameter: SweepParameter,
    values: &[f64],
    seed: u64,
) -> SimResult<Vec<RunSummary>> {
    let mut results = Vec::with_capacity(values.len());

    for (i, &value) in values.iter().enumerate() {
        let mut config = base.clone();
        parameter.apply(&mut config, value);

        let mut sim = Simulation::new(config, seed.wrapping_add(i as u64))?;
        sim.run_simulation();
        log::info!("Sweep {:?} = {} finished", parameter, value);
        results.push(RunSummary::from_simulation(&sim, Some(value)));
    }

    Ok(results)
}

/// Run two configurations from the same seed
pub fn compare_configs(
    config_a: SimulationConfig,
    config_b: SimulationConfig,
    seed: u64,
) -> SimResult<(RunSummary, RunSummary)> {
    let mut sim_a = Simulation::new(config_a, seed)?;
    let mut sim_b = Simulation::new(config_b, seed)?;
    sim_a.run_simulation();
    sim_b.run_simulation();
    Ok((
        RunSummary::from_simulation(&sim_a, None),
        RunSummary::from_simulation(&sim_b, None),
    ))
}
