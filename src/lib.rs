pub mod error;
pub mod experiment;
pub mod matchmaker;
pub mod outcome;
pub mod pool;
pub mod rating;
pub mod reset;
pub mod simulation;
pub mod stats;
pub mod types;

pub use error::{SimError, SimResult};
pub use experiment::{RunSummary, SweepParameter};
pub use reset::ResetPolicy;
pub use simulation::Simulation;
pub use types::*;

use wasm_bindgen::prelude::*;

#[cfg(feature = "debug")]
const LOG_LEVEL: log::Level = log::Level::Trace;
#[cfg(not(feature = "debug"))]
const LOG_LEVEL: log::Level = log::Level::Info;

/// Initialize panic hook and console logging. Safe to call more than once.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // A logger may already be installed
    let _ = console_log::init_with_level(LOG_LEVEL);
}

fn to_js(err: SimError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_config(config_json: &str) -> Result<SimulationConfig, JsValue> {
    serde_json::from_str(config_json)
        .map_err(|e| JsValue::from_str(&format!("Config parse error: {}", e)))
}

/// Season reports without the per-player snapshots
fn report_summaries(reports: &[stats::SeasonReport]) -> Vec<serde_json::Value> {
    reports
        .iter()
        .map(|r| {
            serde_json::json!({
                "season": r.season,
                "phase": r.phase,
                "iteration": r.iteration,
                "matches_played": r.matches_played,
                "matches_skipped": r.matches_skipped,
                "population": r.population,
                "mean_mmr": r.mean_mmr,
                "median_mmr": r.median_mmr,
                "mmr_p90": r.mmr_p90,
            })
        })
        .collect()
}

/// WASM-exposed simulation wrapper
#[wasm_bindgen]
pub struct SimulationEngine {
    sim: Simulation,
}

#[wasm_bindgen]
impl SimulationEngine {
    /// Create a new simulation with default config
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<SimulationEngine, JsValue> {
        let sim = Simulation::new(SimulationConfig::default(), seed).map_err(to_js)?;
        Ok(SimulationEngine { sim })
    }

    /// Create with custom config
    pub fn new_with_config(seed: u64, config_json: &str) -> Result<SimulationEngine, JsValue> {
        let config = parse_config(config_json)?;
        let sim = Simulation::new(config, seed).map_err(to_js)?;
        Ok(SimulationEngine { sim })
    }

    /// Add players; returns the id of the first new player
    pub fn add_players(
        &mut self,
        count: usize,
        starting_mmr: i32,
        starting_skill: i32,
        skill_jitter: i32,
    ) -> Result<usize, JsValue> {
        self.sim
            .add_players(
                count,
                i64::from(starting_mmr),
                i64::from(starting_skill),
                i64::from(skill_jitter),
            )
            .map(|added| added.start)
            .map_err(to_js)
    }

    /// Run one season; returns played/skipped counts as JSON
    pub fn run_season(&mut self, games_per_player_factor: usize) -> String {
        let outcome = self.sim.run_season(games_per_player_factor);
        serde_json::to_string(&outcome).unwrap_or_default()
    }

    /// Play a single match; returns "A" or "B"
    pub fn play_match(&mut self) -> Result<String, JsValue> {
        self.sim
            .play_match()
            .map(|side| format!("{:?}", side))
            .map_err(to_js)
    }

    pub fn hard_cap_reset(&mut self, cap: i32) -> Result<(), JsValue> {
        let policy = ResetPolicy::HardCap { cap: i64::from(cap) };
        policy.validate().map_err(to_js)?;
        self.sim.apply_reset(&policy);
        Ok(())
    }

    pub fn median_squish_reset(&mut self, squish_factor: f64) -> Result<(), JsValue> {
        let policy = ResetPolicy::MedianSquish { factor: squish_factor };
        policy.validate().map_err(to_js)?;
        self.sim.apply_reset(&policy);
        Ok(())
    }

    /// Run both phases; returns per-season summaries as JSON
    pub fn run_simulation(&mut self) -> String {
        let reports = self.sim.run_simulation();
        serde_json::to_string(&report_summaries(reports)).unwrap_or_default()
    }

    /// Get current simulation state as JSON
    pub fn get_state(&self) -> String {
        self.sim.get_state_json()
    }

    pub fn get_season(&self) -> usize {
        self.sim.current_season()
    }

    pub fn get_total_players(&self) -> usize {
        self.sim.pool.len()
    }

    /// Get statistics JSON
    pub fn get_stats(&self) -> String {
        serde_json::to_string(&self.sim.stats).unwrap_or_default()
    }

    /// Current player snapshot as JSON
    pub fn get_snapshot(&self) -> String {
        serde_json::to_string(&self.sim.snapshot()).unwrap_or_default()
    }

    /// Full report (with player snapshots) for one season
    pub fn get_report(&self, season: usize) -> Result<String, JsValue> {
        let report = self
            .sim
            .reports
            .get(season)
            .ok_or_else(|| JsValue::from_str(&format!("Season {} has no report", season)))?;
        serde_json::to_string(report)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Values of one tracked field ("mmr", "real_skill", "games_played",
    /// "sigma", "streak") across the current population
    pub fn get_field_values(&self, field: &str) -> Result<js_sys::Float64Array, JsValue> {
        let field: TrackedField = serde_json::from_value(serde_json::Value::String(field.to_string()))
            .map_err(|_| JsValue::from_str(&format!("Unknown field: {}", field)))?;
        let values = self.sim.field_values(field);
        Ok(js_sys::Float64Array::from(values.as_slice()))
    }

    /// Get mmr histogram (for visualization)
    pub fn get_mmr_histogram(&self, num_bins: usize) -> String {
        let values = self.sim.field_values(TrackedField::Mmr);
        let histogram: Vec<_> = stats::histogram(&values, num_bins)
            .into_iter()
            .map(|(start, end, count)| {
                serde_json::json!({
                    "bin_start": start,
                    "bin_end": end,
                    "count": count,
                })
            })
            .collect();
        serde_json::to_string(&histogram).unwrap_or_default()
    }

    /// Reset statistics (keep population)
    pub fn reset_stats(&mut self) {
        self.sim.stats = stats::SimulationStats::default();
    }

    /// Update simulation config
    pub fn update_config(&mut self, config_json: &str) -> Result<(), JsValue> {
        let config = parse_config(config_json)?;
        self.sim.update_config(config).map_err(to_js)
    }

    /// Get default config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&SimulationConfig::default()).unwrap_or_default()
    }
}

/// Run a parameter sweep experiment
#[wasm_bindgen]
pub fn run_experiment(
    base_config_json: &str,
    parameter: &str,
    values_json: &str,
    seed: u64,
) -> Result<String, JsValue> {
    let base_config = parse_config(base_config_json)?;
    let parameter: SweepParameter =
        serde_json::from_value(serde_json::Value::String(parameter.to_string()))
            .map_err(|_| JsValue::from_str(&format!("Unknown parameter: {}", parameter)))?;
    let values: Vec<f64> = serde_json::from_str(values_json)
        .map_err(|e| JsValue::from_str(&format!("Values parse error: {}", e)))?;

    let results = experiment::run_sweep(&base_config, parameter, &values, seed).map_err(to_js)?;

    serde_json::to_string(&results)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Compare two configs, typically differing only in reset policy
#[wasm_bindgen]
pub fn compare_configs(config_a_json: &str, config_b_json: &str, seed: u64) -> Result<String, JsValue> {
    let config_a = parse_config(config_a_json)
        .map_err(|_| JsValue::from_str("Config A parse error"))?;
    let config_b = parse_config(config_b_json)
        .map_err(|_| JsValue::from_str("Config B parse error"))?;

    let (summary_a, summary_b) = experiment::compare_configs(config_a, config_b, seed).map_err(to_js)?;

    let comparison = serde_json::json!({
        "config_a": summary_a,
        "config_b": summary_b,
    });

    serde_json::to_string(&comparison)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
