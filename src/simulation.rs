use crate::error::{SimError, SimResult};
use crate::matchmaker::MatchBuilder;
use crate::outcome::OutcomeModel;
use crate::pool::PlayerPool;
use crate::rating::RatingUpdater;
use crate::reset::ResetPolicy;
use crate::stats::{SeasonOutcome, SeasonReport, SimulationStats};
use crate::types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Main simulation state and season scheduler
pub struct Simulation {
    /// Run configuration (validated)
    pub config: SimulationConfig,
    /// Every player of the run
    pub pool: PlayerPool,
    /// Running statistics
    pub stats: SimulationStats,
    /// One report per completed season
    pub reports: Vec<SeasonReport>,
    matchmaker: MatchBuilder,
    outcome_model: OutcomeModel,
    updater: RatingUpdater,
    /// Single random source for the whole run
    rng: StdRng,
    /// Global season counter
    season: usize,
}

impl Simulation {
    pub fn new(config: SimulationConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;

        Ok(Self {
            pool: PlayerPool::new(config.max_players),
            stats: SimulationStats::default(),
            reports: Vec::new(),
            matchmaker: MatchBuilder::from_config(&config),
            outcome_model: OutcomeModel::new(config.outcome_weights),
            updater: RatingUpdater::new(),
            rng: StdRng::seed_from_u64(seed),
            season: 0,
            config,
        })
    }

    /// Replace the configuration. The population is kept; the pool cap is
    /// only used for future growth.
    pub fn update_config(&mut self, config: SimulationConfig) -> SimResult<()> {
        config.validate()?;
        if config.max_players < self.pool.len() {
            return Err(SimError::InvalidConfiguration(format!(
                "max_players {} is below the current population {}",
                config.max_players,
                self.pool.len()
            )));
        }

        self.pool.set_max_players(config.max_players);
        self.matchmaker = MatchBuilder::from_config(&config);
        self.outcome_model = OutcomeModel::new(config.outcome_weights);
        self.config = config;
        Ok(())
    }

    /// Add players to the pool; fails without side effects past the cap
    pub fn add_players(
        &mut self,
        count: usize,
        starting_mmr: i64,
        starting_skill: i64,
        skill_jitter: i64,
    ) -> SimResult<Range<usize>> {
        let added = self
            .pool
            .add_players(count, starting_mmr, starting_skill, skill_jitter, &mut self.rng)?;
        self.stats.players_added += added.len();
        Ok(added)
    }

    /// Add up to `count` players, truncating to the remaining capacity.
    /// Returns how many were actually added.
    pub fn grow_population(&mut self, count: usize, phase: &PhaseConfig) -> usize {
        let result = self.add_players(count, phase.starting_mmr, phase.starting_skill, phase.skill_jitter);
        match result {
            Ok(added) => added.len(),
            Err(SimError::CapacityExceeded { requested, available, cap }) => {
                self.stats.capacity_rejections += 1;
                log::warn!(
                    "Population cap {} reached: adding {} of {} requested players",
                    cap,
                    available,
                    requested
                );
                self.add_players(available, phase.starting_mmr, phase.starting_skill, phase.skill_jitter)
                    .map(|added| added.len())
                    .unwrap_or(0)
            }
            Err(e) => {
                log::warn!("Population growth failed: {}", e);
                0
            }
        }
    }

    /// Build, resolve and apply a single match
    pub fn play_match(&mut self) -> SimResult<Side> {
        let mut game = self.matchmaker.build_match(&self.pool, &mut self.rng)?;
        let (winner, probability_a) = self.outcome_model.resolve(&mut game, &mut self.rng);
        self.updater.apply_result(&game, &mut self.pool);
        self.stats.record_match(winner == Side::A, probability_a);

        #[cfg(feature = "debug")]
        log::trace!(
            "Match A(mmr {}, skill {}) vs B(mmr {}, skill {}): p(A)={:.1}% winner {:?}",
            game.team_a.mmr,
            game.team_a.real_skill,
            game.team_b.mmr,
            game.team_b.real_skill,
            probability_a,
            winner
        );

        Ok(winner)
    }

    /// Run `factor * population` matches back to back (saturating). The
    /// population is read once at the start; failed builds are skipped.
    pub fn run_season(&mut self, games_per_player_factor: usize) -> SeasonOutcome {
        let num_matches = season_length(games_per_player_factor, self.pool.len());
        let mut outcome = SeasonOutcome::default();

        for _ in 0..num_matches {
            match self.play_match() {
                Ok(_) => outcome.matches_played += 1,
                Err(e) => {
                    outcome.matches_skipped += 1;
                    self.stats.skipped_matches += 1;
                    log::debug!("Skipping match: {}", e);
                }
            }
        }

        self.stats.seasons_completed += 1;
        log::debug!(
            "Season {} finished: {} played, {} skipped",
            self.season,
            outcome.matches_played,
            outcome.matches_skipped
        );
        outcome
    }

    pub fn apply_reset(&mut self, policy: &ResetPolicy) {
        policy.apply(&mut self.pool);
    }

    /// Inject the phase's initial wave, then repeat
    /// {trickle, season, reset, report} for the configured iterations.
    pub fn run_phase(&mut self, phase: Phase, phase_config: &PhaseConfig) {
        log::info!(
            "Starting phase {:?}: wave of {} at mmr {}",
            phase,
            phase_config.initial_wave,
            phase_config.starting_mmr
        );
        self.grow_population(phase_config.initial_wave, phase_config);

        for iteration in 0..phase_config.iterations {
            let trickle = self.rng.gen_range(0..=phase_config.max_trickle);
            self.grow_population(trickle, phase_config);

            let outcome = self.run_season(phase_config.games_per_player_factor);
            self.apply_reset(&phase_config.reset);

            let report = SeasonReport::new(self.season, phase, iteration, outcome, self.pool.snapshot());
            log::info!(
                "Season {} ({:?} #{}) done: {} players, median mmr {:.1}",
                report.season,
                phase,
                iteration,
                report.population,
                report.median_mmr
            );
            self.reports.push(report);
            self.season += 1;
        }
    }

    /// Full run: low-start phase with its reset, then high-start phase with
    /// its reset. Returns the season reports accumulated so far.
    pub fn run_simulation(&mut self) -> &[SeasonReport] {
        let phase_a = self.config.phase_a.clone();
        let phase_b = self.config.phase_b.clone();

        self.run_phase(Phase::LowStart, &phase_a);
        self.run_phase(Phase::HighStart, &phase_b);

        log::info!(
            "Simulation finished: {} seasons, {} matches, {} skipped",
            self.stats.seasons_completed,
            self.stats.total_matches,
            self.stats.skipped_matches
        );
        &self.reports
    }

    pub fn snapshot(&self) -> Vec<PlayerSnapshot> {
        self.pool.snapshot()
    }

    /// Values of one tracked field across the current population
    pub fn field_values(&self, field: TrackedField) -> Vec<f64> {
        field.series(&self.snapshot())
    }

    pub fn current_season(&self) -> usize {
        self.season
    }

    /// Get current simulation state as JSON
    pub fn get_state_json(&self) -> String {
        serde_json::to_string(&SimulationState {
            season: self.season,
            total_players: self.pool.len(),
            stats: self.stats.clone(),
            config: self.config.clone(),
        })
        .unwrap_or_default()
    }
}

/// Matches in a season of `population` players
pub fn season_length(games_per_player_factor: usize, population: usize) -> usize {
    games_per_player_factor.saturating_mul(population)
}

#[derive(Serialize, Deserialize)]
pub struct SimulationState {
    pub season: usize,
    pub total_players: usize,
    pub stats: SimulationStats,
    pub config: SimulationConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::MAX_MMR_SWING;

    fn small_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.max_players = 400;
        config.phase_a = PhaseConfig {
            initial_wave: 120,
            max_trickle: 10,
            iterations: 3,
            ..PhaseConfig::low_start()
        };
        config.phase_b = PhaseConfig {
            initial_wave: 150,
            max_trickle: 10,
            iterations: 3,
            ..PhaseConfig::high_start()
        };
        config
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = SimulationConfig::default();
        config.max_mmr_distance = -5;
        assert!(matches!(
            Simulation::new(config, 1),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_play_match_updates_six_players() {
        let mut sim = Simulation::new(SimulationConfig::default(), 42).unwrap();
        sim.add_players(6, 100, 100, 0).unwrap();

        sim.play_match().unwrap();
        assert_eq!(sim.stats.total_matches, 1);
        assert!(sim.pool.players().iter().all(|p| p.games_played == 1));

        let winners = sim.pool.players().iter().filter(|p| p.mmr == 118).count();
        let losers = sim.pool.players().iter().filter(|p| p.mmr == 82).count();
        assert_eq!((winners, losers), (3, 3));
    }

    #[test]
    fn test_run_season_match_count_uses_start_population() {
        let mut sim = Simulation::new(SimulationConfig::default(), 7).unwrap();
        sim.add_players(60, 500, 500, 50).unwrap();

        let outcome = sim.run_season(2);
        assert_eq!(outcome.matches_played + outcome.matches_skipped, 120);
        assert_eq!(sim.stats.seasons_completed, 1);
    }

    #[test]
    fn test_season_length_saturates() {
        assert_eq!(season_length(2, 60), 120);
        assert_eq!(season_length(usize::MAX / 2, 6), usize::MAX);
        assert_eq!(season_length(usize::MAX, 0), 0);
    }

    #[test]
    fn test_huge_factor_on_empty_pool_plays_nothing() {
        let mut sim = Simulation::new(SimulationConfig::default(), 7).unwrap();
        let outcome = sim.run_season(usize::MAX / 2);
        assert_eq!(outcome, SeasonOutcome::default());
        assert_eq!(sim.stats.seasons_completed, 1);
    }

    #[test]
    fn test_run_season_skips_unbuildable_matches() {
        let mut config = SimulationConfig::default();
        config.max_anchor_attempts = 2;
        config.max_samples_per_anchor = 10;
        let mut sim = Simulation::new(config, 3).unwrap();
        // Too few players for a 3v3
        sim.add_players(4, 500, 500, 0).unwrap();

        let outcome = sim.run_season(1);
        assert_eq!(outcome.matches_played, 0);
        assert_eq!(outcome.matches_skipped, 4);
        assert_eq!(sim.stats.skipped_matches, 4);
    }

    #[test]
    fn test_grow_population_truncates_at_cap() {
        let mut config = SimulationConfig::default();
        config.max_players = 10;
        let mut sim = Simulation::new(config, 3).unwrap();
        let phase = PhaseConfig::low_start();

        assert_eq!(sim.grow_population(8, &phase), 8);
        assert_eq!(sim.grow_population(8, &phase), 2);
        assert_eq!(sim.pool.len(), 10);
        assert_eq!(sim.stats.capacity_rejections, 1);
        assert_eq!(sim.grow_population(1, &phase), 0);
    }

    #[test]
    fn test_full_simulation_reports_and_invariants() {
        let mut sim = Simulation::new(small_config(), 2024).unwrap();
        let reports = sim.run_simulation().to_vec();

        assert_eq!(reports.len(), 6);
        assert!(reports[..3].iter().all(|r| r.phase == Phase::LowStart));
        assert!(reports[3..].iter().all(|r| r.phase == Phase::HighStart));
        for (i, report) in reports.iter().enumerate() {
            assert_eq!(report.season, i);
            assert_eq!(report.population, report.players.len());
            for player in &report.players {
                assert!(player.mmr >= 0);
                assert!((SIGMA_MIN..=SIGMA_MAX).contains(&player.sigma));
            }
        }
        // Phase A ends with a hard-cap reset
        assert!(reports[2].players.iter().all(|p| p.mmr <= 1200));
        // Population only grows
        assert!(reports.windows(2).all(|w| w[0].population <= w[1].population));
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = Simulation::new(small_config(), 99).unwrap();
        let mut b = Simulation::new(small_config(), 99).unwrap();
        a.run_simulation();
        b.run_simulation();
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_mmr_swing_is_bounded_per_match() {
        let mut sim = Simulation::new(SimulationConfig::default(), 5).unwrap();
        sim.add_players(30, 10, 300, 100).unwrap();

        for _ in 0..200 {
            let before = sim.pool.mmr_values();
            if sim.play_match().is_ok() {
                for (old, new) in before.iter().zip(sim.pool.mmr_values()) {
                    assert!((new - old).abs() <= MAX_MMR_SWING);
                    assert!(new >= 0);
                }
            }
        }
    }

    #[test]
    fn test_update_config_keeps_population() {
        let mut sim = Simulation::new(SimulationConfig::default(), 1).unwrap();
        sim.add_players(20, 500, 500, 0).unwrap();

        let mut config = SimulationConfig::default();
        config.max_players = 25;
        config.outcome_weights = OutcomeWeights::balanced();
        sim.update_config(config).unwrap();
        assert_eq!(sim.pool.len(), 20);
        assert_eq!(sim.pool.remaining_capacity(), 5);

        let mut too_small = SimulationConfig::default();
        too_small.max_players = 10;
        assert!(sim.update_config(too_small).is_err());
    }
}
