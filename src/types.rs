use crate::error::{SimError, SimResult};
use crate::reset::ResetPolicy;
use serde::{Deserialize, Serialize};

/// Upper bound of the rating volatility scalar (fresh players)
pub const SIGMA_MAX: f64 = 3.5;
/// Lower bound of the rating volatility scalar (settled players)
pub const SIGMA_MIN: f64 = 2.5;
/// Anchors tried before a match build is abandoned
pub const DEFAULT_MAX_ANCHOR_ATTEMPTS: usize = 8;
/// Candidate draws per anchor
pub const DEFAULT_MAX_SAMPLES_PER_ANCHOR: usize = 2000;

/// A simulated competitor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Monotonic id, equal to the player's index in the pool
    pub id: usize,
    /// Visible rating used for matchmaking
    pub mmr: i64,
    /// Hidden skill, only consulted by the outcome model
    pub real_skill: i64,
    pub games_played: u32,
    /// Rating volatility in [SIGMA_MIN, SIGMA_MAX]
    pub sigma: f64,
    /// Positive = win run length, negative = loss run length
    pub streak: i32,
    /// Inert: carried on the record but never computed or read.
    pub desire_to_play: f64,
}

impl Player {
    pub fn new(id: usize, mmr: i64, real_skill: i64) -> Self {
        Self {
            id,
            mmr,
            real_skill,
            games_played: 0,
            sigma: SIGMA_MAX,
            streak: 0,
            desire_to_play: 0.0,
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            mmr: self.mmr,
            real_skill: self.real_skill,
            games_played: self.games_played,
            sigma: self.sigma,
            streak: self.streak,
        }
    }
}

/// Read-only view of a player handed to reporting collaborators
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: usize,
    pub mmr: i64,
    pub real_skill: i64,
    pub games_played: u32,
    pub sigma: f64,
    pub streak: i32,
}

/// Numeric player fields a reporting collaborator can ask for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Mmr,
    RealSkill,
    GamesPlayed,
    Sigma,
    Streak,
}

impl TrackedField {
    pub const ALL: [TrackedField; 5] = [
        TrackedField::Mmr,
        TrackedField::RealSkill,
        TrackedField::GamesPlayed,
        TrackedField::Sigma,
        TrackedField::Streak,
    ];

    pub fn value(&self, snapshot: &PlayerSnapshot) -> f64 {
        match self {
            TrackedField::Mmr => snapshot.mmr as f64,
            TrackedField::RealSkill => snapshot.real_skill as f64,
            TrackedField::GamesPlayed => f64::from(snapshot.games_played),
            TrackedField::Sigma => snapshot.sigma,
            TrackedField::Streak => f64::from(snapshot.streak),
        }
    }

    /// Extract this field from every snapshot, preserving order
    pub fn series(&self, snapshots: &[PlayerSnapshot]) -> Vec<f64> {
        snapshots.iter().map(|s| self.value(s)).collect()
    }
}

/// One side of a match. Holds player ids, not the players themselves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub player_ids: Vec<usize>,
    /// Truncated mean of member mmr
    pub mmr: i64,
    /// Truncated mean of member real skill
    pub real_skill: i64,
    /// True when this team won
    pub result: bool,
}

impl Team {
    /// Build a team and its aggregates from member records
    pub fn from_players(players: &[&Player]) -> Self {
        let count = players.len().max(1) as i64;
        let mmr_sum: i64 = players.iter().map(|p| p.mmr).sum();
        let skill_sum: i64 = players.iter().map(|p| p.real_skill).sum();

        Self {
            player_ids: players.iter().map(|p| p.id).collect(),
            // Integer division truncates toward zero
            mmr: mmr_sum / count,
            real_skill: skill_sum / count,
            result: false,
        }
    }

    pub fn size(&self) -> usize {
        self.player_ids.len()
    }
}

/// Which side of a match won
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

/// Two teams formed together and resolved once
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub team_a: Team,
    pub team_b: Team,
}

impl Match {
    pub fn new(team_a: Team, team_b: Team) -> Self {
        Self { team_a, team_b }
    }

    /// Mark exactly one team as the winner
    pub fn set_winner(&mut self, side: Side) {
        self.team_a.result = side == Side::A;
        self.team_b.result = side == Side::B;
    }

    pub fn winner(&self) -> Option<Side> {
        match (self.team_a.result, self.team_b.result) {
            (true, false) => Some(Side::A),
            (false, true) => Some(Side::B),
            _ => None,
        }
    }

    pub fn teams(&self) -> [&Team; 2] {
        [&self.team_a, &self.team_b]
    }

    pub fn player_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.team_a
            .player_ids
            .iter()
            .chain(self.team_b.player_ids.iter())
            .copied()
    }
}

/// Simulation phases, distinguished by starting rating of the injected wave
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    LowStart,
    HighStart,
}

/// Weights of the composite score used for win probability
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeWeights {
    pub mmr: f64,
    pub skill: f64,
}

impl OutcomeWeights {
    /// Equal weighting of rating and hidden skill
    pub fn balanced() -> Self {
        Self { mmr: 0.5, skill: 0.5 }
    }
}

impl Default for OutcomeWeights {
    fn default() -> Self {
        Self { mmr: 0.2, skill: 0.8 }
    }
}

/// Parameters of one simulation phase
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Rating assigned to players injected during this phase
    pub starting_mmr: i64,
    /// Base hidden skill for injected players
    pub starting_skill: i64,
    /// Uniform jitter applied to starting skill (inclusive on both ends)
    pub skill_jitter: i64,
    /// Players injected once at phase start
    pub initial_wave: usize,
    /// Upper bound of the random number of players added before each season
    pub max_trickle: usize,
    /// Number of season + reset cycles
    pub iterations: usize,
    /// Matches per season = factor * player count at season start
    pub games_per_player_factor: usize,
    /// Reset applied after each season
    pub reset: ResetPolicy,
}

impl PhaseConfig {
    pub fn low_start() -> Self {
        Self {
            starting_mmr: 600,
            starting_skill: 600,
            skill_jitter: 200,
            initial_wave: 1000,
            max_trickle: 50,
            iterations: 10,
            games_per_player_factor: 1,
            reset: ResetPolicy::HardCap { cap: 1200 },
        }
    }

    pub fn high_start() -> Self {
        Self {
            starting_mmr: 1000,
            starting_skill: 400,
            skill_jitter: 200,
            initial_wave: 3000,
            max_trickle: 50,
            iterations: 10,
            games_per_player_factor: 1,
            reset: ResetPolicy::MedianSquish { factor: 0.5 },
        }
    }

    fn validate(&self, name: &str) -> SimResult<()> {
        if self.skill_jitter < 0 {
            return Err(SimError::InvalidConfiguration(format!(
                "{name}: skill_jitter must be non-negative, got {}",
                self.skill_jitter
            )));
        }
        if self.starting_mmr < 0 {
            return Err(SimError::InvalidConfiguration(format!(
                "{name}: starting_mmr must be non-negative, got {}",
                self.starting_mmr
            )));
        }
        self.reset
            .validate()
            .map_err(|e| SimError::InvalidConfiguration(format!("{name}: {e}")))
    }
}

/// Full configuration of a simulation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub players_per_team: usize,
    /// Candidates must satisfy |candidate.mmr - anchor.mmr| < this
    pub max_mmr_distance: i64,
    /// Hard cap on population size
    pub max_players: usize,
    pub outcome_weights: OutcomeWeights,
    /// Anchors tried before a match build is abandoned
    pub max_anchor_attempts: usize,
    /// Candidate draws per anchor before moving on
    pub max_samples_per_anchor: usize,
    pub phase_a: PhaseConfig,
    pub phase_b: PhaseConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            players_per_team: 3,
            max_mmr_distance: 100,
            max_players: 10_000,
            outcome_weights: OutcomeWeights::default(),
            max_anchor_attempts: DEFAULT_MAX_ANCHOR_ATTEMPTS,
            max_samples_per_anchor: DEFAULT_MAX_SAMPLES_PER_ANCHOR,
            phase_a: PhaseConfig::low_start(),
            phase_b: PhaseConfig::high_start(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.players_per_team == 0 {
            return Err(SimError::InvalidConfiguration(
                "players_per_team must be positive".to_string(),
            ));
        }
        if self.max_mmr_distance <= 0 {
            return Err(SimError::InvalidConfiguration(format!(
                "max_mmr_distance must be positive, got {}",
                self.max_mmr_distance
            )));
        }
        if self.max_players == 0 {
            return Err(SimError::InvalidConfiguration(
                "max_players must be positive".to_string(),
            ));
        }
        if self.max_anchor_attempts == 0 || self.max_samples_per_anchor == 0 {
            return Err(SimError::InvalidConfiguration(
                "matchmaking retry bounds must be positive".to_string(),
            ));
        }

        let weights = self.outcome_weights;
        if !weights.mmr.is_finite() || !weights.skill.is_finite() || weights.mmr + weights.skill <= 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "outcome weights must be finite with a positive sum, got {}/{}",
                weights.mmr, weights.skill
            )));
        }

        self.phase_a.validate("phase_a")?;
        self.phase_b.validate("phase_b")
    }
}
