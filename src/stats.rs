use crate::types::{Phase, PlayerSnapshot};
use serde::{Deserialize, Serialize};

/// Running counters over a whole simulation
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub total_matches: usize,
    /// Matches abandoned because no candidate cluster was found
    pub skipped_matches: usize,
    pub team_a_wins: usize,
    pub seasons_completed: usize,
    pub players_added: usize,
    /// Population additions truncated or rejected by the pool cap
    pub capacity_rejections: usize,
    /// Mean of team A's pre-match win probability (percent)
    pub avg_win_probability_a: f64,
}

impl SimulationStats {
    pub fn record_match(&mut self, team_a_won: bool, probability_a: f64) {
        self.total_matches += 1;
        if team_a_won {
            self.team_a_wins += 1;
        }
        let n = self.total_matches as f64;
        self.avg_win_probability_a += (probability_a - self.avg_win_probability_a) / n;
    }
}

/// Result of one `run_season` call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonOutcome {
    pub matches_played: usize,
    pub matches_skipped: usize,
}

/// End-of-season snapshot handed to reporting collaborators
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeasonReport {
    /// Global season index across the whole run
    pub season: usize,
    pub phase: Phase,
    /// Index of the season within its phase
    pub iteration: usize,
    pub matches_played: usize,
    pub matches_skipped: usize,
    pub population: usize,
    pub mean_mmr: f64,
    pub median_mmr: f64,
    pub mmr_p90: f64,
    pub players: Vec<PlayerSnapshot>,
}

impl SeasonReport {
    pub fn new(
        season: usize,
        phase: Phase,
        iteration: usize,
        outcome: SeasonOutcome,
        players: Vec<PlayerSnapshot>,
    ) -> Self {
        let mmrs: Vec<i64> = players.iter().map(|p| p.mmr).collect();
        Self {
            season,
            phase,
            iteration,
            matches_played: outcome.matches_played,
            matches_skipped: outcome.matches_skipped,
            population: players.len(),
            mean_mmr: mean(&mmrs).unwrap_or(0.0),
            median_mmr: median(&mmrs).unwrap_or(0.0),
            mmr_p90: percentile(&mmrs, 0.9).unwrap_or(0.0),
            players,
        }
    }
}

pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
}

/// Middle value, or the mean of the two middle values for even counts
pub fn median(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

/// Nearest-rank percentile, `q` in [0, 1]
pub fn percentile(values: &[i64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let idx = ((sorted.len() as f64 * q.clamp(0.0, 1.0)).ceil() as usize).clamp(1, sorted.len()) - 1;
    Some(sorted[idx] as f64)
}

/// Equal-width histogram over the observed range: (bin_start, bin_end, count)
pub fn histogram(values: &[f64], num_bins: usize) -> Vec<(f64, f64, usize)> {
    if values.is_empty() || num_bins == 0 {
        return Vec::new();
    }

    let min = values.iter().cloned().fold(f64::MAX, f64::min);
    let max = values.iter().cloned().fold(f64::MIN, f64::max);
    let bin_width = ((max - min) / num_bins as f64).max(1.0);

    let mut bins = vec![0usize; num_bins];
    for &value in values {
        let bin = (((value - min) / bin_width) as usize).min(num_bins - 1);
        bins[bin] += 1;
    }

    bins.iter()
        .enumerate()
        .map(|(i, &count)| {
            (
                min + i as f64 * bin_width,
                min + (i + 1) as f64 * bin_width,
                count,
            )
        })
        .collect()
}
