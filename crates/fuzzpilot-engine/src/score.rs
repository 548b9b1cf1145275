use std::time::Duration;

/// Per-agent tally for one run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TeamScore {
    pub name: String,
    /// Asteroids destroyed, by bullets or by collision.
    pub asteroids_hit: u32,
    pub deaths: u32,
    pub shots_fired: u32,
    pub bullets_hit: u32,
    pub lives_remaining: u32,
}

impl TeamScore {
    /// Bullet hits over shots fired, `0` when nothing was fired.
    ///
    /// ```
    /// # use fuzzpilot_engine::TeamScore;
    /// let score = TeamScore { shots_fired: 4, bullets_hit: 3, ..TeamScore::default() };
    /// assert_eq!(score.accuracy(), 0.75);
    /// assert_eq!(TeamScore::default().accuracy(), 0.0);
    /// ```
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.shots_fired == 0 {
            0.0
        } else {
            f64::from(self.bullets_hit) / f64::from(self.shots_fired)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum StopReason {
    #[display("time expired")]
    TimeExpired,
    #[display("no asteroids remaining")]
    NoAsteroids,
    #[display("no lives remaining")]
    NoLives,
    #[display("out of ammo")]
    NoAmmo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub teams: Vec<TeamScore>,
    pub stop_reason: StopReason,
    /// Simulated seconds.
    pub sim_time: f64,
    pub frames: u64,
}

/// Wall-clock cost of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PerfData {
    pub wall_time: Duration,
    pub mean_eval_time: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub score: ScoreSummary,
    pub perf: PerfData,
}
