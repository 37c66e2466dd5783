use rand::Rng;

use crate::challenge::{Challenge, ChallengeKind};
use crate::events::InfoWindow;
use crate::mission::MissionState;

/// Breaches at which the mission is lost.
pub const MAX_BREACHES: u8 = 3;
/// Random-event sampling cadence and gate probability.
pub const EVENT_SAMPLE_MS: u64 = 15_000;
pub const EVENT_PROBABILITY: f64 = 0.2;
/// One trace breach cycle after the mission clock runs out.
pub const TRACE_CYCLE_MS: u64 = 30_000;

/// Difficulty derived from live typing speed. Purely a function of
/// wpm, no hysteresis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum DynamicDifficulty {
    Easy,
    Medium,
    Hard,
}

impl DynamicDifficulty {
    pub fn from_wpm(wpm: u32) -> Self {
        if wpm < 30 {
            DynamicDifficulty::Easy
        } else if wpm < 60 {
            DynamicDifficulty::Medium
        } else {
            DynamicDifficulty::Hard
        }
    }
}

/// Countdown phase of the active challenge. Portscan shows the target
/// during Memorize and hides it during Recall; everything else runs a
/// single phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengePhase {
    Single,
    Memorize,
    Recall,
}

#[derive(Clone, Debug)]
pub struct ActiveChallenge {
    pub challenge: Challenge,
    pub seconds_left: u32,
    pub phase: ChallengePhase,
    pub input: String,
}

/// What `resolve` decided, for the caller to act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub kind: ChallengeKind,
    pub success: bool,
    pub breach: bool,
}

/// Orchestrator state: breach count, the single active challenge,
/// dynamic difficulty, glitch intensity, pause, and the once-per-
/// mission window unlocks.
#[derive(Debug)]
pub struct Mechanics {
    pub difficulty: DynamicDifficulty,
    pub active: Option<ActiveChallenge>,
    pub breaches: u8,
    pub game_over: bool,
    pub glitch_intensity: f64,
    pub paused: bool,
    pub trace_active: bool,
    unlocked: Vec<InfoWindow>,
}

impl Default for Mechanics {
    fn default() -> Self {
        Self::new()
    }
}

impl Mechanics {
    pub fn new() -> Self {
        Self {
            difficulty: DynamicDifficulty::Easy,
            active: None,
            breaches: 0,
            game_over: false,
            glitch_intensity: 0.0,
            paused: false,
            trace_active: false,
            unlocked: Vec::new(),
        }
    }

    pub fn set_dynamic_difficulty(&mut self, wpm: u32) {
        self.difficulty = DynamicDifficulty::from_wpm(wpm);
    }

    /// Mutual exclusion: a new challenge cannot start while one is
    /// active or while paused. Returns false when refused.
    pub fn start_challenge(&mut self, challenge: Challenge) -> bool {
        if self.active.is_some() || self.paused {
            return false;
        }
        let phase = if challenge.kind.has_memorize_phase() {
            ChallengePhase::Memorize
        } else {
            ChallengePhase::Single
        };
        self.active = Some(ActiveChallenge {
            seconds_left: challenge.time_limit,
            phase,
            input: String::new(),
            challenge,
        });
        true
    }

    /// Tear down the active challenge, paying the reward or marking
    /// the breach. Timeout is reported as `success == false`.
    pub fn resolve_challenge(&mut self, success: bool, mission: &mut MissionState) -> Option<Resolution> {
        let active = self.active.take()?;
        let kind = active.challenge.kind;

        if success {
            let reward = kind.progress_reward();
            if reward > 0 {
                mission.add_progress(reward);
            }
        }

        Some(Resolution {
            kind,
            success,
            breach: !success && kind.breach_on_failure(),
        })
    }

    /// Increment the breach counter; at [`MAX_BREACHES`] the mission
    /// is over until an explicit reset.
    pub fn add_security_breach(&mut self) -> u8 {
        self.breaches += 1;
        if self.breaches >= MAX_BREACHES {
            self.game_over = true;
        }
        self.breaches
    }

    pub fn reset_security_breaches(&mut self) {
        self.breaches = 0;
        self.game_over = false;
    }

    /// Cosmetic signal for the presentation layer.
    pub fn update_glitch_intensity(&mut self, progress: u32) {
        self.glitch_intensity = (progress as f64 / 20.0).min(5.0);
    }

    /// Weighted random-event selection, evaluated in descending
    /// progress order; the first qualifying branch fires.
    pub fn pick_random_event<R: Rng>(&self, progress: u32, rng: &mut R) -> Option<ChallengeKind> {
        let roll: f64 = rng.gen();

        if progress >= 90 && roll < 0.3 {
            Some(ChallengeKind::Virus)
        } else if progress >= 70 && roll < 0.25 {
            Some(ChallengeKind::Webcam)
        } else if progress >= 50 && roll < 0.2 {
            Some(ChallengeKind::Intrusion)
        } else if progress >= 30 && roll < 0.15 {
            Some(ChallengeKind::Firewall)
        } else if roll < 0.1 {
            if rng.gen_bool(0.5) {
                Some(ChallengeKind::Bruteforce)
            } else {
                Some(ChallengeKind::Portscan)
            }
        } else {
            None
        }
    }

    /// Progress-threshold unlocks at 30/50/70/90, each exactly once
    /// per mission. Returns the windows newly opened by this update.
    pub fn unlock_windows(&mut self, progress: u32) -> Vec<InfoWindow> {
        let thresholds = [
            (30, InfoWindow::SystemMonitor),
            (50, InfoWindow::NetworkGraph),
            (70, InfoWindow::Payload),
            (90, InfoWindow::Leaderboard),
        ];

        let mut opened = Vec::new();
        for (threshold, window) in thresholds {
            if progress >= threshold && !self.unlocked.contains(&window) {
                self.unlocked.push(window);
                opened.push(window);
            }
        }
        opened
    }

    pub fn unlocked_windows(&self) -> &[InfoWindow] {
        &self.unlocked
    }

    /// Retry: everything except pause goes back to the initial state.
    pub fn reset(&mut self) {
        let paused = self.paused;
        *self = Mechanics::new();
        self.paused = paused;
    }
}
