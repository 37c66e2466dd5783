use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// What kind of phrases the player types for the whole mission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    English,
    Code,
}

/// Mission difficulty selected before gameplay starts. Fixed for the
/// mission's lifetime; distinct from the dynamic difficulty derived
/// from typing speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Basic,
    Medium,
    Hard,
}

impl DifficultyTier {
    /// Mission time budget in seconds.
    pub fn time_limit_secs(self) -> u32 {
        match self {
            DifficultyTier::Basic => 120,
            DifficultyTier::Medium => 180,
            DifficultyTier::Hard => 240,
        }
    }
}

/// Progress, speed, and completion for one mission attempt.
#[derive(Clone, Debug)]
pub struct MissionState {
    /// 0..=100, monotonic non-decreasing until reset
    pub progress: u32,
    /// words-per-minute estimate, recomputed continuously
    pub typing_speed: u32,
    /// seconds, fixed at mission start from the difficulty tier
    pub time_limit: u32,
    /// set exactly once progress reaches 100; terminal until reset
    pub complete: bool,
    pub language: LanguageMode,
    pub difficulty: DifficultyTier,
}

impl MissionState {
    pub fn new(language: LanguageMode, difficulty: DifficultyTier) -> Self {
        Self {
            progress: 0,
            typing_speed: 0,
            time_limit: difficulty.time_limit_secs(),
            complete: false,
            language,
            difficulty,
        }
    }

    /// Clamps to [0, 100] and never moves backwards. Reaching 100
    /// flips `complete`; calling again afterwards is a no-op.
    pub fn update_progress(&mut self, new_value: u32) {
        let clamped = new_value.min(100);
        if clamped > self.progress {
            self.progress = clamped;
        }
        if self.progress >= 100 {
            self.complete = true;
        }
    }

    pub fn add_progress(&mut self, amount: u32) {
        self.update_progress(self.progress.saturating_add(amount));
    }

    pub fn update_typing_speed(&mut self, wpm: u32) {
        self.typing_speed = wpm;
    }

    /// Back to the zero state for a retry. Language and difficulty
    /// selection survive; so does the derived time limit.
    pub fn reset(&mut self) {
        self.progress = 0;
        self.typing_speed = 0;
        self.complete = false;
    }

    /// Runs once per mission before gameplay starts.
    pub fn set_language_and_difficulty(&mut self, language: LanguageMode, difficulty: DifficultyTier) {
        self.language = language;
        self.difficulty = difficulty;
        self.time_limit = difficulty.time_limit_secs();
    }
}
