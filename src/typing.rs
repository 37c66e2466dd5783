/// Inactivity threshold before a security patch starts, in ms.
pub const PATCH_TRIGGER_MS: u64 = 5_000;
/// One security-patch progress tick.
pub const PATCH_TICK_MS: u64 = 500;
/// Ticks until the patch lands (20 x 0.5s = 10s).
pub const PATCH_TICKS: u8 = 20;
/// Silence after the last keystroke that counts as "typing stopped".
pub const TYPING_STOP_MS: u64 = 2_000;
/// Mission progress granted per completed phrase.
pub const PHRASE_REWARD: u32 = 5;

/// Outcome of feeding one keystroke into the session.
#[derive(Clone, Debug, PartialEq)]
pub enum Keystroke {
    /// Buffer is still a prefix of the target
    Progress { fraction: f64 },
    /// Buffer diverged; carries the offending input and what was
    /// expected at that length
    Error { input: String, expected: String },
    /// Buffer exactly equals the target
    Completed { phrase: String },
}

/// Security-patch sub-state: fills while the player stalls, applied
/// when it reaches [`PATCH_TICKS`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SecurityPatch {
    pub ticks: u8,
}

impl SecurityPatch {
    pub fn percent(&self) -> u8 {
        self.ticks.saturating_mul(100 / PATCH_TICKS)
    }
}

/// Keystroke-by-keystroke evaluation of the current target phrase plus
/// the mission-wide speed accumulators. Time is logical: `tick` is
/// only called for unpaused mission time, so pausing freezes the wpm
/// math and both inactivity detectors at exact values.
#[derive(Debug)]
pub struct TypingSession {
    pub target: String,
    pub buffer: String,
    /// false while the buffer has diverged from the target
    pub correct: bool,
    pub completed_phrases: u32,
    pub chars_typed: u64,
    pub elapsed_ms: u64,
    pub last_input_ms: u64,
    pub typing_active: bool,
    pub patch: Option<SecurityPatch>,
    /// (seconds, wpm) samples for the network graph window
    pub wpm_coords: Vec<(f64, f64)>,
}

impl TypingSession {
    pub fn new(target: String) -> Self {
        Self {
            target,
            buffer: String::new(),
            correct: true,
            completed_phrases: 0,
            chars_typed: 0,
            elapsed_ms: 0,
            last_input_ms: 0,
            typing_active: false,
            patch: None,
            wpm_coords: Vec::new(),
        }
    }

    /// Swap in a freshly generated phrase and clear the input.
    pub fn set_phrase(&mut self, phrase: String) {
        self.target = phrase;
        self.buffer.clear();
        self.correct = true;
    }

    /// Advance the logical clock. Callers skip this while paused.
    pub fn tick(&mut self, dt_ms: u64) {
        self.elapsed_ms += dt_ms;
    }

    /// `round((chars/5) / elapsed_minutes)`, never negative.
    pub fn wpm(&self) -> u32 {
        if self.elapsed_ms == 0 {
            return 0;
        }
        let elapsed_minutes = self.elapsed_ms as f64 / 60_000.0;
        ((self.chars_typed as f64 / 5.0) / elapsed_minutes).round() as u32
    }

    /// Feed one character. Cancels any security patch, stamps the
    /// activity clock, and classifies the buffer against the target.
    pub fn push_char(&mut self, c: char) -> Keystroke {
        self.patch = None;
        self.buffer.push(c);
        self.chars_typed += 1;
        self.last_input_ms = self.elapsed_ms;
        self.typing_active = true;

        self.classify()
    }

    /// Backspace: the buffer is retained on mismatch so the player can
    /// see the error, and erased one char at a time.
    pub fn pop_char(&mut self) {
        self.patch = None;
        self.buffer.pop();
        self.last_input_ms = self.elapsed_ms;
        self.correct = self.target.starts_with(&self.buffer);
    }

    fn classify(&mut self) -> Keystroke {
        if self.buffer == self.target {
            self.correct = true;
            self.completed_phrases += 1;
            return Keystroke::Completed {
                phrase: self.target.clone(),
            };
        }

        self.correct = self.target.starts_with(&self.buffer);
        if self.correct {
            let fraction = self.buffer.chars().count() as f64 / self.target.chars().count() as f64;
            Keystroke::Progress { fraction }
        } else {
            let expected: String = self
                .target
                .chars()
                .take(self.buffer.chars().count())
                .collect();
            Keystroke::Error {
                input: self.buffer.clone(),
                expected,
            }
        }
    }

    /// The 5s stall check, sampled on a 1s poll. Only a non-empty
    /// buffer can trigger a patch, and never while one is running.
    pub fn should_start_patch(&self) -> bool {
        self.patch.is_none()
            && !self.buffer.is_empty()
            && self.elapsed_ms.saturating_sub(self.last_input_ms) > PATCH_TRIGGER_MS
    }

    pub fn start_patch(&mut self) {
        self.patch = Some(SecurityPatch::default());
    }

    /// One 0.5s patch tick; returns true when the patch lands. The
    /// caller regenerates the phrase and emits the stopped signal.
    pub fn patch_tick(&mut self) -> bool {
        if let Some(patch) = self.patch.as_mut() {
            patch.ticks += 1;
            if patch.ticks >= PATCH_TICKS {
                self.patch = None;
                self.buffer.clear();
                self.correct = true;
                return true;
            }
        }
        false
    }

    /// True once per stall: typing was active and 2s passed without a
    /// keystroke.
    pub fn stop_elapsed(&self) -> bool {
        self.typing_active
            && self.elapsed_ms.saturating_sub(self.last_input_ms) >= TYPING_STOP_MS
    }

    pub fn record_wpm_sample(&mut self) {
        let t = self.elapsed_ms as f64 / 1000.0;
        self.wpm_coords.push((t, self.wpm() as f64));
    }

    /// Fresh session for a retry; keeps nothing.
    pub fn reset(&mut self, phrase: String) {
        *self = TypingSession::new(phrase);
    }
}
