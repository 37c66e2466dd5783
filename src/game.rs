use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::mpsc::Receiver;

use crate::challenge::{Challenge, ChallengeKind};
use crate::events::{EventBus, GameEvent, InfoWindow};
use crate::mechanics::{
    ChallengePhase, DynamicDifficulty, Mechanics, EVENT_PROBABILITY, EVENT_SAMPLE_MS,
    TRACE_CYCLE_MS,
};
use crate::mission::{DifficultyTier, LanguageMode, MissionState};
use crate::phrases::PhraseBank;
use crate::scheduler::{TickScheduler, TimerOwner};
use crate::typing::{Keystroke, TypingSession, PATCH_TICK_MS, PHRASE_REWARD, TYPING_STOP_MS};

const MISSION_TICK_MS: u64 = 1_000;
const INACTIVITY_POLL_MS: u64 = 1_000;
const CHALLENGE_TICK_MS: u64 = 1_000;

/// Read-only view of the active challenge for the presentation layer.
#[derive(Clone, Debug)]
pub struct ChallengeView {
    pub kind: ChallengeKind,
    pub prompt: String,
    pub input: String,
    pub seconds_left: u32,
    pub time_limit: u32,
    pub phase: ChallengePhase,
}

/// Immutable snapshot handed to the UI every tick.
#[derive(Clone, Debug)]
pub struct GameSnapshot {
    pub progress: u32,
    pub typing_speed: u32,
    pub seconds_remaining: u32,
    pub complete: bool,
    pub breaches: u8,
    pub game_over: bool,
    pub glitch_intensity: f64,
    pub paused: bool,
    pub trace_active: bool,
    pub language: LanguageMode,
    pub difficulty: DifficultyTier,
    pub dynamic_difficulty: DynamicDifficulty,
    pub phrase: String,
    pub buffer: String,
    pub correct: bool,
    pub completed_phrases: u32,
    pub patch_percent: Option<u8>,
    pub challenge: Option<ChallengeView>,
    pub unlocked: Vec<InfoWindow>,
    pub wpm_coords: Vec<(f64, f64)>,
}

/// The session controller: owns every cooperating state machine and
/// advances them on ticks and keystrokes. Single-threaded; all
/// waiting is a scheduled re-evaluation in the tick scheduler.
pub struct Game {
    pub mission: MissionState,
    pub typing: TypingSession,
    pub mechanics: Mechanics,
    pub scheduler: TickScheduler,
    pub seconds_remaining: u32,
    bus: EventBus,
    bank: PhraseBank,
    rng: StdRng,
    running: bool,
}

impl Game {
    pub fn new(language: LanguageMode, difficulty: DifficultyTier) -> Self {
        Self::with_rng(language, difficulty, StdRng::from_entropy())
    }

    /// Seeded constructor so tests get deterministic phrases,
    /// challenges, and event rolls.
    pub fn with_rng(language: LanguageMode, difficulty: DifficultyTier, mut rng: StdRng) -> Self {
        let bank = PhraseBank::load(language);
        let mission = MissionState::new(language, difficulty);
        let first_phrase = bank.next_phrase(language, difficulty, &mut rng);

        Self {
            seconds_remaining: mission.time_limit,
            mission,
            typing: TypingSession::new(first_phrase),
            mechanics: Mechanics::new(),
            scheduler: TickScheduler::new(),
            bus: EventBus::new(),
            bank,
            rng,
            running: false,
        }
    }

    /// Arm the mission timers and begin play.
    pub fn start(&mut self) {
        self.scheduler.clear();
        self.scheduler
            .schedule(TimerOwner::Mission, MISSION_TICK_MS, true);
        self.scheduler
            .schedule(TimerOwner::Events, EVENT_SAMPLE_MS, true);
        self.scheduler
            .schedule(TimerOwner::Inactivity, INACTIVITY_POLL_MS, true);
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        self.bus.subscribe()
    }

    /// Advance logical time. Paused missions see no time at all.
    pub fn on_tick(&mut self, dt_ms: u64) {
        if !self.running || self.mechanics.paused {
            return;
        }
        self.typing.tick(dt_ms);

        for fired in self.scheduler.advance(dt_ms) {
            // A terminal transition mid-batch invalidates the rest.
            if !self.running {
                break;
            }
            match fired.owner {
                TimerOwner::Mission => self.mission_second(),
                TimerOwner::Events => self.sample_random_event(),
                TimerOwner::Inactivity => self.poll_inactivity(),
                TimerOwner::Stop => self.typing_stopped(),
                TimerOwner::Patch => self.patch_tick(),
                TimerOwner::Challenge => self.challenge_second(),
                TimerOwner::Trace => self.add_breach(),
            }
        }
    }

    fn mission_second(&mut self) {
        self.typing.record_wpm_sample();

        if self.seconds_remaining > 0 {
            self.seconds_remaining -= 1;
            if self.seconds_remaining == 0 {
                // Clock exhausted: the trace begins. The mission
                // countdown's job is done, so its timer goes away.
                self.scheduler.cancel_owner(TimerOwner::Mission);
                self.mechanics.trace_active = true;
                self.bus.emit(GameEvent::TraceDetected);
                self.scheduler
                    .schedule(TimerOwner::Trace, TRACE_CYCLE_MS, true);
            }
        }
    }

    /// 15s sampling gate: ~20% of ticks attempt a weighted trigger.
    fn sample_random_event(&mut self) {
        if self.mechanics.game_over || self.mission.complete {
            return;
        }
        if self.rng.gen::<f64>() < EVENT_PROBABILITY {
            if let Some(kind) = self
                .mechanics
                .pick_random_event(self.mission.progress, &mut self.rng)
            {
                self.open_challenge(kind);
            }
        }
    }

    /// Start a mini-challenge unless one is active or the game is
    /// paused (then this is a no-op).
    pub fn open_challenge(&mut self, kind: ChallengeKind) {
        let challenge = Challenge::generate(kind, &mut self.rng);
        if self.mechanics.start_challenge(challenge) {
            self.scheduler
                .schedule(TimerOwner::Challenge, CHALLENGE_TICK_MS, true);
            self.bus.emit(GameEvent::ChallengeOpened { kind });
        }
    }

    fn challenge_second(&mut self) {
        let Some(active) = self.mechanics.active.as_mut() else {
            self.scheduler.cancel_owner(TimerOwner::Challenge);
            return;
        };

        active.seconds_left = active.seconds_left.saturating_sub(1);
        if active.seconds_left == 0 {
            if active.phase == ChallengePhase::Memorize {
                // Target goes dark; the recall window opens with the
                // same budget.
                active.phase = ChallengePhase::Recall;
                active.seconds_left = active.challenge.time_limit;
            } else {
                self.resolve_active(false);
            }
        }
    }

    fn resolve_active(&mut self, success: bool) {
        self.scheduler.cancel_owner(TimerOwner::Challenge);
        if let Some(resolution) = self.mechanics.resolve_challenge(success, &mut self.mission) {
            self.bus.emit(GameEvent::ChallengeResolved {
                kind: resolution.kind,
                success: resolution.success,
            });
            if resolution.breach {
                self.add_breach();
            }
            self.after_progress_change();
        }
    }

    fn add_breach(&mut self) {
        let count = self.mechanics.add_security_breach();
        self.bus.emit(GameEvent::SecurityBreach { count });
        if self.mechanics.game_over {
            self.running = false;
            self.scheduler.clear();
            self.bus.emit(GameEvent::GameOver);
        }
    }

    fn poll_inactivity(&mut self) {
        if self.typing.should_start_patch() {
            self.typing.start_patch();
            self.scheduler
                .schedule(TimerOwner::Patch, PATCH_TICK_MS, true);
            self.bus.emit(GameEvent::PatchStarted);
        }
    }

    fn patch_tick(&mut self) {
        if self.typing.patch_tick() {
            self.scheduler.cancel_owner(TimerOwner::Patch);
            let phrase = self.next_phrase();
            self.typing.set_phrase(phrase);
            self.bus.emit(GameEvent::PatchApplied);
            self.bus.emit(GameEvent::TypingStopped);
        }
    }

    fn typing_stopped(&mut self) {
        if self.typing.stop_elapsed() {
            self.typing.typing_active = false;
            self.bus.emit(GameEvent::TypingStopped);
        }
    }

    /// Route a printable key: into the active challenge if one is
    /// open, into the typing window otherwise.
    pub fn on_char(&mut self, c: char) {
        if !self.running || self.mechanics.paused {
            return;
        }
        if let Some(active) = self.mechanics.active.as_mut() {
            if active.phase != ChallengePhase::Memorize {
                active.input.push(c);
            }
            return;
        }
        self.typing_char(c);
    }

    fn typing_char(&mut self, c: char) {
        if self.typing.patch.is_some() {
            self.scheduler.cancel_owner(TimerOwner::Patch);
        }
        self.scheduler.cancel_owner(TimerOwner::Stop);
        self.scheduler
            .schedule(TimerOwner::Stop, TYPING_STOP_MS, false);

        let result = self.typing.push_char(c);
        self.refresh_speed();

        match result {
            Keystroke::Progress { fraction } => {
                self.bus.emit(GameEvent::TypingProgress { fraction });
                // Occasional, to keep event volume down
                if self.rng.gen::<f64>() > 0.7 {
                    self.bus.emit(GameEvent::TypingSound);
                }
            }
            Keystroke::Error { input, expected } => {
                self.bus.emit(GameEvent::TypingError { input, expected });
            }
            Keystroke::Completed { phrase } => {
                self.bus.emit(GameEvent::TypingSuccess { phrase });
                self.mission.add_progress(PHRASE_REWARD);
                let next = self.next_phrase();
                self.typing.set_phrase(next);
                self.after_progress_change();
            }
        }
    }

    pub fn on_backspace(&mut self) {
        if !self.running || self.mechanics.paused {
            return;
        }
        if let Some(active) = self.mechanics.active.as_mut() {
            if active.phase != ChallengePhase::Memorize {
                active.input.pop();
            }
            return;
        }
        if self.typing.patch.is_some() {
            self.scheduler.cancel_owner(TimerOwner::Patch);
        }
        // Deleting counts as activity too
        self.scheduler.cancel_owner(TimerOwner::Stop);
        self.scheduler
            .schedule(TimerOwner::Stop, TYPING_STOP_MS, false);
        self.typing.pop_char();
    }

    /// Player submits the challenge input buffer. Ignored during the
    /// portscan memorize phase (there is nothing to answer yet).
    pub fn submit_challenge(&mut self) {
        if !self.running || self.mechanics.paused {
            return;
        }
        let Some(active) = self.mechanics.active.as_ref() else {
            return;
        };
        if active.phase == ChallengePhase::Memorize {
            return;
        }
        let success = active.challenge.check_answer(&active.input);
        self.resolve_active(success);
    }

    fn refresh_speed(&mut self) {
        let wpm = self.typing.wpm();
        self.mission.update_typing_speed(wpm);
        self.mechanics.set_dynamic_difficulty(wpm);
    }

    fn after_progress_change(&mut self) {
        self.mechanics.update_glitch_intensity(self.mission.progress);
        for window in self.mechanics.unlock_windows(self.mission.progress) {
            self.bus.emit(GameEvent::WindowUnlocked { window });
        }
        if self.mission.complete && self.running {
            self.running = false;
            self.scheduler.clear();
            self.bus.emit(GameEvent::MissionComplete {
                wpm: self.mission.typing_speed,
            });
        }
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.mechanics.paused);
    }

    /// Freeze or thaw every logical clock at once.
    pub fn set_paused(&mut self, paused: bool) {
        if !self.running {
            return;
        }
        self.mechanics.paused = paused;
        self.scheduler.set_paused(paused);
    }

    /// Explicit reset after game over or completion: clears breaches,
    /// game-over, progress, and rebuilds the typing session, then
    /// re-arms the timers.
    pub fn retry(&mut self) {
        self.mechanics.reset();
        self.mechanics.paused = false;
        self.scheduler.set_paused(false);
        self.mission.reset();
        self.seconds_remaining = self.mission.time_limit;
        let phrase = self.next_phrase();
        self.typing.reset(phrase);
        self.start();
    }

    /// Back to the home screen: the whole mission's timers are
    /// discarded before any new mission can start.
    pub fn abort(&mut self) {
        self.running = false;
        self.scheduler.clear();
    }

    fn next_phrase(&mut self) -> String {
        self.bank
            .next_phrase(self.mission.language, self.mission.difficulty, &mut self.rng)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            progress: self.mission.progress,
            typing_speed: self.mission.typing_speed,
            seconds_remaining: self.seconds_remaining,
            complete: self.mission.complete,
            breaches: self.mechanics.breaches,
            game_over: self.mechanics.game_over,
            glitch_intensity: self.mechanics.glitch_intensity,
            paused: self.mechanics.paused,
            trace_active: self.mechanics.trace_active,
            language: self.mission.language,
            difficulty: self.mission.difficulty,
            dynamic_difficulty: self.mechanics.difficulty,
            phrase: self.typing.target.clone(),
            buffer: self.typing.buffer.clone(),
            correct: self.typing.correct,
            completed_phrases: self.typing.completed_phrases,
            patch_percent: self.typing.patch.map(|p| p.percent()),
            challenge: self.mechanics.active.as_ref().map(|active| ChallengeView {
                kind: active.challenge.kind,
                prompt: active.challenge.prompt_text(),
                input: active.input.clone(),
                seconds_left: active.seconds_left,
                time_limit: active.challenge.time_limit,
                phase: active.phase,
            }),
            unlocked: self.mechanics.unlocked_windows().to_vec(),
            wpm_coords: self.typing.wpm_coords.clone(),
        }
    }
}
