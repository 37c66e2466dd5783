mod ui;

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::mpsc::Receiver,
    time::Duration,
};
use webbrowser::Browser;

use sysoverride::auth::{AuthError, AuthProvider, Operator, SqliteAuth};
use sysoverride::config::{Config, ConfigStore, FileConfigStore};
use sysoverride::events::{GameEvent, InfoWindow};
use sysoverride::game::Game;
use sysoverride::mission::{DifficultyTier, LanguageMode};
use sysoverride::runtime::{CrosstermSource, FixedTicker, Runner, TermEvent};
use sysoverride::score::{append_mission_log, MissionRecord, ScoreDb, ScoreEntry};

const TICK_RATE_MS: u64 = 100;
const FEED_CAP: usize = 100;

/// hacking-themed typing arcade with timed mini-challenges
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type phrases to advance the breach meter while randomized timed mini-challenges, security patches, and trace countdowns push back. Completed missions land on a local leaderboard."
)]
pub struct Cli {
    /// payload language for the mission
    #[clap(short = 'l', long, value_enum)]
    language: Option<LanguageMode>,

    /// mission difficulty tier (fixes the mission clock)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<DifficultyTier>,

    /// operator handle for the local account store
    #[clap(short = 'o', long)]
    operator: Option<String>,

    /// access code matching the operator handle
    #[clap(long)]
    access_code: Option<String>,

    /// register the handle instead of logging in
    #[clap(long)]
    register: bool,

    /// play anonymously; scores are not saved
    #[clap(short = 'g', long)]
    guest: bool,

    /// print the local leaderboard and exit
    #[clap(long)]
    leaderboard: bool,

    /// seed for deterministic phrase and challenge generation
    #[clap(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Options,
    Mission,
    Complete,
    GameOver,
}

pub struct App {
    pub state: AppState,
    pub game: Game,
    pub operator: Operator,
    pub pending_language: LanguageMode,
    pub pending_difficulty: DifficultyTier,
    pub feed: Vec<String>,
    pub score_status: Option<String>,
    pub leaderboard: Vec<ScoreEntry>,
    game_events: Receiver<GameEvent>,
    seed: Option<u64>,
}

impl App {
    pub fn new(config: &Config, operator: Operator, seed: Option<u64>) -> Self {
        let mut game = build_game(config.language, config.difficulty, seed);
        let game_events = game.subscribe();
        Self {
            state: AppState::Options,
            game,
            operator,
            pending_language: config.language,
            pending_difficulty: config.difficulty,
            feed: Vec::new(),
            score_status: None,
            leaderboard: Vec::new(),
            game_events,
            seed,
        }
    }

    /// Build a fresh mission for the pending options and arm it.
    pub fn begin_mission(&mut self) {
        let mut game = build_game(self.pending_language, self.pending_difficulty, self.seed);
        self.game_events = game.subscribe();
        game.start();
        self.game = game;
        self.feed.clear();
        self.score_status = None;
        self.state = AppState::Mission;
    }

    /// Same mission parameters, zeroed state.
    pub fn retry_mission(&mut self) {
        self.game.retry();
        self.feed.clear();
        self.score_status = None;
        self.state = AppState::Mission;
    }

    /// Consume core events: feed lines for the log window plus the
    /// two terminal transitions.
    pub fn drain_events(&mut self) {
        let mut complete_wpm = None;
        let mut game_over = false;

        for event in self.game_events.try_iter() {
            match &event {
                GameEvent::MissionComplete { wpm } => complete_wpm = Some(*wpm),
                GameEvent::GameOver => game_over = true,
                _ => {}
            }
            if let Some(line) = describe(&event) {
                self.feed.push(line);
            }
        }
        if self.feed.len() > FEED_CAP {
            let excess = self.feed.len() - FEED_CAP;
            self.feed.drain(..excess);
        }

        if let Some(wpm) = complete_wpm {
            self.finish_mission(true, wpm);
            self.state = AppState::Complete;
        } else if game_over {
            self.finish_mission(false, self.game.mission.typing_speed);
            self.state = AppState::GameOver;
        }
    }

    /// Mission log always; score and leaderboard only on success and
    /// only for signed-in operators. Store failures become a status
    /// line, never an abort.
    fn finish_mission(&mut self, success: bool, wpm: u32) {
        let snap = self.game.snapshot();
        let record = MissionRecord {
            date: Local::now().format("%c").to_string(),
            language: format!("{}", snap.language).to_lowercase(),
            difficulty: format!("{}", snap.difficulty).to_lowercase(),
            wpm,
            progress: snap.progress,
            outcome: if success { "complete" } else { "terminated" }.to_string(),
        };
        let _ = append_mission_log(&record);

        if !success {
            return;
        }

        match ScoreDb::new() {
            Ok(db) => {
                if self.operator.is_guest() {
                    self.score_status = Some("guest run; score not saved".to_string());
                } else if wpm == 0 {
                    self.score_status = Some("no speed recorded".to_string());
                } else {
                    self.score_status = match db.save_score(
                        &self.operator.uid,
                        &self.operator.display_name,
                        wpm,
                    ) {
                        Ok(()) => Some(format!("score saved: {wpm} wpm")),
                        Err(_) => Some("score save failed; kept offline".to_string()),
                    };
                }
                self.leaderboard = db.top_scores().unwrap_or_default();
            }
            Err(_) => {
                self.score_status = Some("leaderboard unavailable".to_string());
                self.leaderboard = Vec::new();
            }
        }
    }
}

fn build_game(language: LanguageMode, difficulty: DifficultyTier, seed: Option<u64>) -> Game {
    match seed {
        Some(seed) => Game::with_rng(language, difficulty, StdRng::seed_from_u64(seed)),
        None => Game::new(language, difficulty),
    }
}

fn describe(event: &GameEvent) -> Option<String> {
    let line = match event {
        GameEvent::TypingError { expected, .. } => format!("ERR: expected \"{expected}\""),
        GameEvent::TypingSuccess { phrase } => format!("OK: {phrase}"),
        GameEvent::TypingStopped => "typing stalled".to_string(),
        GameEvent::PatchStarted => "ALERT: security patching started".to_string(),
        GameEvent::PatchApplied => "security patch applied; phrase rotated".to_string(),
        GameEvent::ChallengeOpened { kind } => {
            format!("alert: {kind} challenge incoming").to_lowercase()
        }
        GameEvent::ChallengeResolved { kind, success } => {
            let verdict = if *success { "cleared" } else { "failed" };
            format!("{kind} challenge {verdict}").to_lowercase()
        }
        GameEvent::SecurityBreach { count } => format!("SECURITY BREACH {count}/3"),
        GameEvent::TraceDetected => "TRACE DETECTED :: breach countdown armed".to_string(),
        GameEvent::WindowUnlocked { window } => {
            let name = match window {
                InfoWindow::SystemMonitor => "system monitor",
                InfoWindow::NetworkGraph => "network graph",
                InfoWindow::Payload => "payload console",
                InfoWindow::Leaderboard => "leaderboard feed",
            };
            format!("window unlocked: {name}")
        }
        GameEvent::MissionComplete { wpm } => format!("MISSION COMPLETE :: {wpm} wpm"),
        GameEvent::GameOver => "CONNECTION TERMINATED".to_string(),
        GameEvent::TypingProgress { .. } | GameEvent::TypingSound => return None,
    };
    Some(line)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.leaderboard {
        return print_leaderboard();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    if let Some(language) = cli.language {
        config.language = language;
    }
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }
    if cli.guest {
        config.guest = true;
        config.operator = None;
    } else if let Some(handle) = &cli.operator {
        config.guest = false;
        config.operator = Some(handle.clone());
    }
    let _ = store.save(&config);

    let operator = resolve_operator(&cli, &config);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, operator, cli.seed);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Guest bypass is always available; a missing account store demotes
/// to guest instead of blocking play. Bad credentials are a usage
/// error and exit before the terminal is touched.
fn resolve_operator(cli: &Cli, config: &Config) -> Operator {
    if config.guest {
        return Operator::guest();
    }
    let Some(handle) = config.operator.as_deref() else {
        return Operator::guest();
    };

    let Some(access_code) = cli.access_code.as_deref() else {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::MissingRequiredArgument,
            "--access-code is required with --operator",
        )
        .exit();
    };

    let auth = match SqliteAuth::new() {
        Ok(auth) => auth,
        Err(_) => return Operator::guest(),
    };

    let attempt = if cli.register {
        auth.register(handle, access_code)
    } else {
        auth.login(handle, access_code)
    };

    match attempt {
        Ok(operator) => operator,
        Err(AuthError::Unavailable) => Operator::guest(),
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, format!("sign-in failed: {err}"))
                .exit();
        }
    }
}

fn print_leaderboard() -> Result<(), Box<dyn Error>> {
    match ScoreDb::new() {
        Ok(db) => {
            let scores = db.top_scores()?;
            if scores.is_empty() {
                println!("no scores yet");
            }
            for (rank, entry) in scores.iter().enumerate() {
                println!(
                    "{:>2}. {:<18} {:>4} wpm  {}",
                    rank + 1,
                    entry.display_name,
                    entry.wpm,
                    entry.timestamp.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Err(_) => println!("leaderboard unavailable"),
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            TermEvent::Tick => {
                if app.state == AppState::Mission {
                    app.game.on_tick(TICK_RATE_MS);
                    app.drain_events();
                }
            }
            TermEvent::Resize => {}
            TermEvent::Key(key) => {
                if handle_key(app, key) == Flow::Quit {
                    break;
                }
                app.drain_events();
            }
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Flow {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Flow::Quit;
    }

    match app.state {
        AppState::Options => match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Enter => app.begin_mission(),
            KeyCode::Char('l') => {
                app.pending_language = match app.pending_language {
                    LanguageMode::English => LanguageMode::Code,
                    LanguageMode::Code => LanguageMode::English,
                };
            }
            KeyCode::Char('1') => app.pending_difficulty = DifficultyTier::Basic,
            KeyCode::Char('2') => app.pending_difficulty = DifficultyTier::Medium,
            KeyCode::Char('3') => app.pending_difficulty = DifficultyTier::Hard,
            _ => {}
        },
        AppState::Mission => {
            let paused = app.game.mechanics.paused;
            match key.code {
                KeyCode::Esc => app.game.toggle_pause(),
                KeyCode::Char('q') if paused => return Flow::Quit,
                KeyCode::Char('h') if paused => {
                    // Home discards the whole mission's timers first
                    app.game.abort();
                    app.state = AppState::Options;
                }
                KeyCode::Enter => app.game.submit_challenge(),
                KeyCode::Backspace => app.game.on_backspace(),
                KeyCode::Char(c) => app.game.on_char(c),
                _ => {}
            }
        }
        AppState::Complete => match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('r') => app.retry_mission(),
            KeyCode::Char('n') => {
                app.game.abort();
                app.state = AppState::Options;
            }
            KeyCode::Char('t') => {
                if Browser::is_available() {
                    webbrowser::open(&format!(
                        "https://twitter.com/intent/tweet?text=breached%20the%20mainframe%20at%20{}%20wpm%20%2F%2F%20SYSTEM%20OVERRIDE",
                        app.game.mission.typing_speed
                    ))
                    .unwrap_or_default();
                }
            }
            _ => {}
        },
        AppState::GameOver => match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('r') => app.retry_mission(),
            KeyCode::Char('n') => {
                app.game.abort();
                app.state = AppState::Options;
            }
            _ => {}
        },
    }

    Flow::Continue
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
