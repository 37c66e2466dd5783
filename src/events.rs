use std::sync::mpsc::{channel, Receiver, Sender};

use crate::challenge::ChallengeKind;

/// Informational windows unlocked once per mission at fixed progress
/// thresholds (30/50/70/90).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfoWindow {
    SystemMonitor,
    NetworkGraph,
    Payload,
    Leaderboard,
}

/// Enum-tagged events fanned out to log surfaces and the presentation
/// layer. Listeners consume these over plain mpsc receivers.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    TypingProgress { fraction: f64 },
    TypingError { input: String, expected: String },
    TypingSuccess { phrase: String },
    TypingSound,
    TypingStopped,
    PatchStarted,
    PatchApplied,
    ChallengeOpened { kind: ChallengeKind },
    ChallengeResolved { kind: ChallengeKind, success: bool },
    SecurityBreach { count: u8 },
    TraceDetected,
    WindowUnlocked { window: InfoWindow },
    GameOver,
    MissionComplete { wpm: u32 },
}

/// Broadcast bus over std mpsc channels. Disconnected listeners are
/// dropped on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    listeners: Vec<Sender<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = channel();
        self.listeners.push(tx);
        rx
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn subscribe_and_emit() {
        let mut bus = EventBus::new();
        let rx = bus.subscribe();

        bus.emit(GameEvent::TypingSound);

        assert_matches!(rx.try_recv(), Ok(GameEvent::TypingSound));
    }

    #[test]
    fn emit_reaches_every_listener() {
        let mut bus = EventBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();

        bus.emit(GameEvent::TraceDetected);

        assert_matches!(rx1.try_recv(), Ok(GameEvent::TraceDetected));
        assert_matches!(rx2.try_recv(), Ok(GameEvent::TraceDetected));
    }

    #[test]
    fn dropped_listener_is_pruned() {
        let mut bus = EventBus::new();
        let rx = bus.subscribe();
        drop(rx);

        bus.emit(GameEvent::GameOver);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn emit_without_listeners_is_a_noop() {
        let mut bus = EventBus::new();
        bus.emit(GameEvent::TypingStopped);
        assert_eq!(bus.listener_count(), 0);
    }
}
