/// Deterministic tick scheduler for every countdown in a mission.
///
/// All waiting in the game is modeled as scheduled re-evaluation: the
/// main loop calls `advance` with the elapsed milliseconds and reacts
/// to the fired handles. Timers are keyed by an owner so that pause,
/// challenge resolution, and mission reset can cancel a well-defined
/// set; stale timers must never mutate a future mission's state.

/// Who a timer belongs to. Cancelling an owner removes every timer it
/// scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerOwner {
    /// 1 Hz mission clock
    Mission,
    /// 15 s random-event sampling
    Events,
    /// 1 Hz inactivity poll (security-patch trigger)
    Inactivity,
    /// 2 s one-shot typing-stopped detection
    Stop,
    /// 0.5 s security-patch progress ticks
    Patch,
    /// 1 Hz challenge countdown
    Challenge,
    /// 30 s repeating trace breach countdown
    Trace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub owner: TimerOwner,
}

#[derive(Debug)]
struct Timer {
    id: TimerId,
    owner: TimerOwner,
    period_ms: u64,
    remaining_ms: u64,
    repeating: bool,
}

#[derive(Debug, Default)]
pub struct TickScheduler {
    timers: Vec<Timer>,
    next_id: u64,
    paused: bool,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, owner: TimerOwner, period_ms: u64, repeating: bool) -> TimerId {
        debug_assert!(period_ms > 0, "zero-period timers never settle");
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            owner,
            period_ms,
            remaining_ms: period_ms,
            repeating,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }

    pub fn cancel_owner(&mut self, owner: TimerOwner) {
        self.timers.retain(|t| t.owner != owner);
    }

    /// Total cancellation: nothing scheduled before this call may fire
    /// afterwards.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Milliseconds until the timer fires next, if it is still live.
    pub fn remaining_ms(&self, id: TimerId) -> Option<u64> {
        self.timers.iter().find(|t| t.id == id).map(|t| t.remaining_ms)
    }

    pub fn has_owner(&self, owner: TimerOwner) -> bool {
        self.timers.iter().any(|t| t.owner == owner)
    }

    /// Advance logical time by `dt_ms` and collect fired timers in
    /// schedule order. While paused no time passes at all: remaining
    /// values are preserved exactly.
    pub fn advance(&mut self, dt_ms: u64) -> Vec<Fired> {
        if self.paused {
            return Vec::new();
        }

        let mut fired = Vec::new();
        let mut dead = Vec::new();

        for timer in &mut self.timers {
            let mut dt = dt_ms;
            loop {
                if dt < timer.remaining_ms {
                    timer.remaining_ms -= dt;
                    break;
                }
                dt -= timer.remaining_ms;
                fired.push(Fired {
                    id: timer.id,
                    owner: timer.owner,
                });
                if timer.repeating {
                    timer.remaining_ms = timer.period_ms;
                } else {
                    dead.push(timer.id);
                    break;
                }
            }
        }

        self.timers.retain(|t| !dead.contains(&t.id));
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once_and_expires() {
        let mut sched = TickScheduler::new();
        let id = sched.schedule(TimerOwner::Stop, 2_000, false);

        assert!(sched.advance(1_900).is_empty());
        let fired = sched.advance(100);
        assert_eq!(fired, vec![Fired { id, owner: TimerOwner::Stop }]);

        // Expired: never fires again
        assert!(sched.advance(10_000).is_empty());
        assert_eq!(sched.remaining_ms(id), None);
    }

    #[test]
    fn repeating_timer_rearms_with_overshoot() {
        let mut sched = TickScheduler::new();
        let id = sched.schedule(TimerOwner::Mission, 1_000, true);

        // 1.3s elapses: fires once, 700ms left on the next cycle
        assert_eq!(sched.advance(1_300).len(), 1);
        assert_eq!(sched.remaining_ms(id), Some(700));
    }

    #[test]
    fn repeating_timer_fires_for_each_elapsed_period() {
        let mut sched = TickScheduler::new();
        sched.schedule(TimerOwner::Patch, 500, true);

        let fired = sched.advance(1_500);
        assert_eq!(fired.len(), 3);
    }

    #[test]
    fn paused_scheduler_freezes_remaining_times() {
        let mut sched = TickScheduler::new();
        let id = sched.schedule(TimerOwner::Challenge, 1_000, true);

        sched.advance(400);
        assert_eq!(sched.remaining_ms(id), Some(600));

        sched.set_paused(true);
        assert!(sched.advance(5_000).is_empty());
        assert_eq!(sched.remaining_ms(id), Some(600));

        // Resuming continues from the exact remaining value
        sched.set_paused(false);
        assert!(sched.advance(500).is_empty());
        assert_eq!(sched.advance(100).len(), 1);
    }

    #[test]
    fn cancel_owner_removes_all_of_that_owner() {
        let mut sched = TickScheduler::new();
        sched.schedule(TimerOwner::Challenge, 1_000, true);
        sched.schedule(TimerOwner::Challenge, 500, false);
        let kept = sched.schedule(TimerOwner::Mission, 1_000, true);

        sched.cancel_owner(TimerOwner::Challenge);

        assert!(!sched.has_owner(TimerOwner::Challenge));
        assert!(sched.has_owner(TimerOwner::Mission));
        assert_eq!(sched.remaining_ms(kept), Some(1_000));
    }

    #[test]
    fn clear_is_total() {
        let mut sched = TickScheduler::new();
        sched.schedule(TimerOwner::Mission, 1_000, true);
        sched.schedule(TimerOwner::Events, 15_000, true);
        sched.schedule(TimerOwner::Trace, 30_000, true);

        sched.clear();
        assert!(sched.advance(60_000).is_empty());
    }

    #[test]
    fn fired_order_follows_schedule_order() {
        let mut sched = TickScheduler::new();
        let first = sched.schedule(TimerOwner::Mission, 1_000, true);
        let second = sched.schedule(TimerOwner::Inactivity, 1_000, true);

        let fired = sched.advance(1_000);
        assert_eq!(fired[0].id, first);
        assert_eq!(fired[1].id, second);
    }
}
