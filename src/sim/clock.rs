/// Virtual clock with three periodic timers.
///
/// A session is driven by three independent periodic sources:
///
/// | Timer     | Period                               |
/// |-----------|--------------------------------------|
/// | `Player`  | 150 ms                               |
/// | `Monster` | 400 ms × 0.75^run, floored at 50 ms  |
/// | `World`   | 1000 ms (the rage countdown)         |
///
/// `Scheduler::pop_due()` hands out fires one at a time in time order.
/// Fires that land on the same millisecond come out in the fixed order
/// Player, Monster, World. Time is virtual: the caller decides how many
/// milliseconds pass, so tests can step the clock exactly.

pub const PLAYER_PERIOD_MS: u64 = 150;
pub const WORLD_PERIOD_MS: u64 = 1000;

pub const MONSTER_BASE_PERIOD_MS: u64 = 400;
pub const MONSTER_SPEEDUP: f64 = 0.75;
/// Floor for the monster period; the speed-up alone would reach zero.
pub const MONSTER_MIN_PERIOD_MS: u64 = 50;

/// Monster move interval for a given run (number of escapes so far).
pub fn monster_period_ms(run: u32) -> u64 {
    let scaled = MONSTER_BASE_PERIOD_MS as f64 * MONSTER_SPEEDUP.powi(run.min(i32::MAX as u32) as i32);
    (scaled as u64).max(MONSTER_MIN_PERIOD_MS)
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum TimerKind {
    Player,
    Monster,
    World,
}

/// One timer firing at virtual time `at_ms`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Fire {
    pub kind: TimerKind,
    pub at_ms: u64,
}

#[derive(Clone, Debug)]
struct Timer {
    kind: TimerKind,
    period_ms: u64,
    next_due_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Scheduler {
    now_ms: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    /// Timers start at t = 0 and first fire one period later.
    pub fn new(monster_period_ms: u64) -> Self {
        let timer = |kind, period_ms: u64| Timer { kind, period_ms, next_due_ms: period_ms };
        Scheduler {
            now_ms: 0,
            timers: vec![
                timer(TimerKind::Player, PLAYER_PERIOD_MS),
                timer(TimerKind::Monster, monster_period_ms.max(1)),
                timer(TimerKind::World, WORLD_PERIOD_MS),
            ],
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn period_ms(&self, kind: TimerKind) -> u64 {
        self.timers.iter().find(|t| t.kind == kind).map_or(0, |t| t.period_ms)
    }

    /// Next fire at or before `until_ms`, advancing the clock to it.
    /// Returns None once nothing else is due.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fire> {
        let timer = self
            .timers
            .iter_mut()
            .filter(|t| t.next_due_ms <= until_ms)
            .min_by_key(|t| (t.next_due_ms, t.kind))?;

        let fire = Fire { kind: timer.kind, at_ms: timer.next_due_ms };
        timer.next_due_ms += timer.period_ms;
        self.now_ms = fire.at_ms;
        Some(fire)
    }

    /// Move the clock to `until_ms` once all due fires are drained.
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}
