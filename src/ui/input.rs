/// Input state tracker.
///
/// Turns the terminal's key stream into the two things a session wants:
///   - a held movement direction (WASD / arrows), newest press wins
///   - edge-triggered presses for menu keys (Enter, Y/N, Esc, Q)
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use dungeon_escape::domain::entity::Direction;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Movement binding: WASD plus arrow keys.
pub fn direction_for(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Direction::Right),
        _ => None,
    }
}

pub struct InputState {
    /// Timestamp of the first press of each currently held key.
    pressed_at: HashMap<KeyCode, Instant>,
    /// Timestamp of the last Press/Repeat event for each held key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            pressed_at: HashMap::with_capacity(8),
            last_active: HashMap::with_capacity(8),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before advancing the session.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.apply(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    /// Fold one key event into the held set.
    pub fn apply(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
                self.pressed_at.remove(&key.code);
            }
            // Unconfirmed release: rely on timeout expiry instead
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held_at(key.code, now) {
                    self.fresh_presses.push(key.code);
                    self.pressed_at.insert(key.code, now);
                }
                self.last_active.insert(key.code, now);
            }
        }
    }

    /// Drop keys whose last activity is older than the hold timeout.
    pub fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        let active = &self.last_active;
        self.pressed_at.retain(|code, _| active.contains_key(code));
    }

    /// Movement direction currently held. With several held, the most
    /// recently pressed one wins.
    pub fn held_direction(&self) -> Option<Direction> {
        self.pressed_at
            .iter()
            .filter_map(|(code, at)| direction_for(*code).map(|d| (*at, d)))
            .max_by_key(|(at, _)| *at)
            .map(|(_, d)| d)
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    // ── Internal ──

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
