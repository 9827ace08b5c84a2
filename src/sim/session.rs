/// Session: one maze, one player, one monster, from spawn to caught/escaped.
///
/// ## Lifecycle
///   `Session::new(run, rng)` builds a fresh maze. The run counter (escapes
///   so far) belongs to the caller and only sets the monster's pace. When
///   the outcome turns `Escaped`, the caller starts `Session::new(run + 1, ..)`;
///   when it turns `Caught`, the game is over. The session never exits the
///   process or shows anything itself.
///
/// ## Driving
///   `advance(dt_ms)` runs the virtual clock and dispatches every due timer:
///     Player  → `player_tick()`   (buffered turn + one step)
///     Monster → `monster_tick()`  (AI decision + one step)
///     World   → `world_tick()`    (rage countdown)
///   Each step can also be called directly. All return the events they
///   produced. Once the session is over every step is a no-op.

use log::{debug, info};
use rand_chacha::ChaCha8Rng;

use crate::domain::ai;
use crate::domain::cell::Cell;
use crate::domain::entity::{Direction, Monster, Player};
use crate::domain::grid::Grid;
use super::builder::{generate_layout, Layout, MazeGenerationError};
use super::clock::{monster_period_ms, Scheduler, TimerKind};
use super::event::GameEvent;

/// How long a trap holds the player.
pub const TRAP_FREEZE_MS: u64 = 1000;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Running,
    Caught,
    Escaped,
}

pub struct Session {
    grid: Grid,
    player: Player,
    monster: Monster,
    total_keys: usize,
    run: u32,
    outcome: Outcome,

    scheduler: Scheduler,
    rng: ChaCha8Rng,

    // ── Input ──
    movement_active: bool,
    desired: Option<Direction>,
    current: Option<Direction>,
    frozen_until_ms: Option<u64>,
}

// ── Construction ──

impl Session {
    /// Build a new maze and start a session for the given run.
    pub fn new(run: u32, mut rng: ChaCha8Rng) -> Result<Self, MazeGenerationError> {
        let layout = generate_layout(&mut rng)?;
        Ok(Session::from_layout(layout, run, rng))
    }

    /// Start a session on a prepared layout.
    pub fn from_layout(layout: Layout, run: u32, rng: ChaCha8Rng) -> Self {
        let period = monster_period_ms(run);
        info!("session start: run {run}, monster moves every {period} ms");
        Session {
            grid: layout.grid,
            player: layout.player,
            monster: layout.monster,
            total_keys: layout.total_keys,
            run,
            outcome: Outcome::Running,
            scheduler: Scheduler::new(period),
            rng,
            movement_active: false,
            desired: None,
            current: None,
            frozen_until_ms: None,
        }
    }
}

// ── Queries ──

impl Session {
    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn player(&self) -> &Player { &self.player }
    pub fn monster(&self) -> &Monster { &self.monster }
    pub fn run(&self) -> u32 { self.run }
    pub fn outcome(&self) -> Outcome { self.outcome }
    pub fn total_key_count(&self) -> usize { self.total_keys }

    pub fn cell_at(&self, x: i32, y: i32) -> Cell {
        self.grid.cell_at(x, y)
    }

    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.grid.is_walkable(x, y)
    }

    pub fn is_over(&self) -> bool {
        self.outcome != Outcome::Running
    }

    pub fn is_enraged(&self) -> bool {
        self.monster.is_enraged()
    }

    pub fn check_if_caught(&self) -> bool {
        self.monster.check_if_caught(&self.player)
    }

    pub fn monster_period_ms(&self) -> u64 {
        self.scheduler.period_ms(TimerKind::Monster)
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.monster.elapsed_secs()
    }

    pub fn seconds_until_enraged(&self) -> u32 {
        self.monster.secs_until_enraged()
    }

    /// Is the player stuck in a trap right now?
    pub fn is_frozen(&self) -> bool {
        self.frozen_until_ms.map_or(false, |t| self.scheduler.now_ms() < t)
    }
}

// ── Input ──

impl Session {
    /// A direction key went down: aim that way and start moving.
    pub fn press(&mut self, dir: Direction) {
        self.desired = Some(dir);
        self.movement_active = true;
    }

    /// Direction key released: stop moving. The heading is kept.
    pub fn release(&mut self) {
        self.movement_active = false;
    }

    pub fn is_moving(&self) -> bool {
        self.movement_active
    }
}

// ── Steps ──

impl Session {
    /// Run the virtual clock forward by `dt_ms`, dispatching due timers.
    pub fn advance(&mut self, dt_ms: u64) -> Vec<GameEvent> {
        let until = self.scheduler.now_ms() + dt_ms;
        let mut events = Vec::new();
        while !self.is_over() {
            let Some(fire) = self.scheduler.pop_due(until) else { break };
            let step = match fire.kind {
                TimerKind::Player => self.player_tick(),
                TimerKind::Monster => self.monster_tick(),
                TimerKind::World => self.world_tick(),
            };
            events.extend(step);
        }
        self.scheduler.settle(until);
        events
    }

    /// Player timer: try the wanted turn, then keep going the current way.
    pub fn player_tick(&mut self) -> Vec<GameEvent> {
        if self.is_over() || !self.movement_active || self.is_frozen() {
            return vec![];
        }

        if let Some(want) = self.desired {
            let (tx, ty) = want.step(self.player.pos());
            if self.grid.is_walkable(tx, ty) {
                self.current = Some(want);
            }
        }

        match self.current {
            Some(dir) => {
                let (nx, ny) = dir.step(self.player.pos());
                if self.grid.is_walkable(nx, ny) {
                    self.move_player(dir)
                } else {
                    vec![]
                }
            }
            None => vec![],
        }
    }

    /// Move the player one cell, resolving whatever is there.
    pub fn move_player(&mut self, dir: Direction) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.is_over() { return events; }

        let old = self.player.pos();
        let (nx, ny) = dir.step(old);
        if !self.grid.is_walkable(nx, ny) { return events; }

        match self.grid.cell_at(nx, ny) {
            Cell::Key => {
                self.player.collect_key();
                self.grid.set_cell(nx, ny, Cell::Empty);
                debug!("key at ({nx}, {ny}): {}/{}", self.player.keys_collected(), self.total_keys);
                events.push(GameEvent::KeyCollected { x: nx, y: ny });
                if self.player.keys_collected() == self.total_keys {
                    events.push(GameEvent::AllKeysCollected);
                }
            }
            Cell::Trap => {
                self.frozen_until_ms = Some(self.scheduler.now_ms() + TRAP_FREEZE_MS);
                debug!("trap at ({nx}, {ny})");
                events.push(GameEvent::TrapTriggered { x: nx, y: ny });
            }
            Cell::Door => {
                if self.player.keys_collected() >= self.total_keys {
                    self.finish(Outcome::Escaped);
                    events.push(GameEvent::PlayerEscaped);
                } else {
                    events.push(GameEvent::DoorLocked {
                        keys: self.player.keys_collected(),
                        needed: self.total_keys,
                    });
                }
                return events;
            }
            _ => {}
        }

        self.grid.move_marker(old, (nx, ny), Cell::Player);
        self.player.set_position(nx, ny);
        debug_assert_eq!(self.grid.cell_at(nx, ny), Cell::Player, "player marker out of sync");

        if self.check_if_caught() {
            self.finish(Outcome::Caught);
            events.push(GameEvent::PlayerCaught);
        }
        events
    }

    /// Monster timer: perceive, decide, take one step.
    pub fn monster_tick(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.is_over() { return events; }

        let action = ai::decide(&self.monster, &self.player, &self.grid, &mut self.rng);
        if let Some(underneath) = ai::apply_action(&mut self.monster, &mut self.grid, action) {
            let (mx, my) = self.monster.pos();
            debug_assert_eq!(self.grid.cell_at(mx, my), Cell::Monster, "monster marker out of sync");
            if underneath == Cell::Trap {
                events.push(GameEvent::TrapDestroyed { x: mx, y: my });
            }
        }

        if self.check_if_caught() {
            self.finish(Outcome::Caught);
            events.push(GameEvent::PlayerCaught);
        }
        events
    }

    /// World timer: one second of monster life.
    pub fn world_tick(&mut self) -> Vec<GameEvent> {
        if self.is_over() { return vec![]; }
        if self.monster.tick_second() {
            info!("monster enraged after {} s", self.monster.elapsed_secs());
            return vec![GameEvent::MonsterEnraged];
        }
        vec![]
    }

    fn finish(&mut self, outcome: Outcome) {
        info!(
            "session over: {outcome:?} (run {}, {} s, {}/{} keys)",
            self.run,
            self.monster.elapsed_secs(),
            self.player.keys_collected(),
            self.total_keys,
        );
        self.outcome = outcome;
        self.movement_active = false;
    }
}
