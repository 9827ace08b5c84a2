/// Entry point and game loop.
///
/// The binary is the thin collaborator around the library: it reads keys,
/// feeds real elapsed time into `Session::advance`, plays sounds for the
/// events that come back and draws the result. It also owns the run
/// counter: an escape starts the next, faster session; being caught ends
/// the game.

mod ui;

use std::fs::OpenOptions;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use log::{info, LevelFilter};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use dungeon_escape::config::GameConfig;
use dungeon_escape::sim::event::GameEvent;
use dungeon_escape::sim::session::{Outcome, Session};
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// Upper bound on simulated time per frame; a stalled terminal must not
/// let the monster take a burst of moves at once.
const MAX_FRAME_MS: u64 = 250;
const MESSAGE_DURATION: Duration = Duration::from_millis(2000);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Tutorial,
    Playing,
    Caught,
    Escaped,
}

fn main() {
    let config = GameConfig::load();

    if let Err(e) = init_logging(&config) {
        eprintln!("Warning: could not open log file: {e}");
    }

    let mut seeds = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut renderer = Renderer::new();
    let mut kb = InputState::new();

    match renderer.init() {
        Ok(release_events) => kb.honor_release = release_events,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    }

    let sound = if config.sound_enabled { SoundEngine::new() } else { None };

    let result = game_loop(&mut renderer, &mut kb, sound.as_ref(), &config, &mut seeds);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(escapes) => {
            println!();
            println!("Thanks for playing Dungeon Escape!");
            println!("Escapes: {escapes}");
        }
        Err(e) => eprintln!("Game error: {e}"),
    }
}

/// Logging goes to the configured file only; stdout belongs to the UI.
fn init_logging(config: &GameConfig) -> std::io::Result<()> {
    let Some(path) = &config.log.file else { return Ok(()) };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_filters(&config.log.level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    info!("Dungeon Escape starting up");
    Ok(())
}

/// Fresh session with its own RNG stream drawn from the master seed.
fn new_session(run: u32, seeds: &mut ChaCha8Rng) -> Result<Session, Box<dyn std::error::Error>> {
    let rng = ChaCha8Rng::seed_from_u64(seeds.gen());
    Ok(Session::new(run, rng)?)
}

/// Runs until the player quits or is caught. Returns the number of escapes.
fn game_loop(
    renderer: &mut Renderer,
    kb: &mut InputState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    seeds: &mut ChaCha8Rng,
) -> Result<u32, Box<dyn std::error::Error>> {
    let mut run: u32 = 0;
    let mut session = new_session(run, seeds)?;
    let mut phase = if config.tutorial { Phase::Tutorial } else { Phase::Playing };

    let mut message = String::new();
    let mut message_until: Option<Instant> = None;
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }

        match phase {
            Phase::Tutorial => {
                if kb.any_pressed(&[KeyCode::Esc, KeyCode::Char('q')]) {
                    break;
                }
                if kb.any_pressed(&[KeyCode::Enter, KeyCode::Char(' ')]) {
                    phase = Phase::Playing;
                    last_tick = Instant::now();
                }
            }
            Phase::Playing => {
                if kb.any_pressed(&[KeyCode::Esc, KeyCode::Char('q')]) {
                    break;
                }

                match kb.held_direction() {
                    Some(dir) => session.press(dir),
                    None => session.release(),
                }

                let elapsed = last_tick.elapsed().as_millis() as u64;
                if elapsed > 0 {
                    // Carry the sub-millisecond remainder unless the frame stalled
                    last_tick = if elapsed > MAX_FRAME_MS {
                        Instant::now()
                    } else {
                        last_tick + Duration::from_millis(elapsed)
                    };
                    let events = session.advance(elapsed.min(MAX_FRAME_MS));
                    for event in &events {
                        if let Some(sfx) = sound {
                            sfx.play_event(event);
                        }
                        if let Some(text) = event_message(event) {
                            message = text;
                            message_until = Some(Instant::now() + MESSAGE_DURATION);
                        }
                    }
                }

                phase = match session.outcome() {
                    Outcome::Running => Phase::Playing,
                    Outcome::Caught => Phase::Caught,
                    Outcome::Escaped => Phase::Escaped,
                };
            }
            Phase::Caught => {
                if kb.any_pressed(&[KeyCode::Enter, KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char(' ')]) {
                    break;
                }
            }
            Phase::Escaped => {
                if kb.any_pressed(&[KeyCode::Char('y'), KeyCode::Char('Y'), KeyCode::Enter]) {
                    run += 1;
                    session = new_session(run, seeds)?;
                    phase = Phase::Playing;
                    message.clear();
                    message_until = None;
                    last_tick = Instant::now();
                } else if kb.any_pressed(&[
                    KeyCode::Char('n'), KeyCode::Char('N'), KeyCode::Esc, KeyCode::Char('q'),
                ]) {
                    run += 1;
                    break;
                }
            }
        }

        if message_until.map_or(false, |t| Instant::now() >= t) {
            message.clear();
            message_until = None;
        }

        renderer.render(phase, &session, &message)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    info!("game over after {run} escapes");
    Ok(run)
}

/// Message-bar text for an event. Outcomes get their own overlay.
fn event_message(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::KeyCollected { .. } => Some("You picked up a key.".into()),
        GameEvent::AllKeysCollected => Some("All keys found! Head for the door.".into()),
        GameEvent::TrapTriggered { .. } => Some("A trap! You're stuck for a moment.".into()),
        GameEvent::DoorLocked { keys, needed } => {
            Some(format!("The door is locked. Keys: {keys}/{needed}"))
        }
        GameEvent::MonsterEnraged => Some("The monster is ENRAGED. It knows where you are.".into()),
        GameEvent::TrapDestroyed { .. } | GameEvent::PlayerCaught | GameEvent::PlayerEscaped => None,
    }
}
