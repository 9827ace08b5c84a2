/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
/// The game loop hands every `GameEvent` to `play_event`; `sfx_for`
/// decides which ones make a noise.
///
/// Compile with `--no-default-features` to disable audio entirely
/// (the stub SoundEngine does nothing).

use dungeon_escape::sim::event::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sfx {
    Key,
    AllKeys,
    Trap,
    TrapCrunch,
    Locked,
    Enraged,
    Caught,
    Escaped,
}

impl Sfx {
    pub const ALL: [Sfx; 8] = [
        Sfx::Key, Sfx::AllKeys, Sfx::Trap, Sfx::TrapCrunch,
        Sfx::Locked, Sfx::Enraged, Sfx::Caught, Sfx::Escaped,
    ];
}

/// Which effect, if any, an event plays.
pub fn sfx_for(event: &GameEvent) -> Option<Sfx> {
    match event {
        GameEvent::KeyCollected { .. } => Some(Sfx::Key),
        GameEvent::AllKeysCollected => Some(Sfx::AllKeys),
        GameEvent::TrapTriggered { .. } => Some(Sfx::Trap),
        GameEvent::TrapDestroyed { .. } => Some(Sfx::TrapCrunch),
        GameEvent::DoorLocked { .. } => Some(Sfx::Locked),
        GameEvent::MonsterEnraged => Some(Sfx::Enraged),
        GameEvent::PlayerCaught => Some(Sfx::Caught),
        GameEvent::PlayerEscaped => Some(Sfx::Escaped),
    }
}

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::PI;
    use std::io::Cursor;
    use std::sync::Arc;

    use log::warn;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Sfx;

    pub(super) const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Sfx, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        /// None when no audio device is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| (sfx, Arc::new(make_wav(&generate(sfx)))))
                .collect();

            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let Some(buf) = self.buffers.get(&sfx) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_event(&self, event: &dungeon_escape::sim::event::GameEvent) {
            if let Some(sfx) = super::sfx_for(event) {
                self.play(sfx);
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    pub(super) fn generate(sfx: Sfx) -> Vec<f32> {
        match sfx {
            // C6 → E6 → G6
            Sfx::Key => notes(&[(1047.0, 0.045), (1319.0, 0.045), (1568.0, 0.045)], 0.25),
            // G5 → C6 → G6 chime
            Sfx::AllKeys => notes(&[(784.0, 0.08), (1047.0, 0.08), (1568.0, 0.2)], 0.3),
            Sfx::Trap => noise_sweep(0.25, 180.0, 60.0, 0.35),
            Sfx::TrapCrunch => noise_sweep(0.08, 400.0, 150.0, 0.2),
            Sfx::Locked => notes(&[(196.0, 0.07), (0.0, 0.04), (185.0, 0.1)], 0.3),
            Sfx::Enraged => growl(),
            // A4 → F#4 → Eb4 → C4
            Sfx::Caught => fade_tail(notes(&[(440.0, 0.12), (370.0, 0.12), (311.0, 0.12), (261.0, 0.2)], 0.3)),
            // C5 → E5 → G5 → C6, last one held
            Sfx::Escaped => notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.35)], 0.3),
        }
    }

    /// Note sequence, sine plus 2nd/3rd harmonics. A 0 Hz note is a rest.
    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in seq {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                if freq == 0.0 {
                    samples.push(0.0);
                    continue;
                }
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * 2.0 * PI).sin() * 0.6
                    + (t * freq * 2.0 * 2.0 * PI).sin() * 0.25
                    + (t * freq * 3.0 * 2.0 * PI).sin() * 0.15;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Tone-and-noise burst sliding from `from_hz` to `to_hz`.
    fn noise_sweep(duration: f32, from_hz: f32, to_hz: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 12345;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from_hz + (to_hz - from_hz) * t;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let tone = (ti * freq * 2.0 * PI).sin();
                // LCG noise
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(0.8);
                (tone * 0.5 + noise * 0.5) * env * volume
            })
            .collect()
    }

    /// Rising, wobbling low square-ish tone.
    fn growl() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.6) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 70.0 + t * 90.0 + (ti * 18.0 * 2.0 * PI).sin() * 8.0;
                let wave = (ti * freq * 2.0 * PI).sin().signum() * 0.5
                    + (ti * freq * 2.0 * PI).sin() * 0.5;
                let env = (t * 8.0).min(1.0) * (1.0 - t).powf(0.4);
                wave * env * 0.3
            })
            .collect()
    }

    fn fade_tail(mut samples: Vec<f32>) -> Vec<f32> {
        let total = samples.len();
        let fade_len = total / 4;
        for i in (total - fade_len)..total {
            samples[i] *= (total - i) as f32 / fade_len as f32;
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
    pub fn play_event(&self, _event: &GameEvent) {}
}
