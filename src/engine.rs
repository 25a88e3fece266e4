//! PerformanceEngine that ties key handling, hold, voices, arpeggiator and clock together

use std::sync::Arc;

use tracing::{debug, trace};

use polykey_arp::{ArpMode, ArpTransition, ArpVelocity, Arpeggiator};
use polykey_core::{ClockInputs, ClockMultiplexer, ClockSource, ExternalStatus, Micros, MidiDivision};
use polykey_synth::{
    HoldLatch, KeyMode, NoteRegistry, StealPolicy, Tuning, VoiceAllocator, VoiceCommand, Zone,
    ZoneLayout, A4_NOTE, MAX_UNISON_VOICES, NUM_PITCHES,
};

use crate::output::{EngineEvent, EngineOutput};
use crate::state::PerformanceState;
use crate::{EngineBuilder, EngineConfig, Result};

/// Telemetry slots reserved up front; one poll rarely produces more than a few.
const EVENT_CAPACITY: usize = 32;

/// Polyphonic performance engine.
///
/// Owns all mutable state and is driven from a single poll loop. Key, pedal
/// and control events are applied as they arrive; [`poll`](Self::poll)
/// evaluates the clock and the arpeggiator and then flushes every queued
/// voice command in order. Interrupt and MIDI callbacks only touch the
/// shared [`ClockInputs`].
///
/// # Example
///
/// ```
/// use polykey::prelude::*;
///
/// struct Print;
///
/// impl EngineOutput for Print {
///     fn voice_note_on(&mut self, voice: usize, frequency: f32, velocity: u8) {
///         println!("on  {voice} {frequency:.1}Hz {velocity}");
///     }
///
///     fn voice_note_off(&mut self, voice: usize) {
///         println!("off {voice}");
///     }
/// }
///
/// let mut engine = PerformanceEngine::builder()
///     .voices(8)
///     .key_mode(KeyMode::Split)
///     .build()?;
///
/// engine.on_key_event(Zone::Whole, 48, true, 100);
/// engine.on_key_event(Zone::Whole, 72, true, 100);
/// engine.poll(0, &mut Print);
/// # Ok::<(), polykey::Error>(())
/// ```
pub struct PerformanceEngine {
    state: PerformanceState,
    clock: ClockMultiplexer,
    inputs: Arc<ClockInputs>,
    events: Vec<EngineEvent>,
    /// Physical sustain pedal, re-applied to the zones of a new layout
    pedal_down: bool,
    /// Timestamp of the latest poll
    now: Micros,
}

impl PerformanceEngine {
    /// Create a new engine builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let inputs = Arc::new(ClockInputs::new(
            config.clock.rate_hz,
            config.clock.min_pulse_spacing_us,
        ));
        let clock = ClockMultiplexer::new(&config.clock, Arc::clone(&inputs));

        let layout = ZoneLayout {
            mode: config.key_mode,
            split_point: config.split_point,
            lower_voices: config.lower_voice_count(),
            total_voices: config.voices.max_voices,
        };
        let mut voices = VoiceAllocator::new(config.voices.clone());
        voices.set_tuning(Tuning::equal_temperament_with_reference(
            config.reference_hz,
            A4_NOTE,
        ));
        voices.set_unison_detune(config.unison.detune_cents);
        voices.set_layout(layout);

        let mut state = PerformanceState {
            registry: NoteRegistry::new(),
            voices,
            hold: HoldLatch::new(),
            arp: Arpeggiator::new(config.arp.clone()),
            layout,
            unison_voices: config.unison.voice_count as usize,
            unison_note: None,
            octaves: config.octaves,
            dual_detune_cents: config.dual_detune_cents,
        };
        state.apply_zone_settings();

        debug!(
            voices = config.voices.max_voices,
            mode = layout.mode.name(),
            source = config.clock.source.name(),
            "performance engine ready"
        );

        Ok(Self {
            state,
            clock,
            inputs,
            events: Vec::with_capacity(EVENT_CAPACITY),
            pedal_down: false,
            now: 0,
        })
    }

    pub fn state(&self) -> &PerformanceState {
        &self.state
    }

    /// Shared handle for the clock-in interrupt and the MIDI callback.
    pub fn clock_inputs(&self) -> Arc<ClockInputs> {
        Arc::clone(&self.inputs)
    }

    pub fn clock_source(&self) -> ClockSource {
        self.clock.source()
    }

    pub fn external_clock_status(&self) -> ExternalStatus {
        self.clock.external_status()
    }

    /// True while the active clock source cannot produce steps.
    pub fn is_clock_halted(&self) -> bool {
        self.clock.is_halted()
    }

    pub fn smoothed_arp_rate(&self) -> f32 {
        self.clock.smoothed_rate_hz()
    }

    // =========================================================================
    // Keys and hold
    // =========================================================================

    /// A physical key changed state.
    ///
    /// `Zone::Whole` routes through the current layout: by split point in
    /// split mode, to both layers in dual mode. `Lower` and `Upper` address a
    /// zone directly and are ignored when the layout has no such zone.
    pub fn on_key_event(&mut self, zone: Zone, pitch: u8, down: bool, velocity: u8) {
        if pitch as usize >= NUM_PITCHES {
            return;
        }

        let zones: &'static [Zone] = match zone {
            Zone::Whole => self.state.layout.route(pitch),
            Zone::Lower => &[Zone::Lower],
            Zone::Upper => &[Zone::Upper],
        };

        for &zone in zones {
            if !self.state.layout.mode.zones().contains(&zone) {
                trace!(zone = zone.name(), pitch, "key for inactive zone ignored");
                continue;
            }
            self.key_in_zone(zone, pitch, down, velocity);
        }
    }

    fn key_in_zone(&mut self, zone: Zone, pitch: u8, down: bool, velocity: u8) {
        let state = &mut self.state;
        let changed = if down {
            state.registry.key_down(zone, pitch, velocity)
        } else {
            state.registry.key_up(zone, pitch)
        };
        if !changed {
            return;
        }

        // The arpeggiator owns its zone: keys only shape the held set.
        if zone == state.arp_zone() && state.arp.mode().is_on() {
            if down {
                state.arp.note_velocity(velocity);
            }
            state.arp.notes_changed();
            self.sync_arp();
            return;
        }

        if down {
            self.note_on(zone, pitch, velocity);
        } else {
            self.note_off(zone, pitch);
        }
    }

    fn note_on(&mut self, zone: Zone, pitch: u8, velocity: u8) {
        let state = &mut self.state;
        state.hold.on_key_down(zone, pitch);

        let allocation = if state.layout.mode == KeyMode::Unison {
            // A new key takes over the whole stack
            if let Some(previous) = state.unison_note().filter(|&p| p != pitch) {
                state.voices.force_release(zone, previous);
                state.hold.forget(zone, previous);
            }
            state.unison_note = Some(pitch);
            state
                .voices
                .assign_unison(zone, pitch, velocity, state.unison_voices)
        } else {
            state.voices.assign(zone, pitch, velocity)
        };

        state.hold.forget_stolen(&allocation.stolen, &state.voices);
    }

    fn note_off(&mut self, zone: Zone, pitch: u8) {
        let state = &mut self.state;

        if state.layout.mode == KeyMode::Unison {
            if state.unison_note() != Some(pitch) {
                return;
            }
            if let Some(next) = state.registry.last_pressed(zone) {
                // Fall back to the newest key still down
                state.voices.force_release(zone, pitch);
                state.hold.forget(zone, pitch);
                let velocity = state.registry.velocity(zone, next);
                state.unison_note = Some(next);
                state
                    .voices
                    .assign_unison(zone, next, velocity, state.unison_voices);
                return;
            }
        }

        state.hold.on_key_up(zone, pitch, &mut state.voices);
    }

    /// Sustain pedal. Applies to every zone of the current layout.
    pub fn on_pedal_event(&mut self, down: bool) {
        self.pedal_down = down;
        let state = &mut self.state;
        for &zone in state.layout.mode.zones() {
            state.hold.on_pedal_change(zone, down, &mut state.voices);
        }
    }

    /// Hold button. Toggles every zone of the current layout.
    pub fn on_manual_hold_toggle(&mut self) {
        let state = &mut self.state;
        for &zone in state.layout.mode.zones() {
            state.hold.on_manual_hold_toggle(zone, &mut state.voices);
        }
    }

    pub fn set_manual_hold(&mut self, zone: Zone, on: bool) {
        let state = &mut self.state;
        state.hold.set_manual(zone, on, &mut state.voices);
    }

    // =========================================================================
    // Arpeggiator and clock
    // =========================================================================

    pub fn on_mode_change(&mut self, mode: ArpMode) {
        let state = &mut self.state;
        if let Some(ArpTransition::Stopped) = state.arp.set_mode(mode, &mut state.voices) {
            self.events.push(EngineEvent::ArpStopped);
        }
        self.sync_arp();
    }

    pub fn on_range_change(&mut self, range: u8) {
        self.state.arp.set_range(range);
    }

    pub fn set_arp_velocity(&mut self, velocity: ArpVelocity) {
        self.state.arp.set_velocity(velocity);
    }

    /// Switch the step source. The sounding arpeggiator note is released
    /// before the new source produces its first step.
    pub fn on_clock_source_change(&mut self, source: ClockSource) {
        if self.clock.set_source(source) {
            let state = &mut self.state;
            if state.arp.force_release(&mut state.voices) {
                trace!("in-flight arp note released on source change");
            }
        }
    }

    /// Internal clock rate in steps per second. Smoothed, clamped to the
    /// supported range.
    pub fn set_arp_rate(&mut self, hz: f32) {
        self.inputs.set_rate_hz(hz);
    }

    pub fn set_midi_division(&mut self, division: MidiDivision) {
        self.clock.set_midi_division(division);
    }

    pub fn set_pulses_per_step(&mut self, pulses: u32) {
        self.clock.set_pulses_per_step(pulses);
    }

    fn sync_arp(&mut self) {
        let state = &mut self.state;
        let zone = state.arp_zone();
        let held = state.registry.held_count(zone);

        match state.arp.sync(held, &mut state.voices) {
            Some(ArpTransition::Started) => {
                // Keys that were sounding on their own hand over to the arpeggiator
                state.voices.release_zone(zone);
                state.hold.clear_latched(zone);
                if zone == Zone::Whole {
                    state.unison_note = None;
                }
                self.clock.restart(self.now);
                self.events.push(EngineEvent::ArpStarted);
            }
            Some(ArpTransition::Stopped) => self.events.push(EngineEvent::ArpStopped),
            None => {}
        }
    }

    // =========================================================================
    // Zones and voices
    // =========================================================================

    /// Change the keyboard layout. Everything is released and the
    /// arpeggiator stops; keys held across the change must be pressed again.
    pub fn on_zone_config_change(&mut self, mode: KeyMode) {
        if mode == self.state.layout.mode {
            return;
        }
        let layout = ZoneLayout {
            mode,
            ..self.state.layout
        };
        self.apply_layout(layout);
    }

    /// Move the split point. Takes effect immediately in split mode (with the
    /// same reset as a layout change) and is remembered otherwise.
    pub fn set_split_point(&mut self, pitch: u8) -> Result<()> {
        if pitch as usize >= NUM_PITCHES {
            return Err(polykey_synth::Error::InvalidSplitPoint(pitch).into());
        }
        if pitch == self.state.layout.split_point {
            return Ok(());
        }

        let layout = ZoneLayout {
            split_point: pitch,
            ..self.state.layout
        };
        if layout.mode == KeyMode::Split {
            self.apply_layout(layout);
        } else {
            self.state.layout = layout;
        }
        Ok(())
    }

    fn apply_layout(&mut self, layout: ZoneLayout) {
        let state = &mut self.state;
        if state.arp.stop(&mut state.voices) {
            self.events.push(EngineEvent::ArpStopped);
        }

        state.voices.set_layout(layout);
        state.layout = *state.voices.layout();
        state.registry.clear_all();
        state.hold.clear_all_latched();
        state.unison_note = None;
        state.apply_zone_settings();

        // Nothing is latched any more, so these only set the flags. Zones
        // outside the layout cannot be reached by the pedal or the toggle.
        for zone in Zone::ALL {
            let in_layout = state.layout.mode.zones().contains(&zone);
            state
                .hold
                .on_pedal_change(zone, in_layout && self.pedal_down, &mut state.voices);
            if !in_layout {
                state.hold.set_manual(zone, false, &mut state.voices);
            }
        }
    }

    /// Octave shift for `zone`, clamped to -2..=2. Applies to notes started
    /// from now on.
    pub fn set_octave(&mut self, zone: Zone, octave: i8) {
        self.state.octaves[zone] = octave.clamp(-2, 2);
        self.state.apply_zone_settings();
    }

    /// Upper-layer detune in dual mode.
    pub fn set_dual_detune(&mut self, cents: f32) {
        self.state.dual_detune_cents = cents;
        self.state.apply_zone_settings();
    }

    pub fn set_unison_voices(&mut self, count: usize) {
        self.state.unison_voices = count.clamp(1, MAX_UNISON_VOICES);
    }

    pub fn set_unison_detune(&mut self, cents: f32) {
        self.state.voices.set_unison_detune(cents);
    }

    pub fn set_steal_policy(&mut self, zone: Zone, policy: StealPolicy) {
        self.state.voices.set_policy(zone, policy);
    }

    // =========================================================================
    // Poll
    // =========================================================================

    /// Run one iteration of the performance loop at time `now`.
    ///
    /// Drains the clock, steps the arpeggiator, then hands every queued voice
    /// command and telemetry event to `out`.
    pub fn poll(&mut self, now: Micros, out: &mut impl EngineOutput) {
        self.now = now;
        let tick = self.clock.poll(now);

        if tick.pulse {
            self.events.push(EngineEvent::ExternalClockPulse);
        }
        if tick.locked {
            self.events.push(EngineEvent::ExternalClockLocked);
        }
        if tick.lost {
            self.events.push(EngineEvent::ExternalClockLost);
        }
        if let Some(transport) = tick.transport {
            self.events.push(EngineEvent::MidiTransport(transport));
        }

        let state = &mut self.state;
        if tick.halt && state.arp.force_release(&mut state.voices) {
            debug!(source = self.clock.source().name(), "clock halted, arp note released");
        }

        let zone = state.arp_zone();
        for _ in 0..tick.steps {
            if !state.arp.is_running() {
                break;
            }
            match state.arp.step(&state.registry, zone, &mut state.voices) {
                Some(step) => self.events.push(EngineEvent::ArpStep {
                    pitch: step.pitch,
                    position: step.position,
                }),
                None => {
                    self.events.push(EngineEvent::ArpStopped);
                    break;
                }
            }
        }

        for command in state.voices.take_commands() {
            match command {
                VoiceCommand::NoteOn {
                    voice,
                    frequency,
                    velocity,
                } => out.voice_note_on(voice, frequency, velocity),
                VoiceCommand::NoteOff { voice } => out.voice_note_off(voice),
            }
        }
        for event in self.events.drain(..) {
            out.telemetry(event);
        }
    }
}
