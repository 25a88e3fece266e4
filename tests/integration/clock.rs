//! Clock sources feeding the arpeggiator

use polykey::prelude::*;
use polykey::{ExternalStatus, Micros};

use crate::helpers::*;

const LOSS_TIMEOUT_US: Micros = 500_000;

fn external_rig() -> Rig {
    Rig::new(
        test_builder(8, KeyMode::Whole)
            .clock_source(ClockSource::External)
            .clock_loss_timeout(LOSS_TIMEOUT_US)
            .arp_mode(ArpMode::Up)
            .build()
            .unwrap(),
    )
}

fn midi_rig() -> Rig {
    Rig::new(
        test_builder(8, KeyMode::Whole)
            .clock_source(ClockSource::Midi)
            .arp_mode(ArpMode::Up)
            .build()
            .unwrap(),
    )
}

impl Rig {
    fn pulse(&mut self, at: Micros) -> bool {
        self.now = at;
        self.engine.clock_inputs().on_external_clock_pulse(at)
    }

    fn midi_ticks(&mut self, count: usize) {
        let inputs = self.engine.clock_inputs();
        for _ in 0..count {
            inputs.on_midi_clock_tick();
        }
    }
}

#[test]
fn test_external_pulse_steps_arp() {
    let mut rig = external_rig();
    rig.press(C4);
    rig.press(E4);

    // Nothing until the first pulse
    rig.advance(50_000);
    assert!(rig.out.arp_pitches().is_empty());
    assert_eq!(rig.engine.external_clock_status(), ExternalStatus::Waiting);

    assert!(rig.pulse(60_000));
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4]);
    assert!(rig.out.saw(EngineEvent::ExternalClockPulse));
    assert!(rig.out.saw(EngineEvent::ExternalClockLocked));
    assert_eq!(rig.engine.external_clock_status(), ExternalStatus::Running);

    rig.pulse(160_000);
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4, E4]);
}

#[test]
fn test_external_debounce() {
    let mut rig = external_rig();
    rig.press(C4);
    rig.press(E4);

    assert!(rig.pulse(10_000));
    assert!(!rig.pulse(11_000));
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4]);
}

#[test]
fn test_external_timeout_halts_arp() {
    let mut rig = external_rig();
    rig.press(C4);
    rig.pulse(1_000);
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4]);
    assert_eq!(rig.out.sounding().len(), 1);

    rig.advance(LOSS_TIMEOUT_US + 1_000);
    assert!(rig.out.saw(EngineEvent::ExternalClockLost));
    assert!(rig.out.sounding().is_empty());
    assert!(rig.engine.is_clock_halted());
    assert_eq!(rig.engine.external_clock_status(), ExternalStatus::Lost);

    // The arpeggiator is still armed and resumes with the next pulse
    assert!(rig.engine.state().arp().is_running());
    rig.advance(LOSS_TIMEOUT_US);
    assert_eq!(rig.out.arp_pitches().len(), 1);

    let at = rig.now + 1_000;
    rig.pulse(at);
    rig.poll();
    assert_eq!(rig.out.arp_pitches().len(), 2);
    assert!(!rig.engine.is_clock_halted());
}

#[test]
fn test_pulses_per_step() {
    let mut rig = external_rig();
    rig.engine.set_pulses_per_step(3);
    rig.press(C4);
    rig.press(E4);

    for i in 1..=6 {
        rig.pulse(i * 10_000);
        rig.poll();
    }
    assert_eq!(rig.out.arp_pitches(), vec![C4, E4]);
}

#[test]
fn test_switch_internal_to_external_releases_note() {
    let mut rig = arp_rig(ArpMode::Up, 1);
    rig.press(C4);
    rig.press(E4);
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4]);

    rig.engine.on_clock_source_change(ClockSource::External);
    rig.poll();
    assert_eq!(rig.out.note_offs(), vec![0]);
    assert!(rig.out.sounding().is_empty());

    // The internal clock no longer steps
    rig.advance(STEP_US * 2);
    assert_eq!(rig.out.arp_pitches(), vec![C4]);

    let at = rig.now + 1_000;
    rig.pulse(at);
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4, E4]);
}

#[test]
fn test_switch_to_internal_counts_from_next_poll() {
    let mut rig = external_rig();
    rig.press(C4);
    rig.press(E4);
    rig.poll();
    assert!(rig.out.arp_pitches().is_empty());

    // Switched long after the last poll
    rig.now = 1_000_000;
    rig.engine.on_clock_source_change(ClockSource::Internal);
    rig.poll();
    assert!(rig.out.arp_pitches().is_empty());

    rig.advance(STEP_US - 1);
    assert!(rig.out.arp_pitches().is_empty());
    rig.advance(1);
    assert_eq!(rig.out.arp_pitches(), vec![C4]);
}

#[test]
fn test_switch_to_same_source_is_noop() {
    let mut rig = arp_rig(ArpMode::Up, 1);
    rig.press(C4);
    rig.poll();

    rig.engine.on_clock_source_change(ClockSource::Internal);
    rig.poll();
    assert!(rig.out.note_offs().is_empty());
    assert_eq!(rig.out.sounding().len(), 1);
}

#[test]
fn test_midi_clock_sixteenth_steps() {
    let mut rig = midi_rig();
    rig.press(C4);
    rig.press(E4);
    rig.press(G4);

    rig.engine.clock_inputs().on_midi_start();
    rig.poll();
    assert!(rig.out.saw(EngineEvent::MidiTransport(MidiTransport::Started)));
    assert!(rig.out.arp_pitches().is_empty());

    rig.midi_ticks(1);
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4]);

    rig.midi_ticks(5);
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4]);

    rig.midi_ticks(1);
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4, E4]);

    // Several steps worth of ticks between polls
    rig.midi_ticks(12);
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4, E4, G4, C4]);
}

#[test]
fn test_midi_stop_releases_note() {
    let mut rig = midi_rig();
    rig.press(C4);
    rig.engine.clock_inputs().on_midi_start();
    rig.midi_ticks(1);
    rig.poll();
    assert_eq!(rig.out.sounding().len(), 1);

    rig.engine.clock_inputs().on_midi_stop();
    rig.poll();
    assert!(rig.out.saw(EngineEvent::MidiTransport(MidiTransport::Stopped)));
    assert!(rig.out.sounding().is_empty());
    assert!(rig.engine.is_clock_halted());

    // Ticks after Stop are ignored
    rig.midi_ticks(24);
    rig.poll();
    assert_eq!(rig.out.arp_pitches().len(), 1);
}

#[test]
fn test_midi_division_eighth() {
    let mut rig = midi_rig();
    rig.engine.set_midi_division(MidiDivision::Eighth);
    rig.press(C4);
    rig.press(E4);
    rig.engine.clock_inputs().on_midi_start();

    rig.midi_ticks(24);
    rig.poll();
    assert_eq!(rig.out.arp_pitches(), vec![C4, E4]);
}

#[test]
fn test_internal_rate_smoothing() {
    let mut engine = PerformanceEngine::builder()
        .arp_rate(4.0)
        .rate_smoothing(50_000)
        .build()
        .unwrap();
    let mut out = Recorder::default();

    engine.set_arp_rate(8.0);
    engine.poll(10_000, &mut out);
    let rate = engine.smoothed_arp_rate();
    assert!(rate > 4.0 && rate < 8.0, "rate {rate}");

    engine.poll(2_000_000, &mut out);
    assert!((engine.smoothed_arp_rate() - 8.0).abs() < 0.01);
}
