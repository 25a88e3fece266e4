//! Split, dual and unison layouts

use approx::assert_relative_eq;
use polykey::prelude::*;

use crate::helpers::*;

const LOW: u8 = 48;
const HIGH: u8 = 72;
const DEFAULT_SPLIT: u8 = polykey::DEFAULT_SPLIT_POINT;

#[test]
fn test_split_routes_by_split_point() {
    let mut rig = rig(8, KeyMode::Split);
    rig.press(LOW);
    rig.press(HIGH);
    rig.press(DEFAULT_SPLIT);
    rig.poll();

    let voices = rig.engine.state().voices();
    assert!(voices.is_sounding(Zone::Lower, LOW));
    assert!(voices.is_sounding(Zone::Upper, HIGH));
    // The split point itself belongs to the upper zone
    assert!(voices.is_sounding(Zone::Upper, DEFAULT_SPLIT));
    assert_eq!(rig.out.note_ons(), vec![0, 4, 5]);
}

#[test]
fn test_split_zones_do_not_steal_from_each_other() {
    let mut rig = Rig::new(
        test_builder(4, KeyMode::Split)
            .lower_voices(1)
            .build()
            .unwrap(),
    );
    rig.press(HIGH);
    rig.press(LOW);
    rig.press(LOW + 2);
    rig.poll();

    let voices = rig.engine.state().voices();
    assert!(voices.is_sounding(Zone::Upper, HIGH));
    assert!(voices.is_sounding(Zone::Lower, LOW + 2));
    assert!(!voices.is_sounding(Zone::Lower, LOW));
    assert_eq!(voices.active_count(Zone::Lower), 1);
}

#[test]
fn test_split_arp_reads_lower_zone_only() {
    let mut rig = Rig::new(
        test_builder(8, KeyMode::Split)
            .arp_mode(ArpMode::Up)
            .build()
            .unwrap(),
    );
    rig.press(LOW);
    rig.press(LOW + 4);
    rig.press(HIGH);
    rig.run_steps(3);

    assert_eq!(rig.out.arp_pitches(), vec![LOW, LOW + 4, LOW]);
    // The upper key sounds normally and is never touched by the arpeggiator
    assert!(rig.engine.state().voices().is_sounding(Zone::Upper, HIGH));
    assert!(!rig.out.note_offs().contains(&4));
    assert_eq!(rig.engine.state().voices().active_count(Zone::Lower), 1);
}

#[test]
fn test_dual_sounds_both_layers() {
    let mut rig = rig(8, KeyMode::Dual);
    rig.press(A4);
    rig.poll();

    assert_eq!(rig.out.note_ons(), vec![0, 4]);
    let voices = rig.engine.state().voices();
    assert!(voices.is_sounding(Zone::Lower, A4));
    assert!(voices.is_sounding(Zone::Upper, A4));

    rig.release(A4);
    rig.poll();
    assert_eq!(rig.out.note_offs(), vec![0, 4]);
}

#[test]
fn test_dual_detune_applies_to_upper_layer() {
    let mut rig = Rig::new(
        test_builder(8, KeyMode::Dual)
            .dual_detune(12.0)
            .build()
            .unwrap(),
    );
    rig.press(A4);
    rig.poll();

    let freqs = rig.out.frequencies();
    assert_relative_eq!(freqs[0], 440.0, epsilon = FREQ_EPSILON);
    assert_relative_eq!(
        freqs[1],
        440.0 * 2f32.powf(12.0 / 1200.0),
        epsilon = DETUNE_EPSILON
    );
}

#[test]
fn test_dual_octave_per_layer() {
    let mut rig = Rig::new(
        test_builder(8, KeyMode::Dual)
            .octave(Zone::Upper, 1)
            .build()
            .unwrap(),
    );
    rig.press(A4);
    rig.poll();

    let freqs = rig.out.frequencies();
    assert_relative_eq!(freqs[0], 440.0, epsilon = FREQ_EPSILON);
    assert_relative_eq!(freqs[1], 880.0, epsilon = FREQ_EPSILON);
}

#[test]
fn test_unison_stacks_voices() {
    let mut rig = Rig::new(
        test_builder(8, KeyMode::Unison)
            .unison_voices(3)
            .unison_detune(20.0)
            .build()
            .unwrap(),
    );
    rig.press(C4);
    rig.poll();

    assert_eq!(rig.out.note_ons(), vec![0, 1, 2]);
    let freqs = rig.out.frequencies();
    assert!(freqs.windows(2).all(|w| w[0] != w[1]));
    assert_eq!(rig.engine.state().unison_note(), Some(C4));
}

#[test]
fn test_unison_last_note_priority() {
    let mut rig = Rig::new(
        test_builder(8, KeyMode::Unison)
            .unison_voices(2)
            .build()
            .unwrap(),
    );
    rig.press(C4);
    rig.press(E4);
    rig.poll();
    assert_eq!(rig.engine.state().unison_note(), Some(E4));
    assert_eq!(rig.out.sounding().len(), 2);
    assert!(!rig.engine.state().voices().is_sounding(Zone::Whole, C4));

    // Releasing the newest key falls back to the one still held
    rig.release(E4);
    rig.poll();
    assert_eq!(rig.engine.state().unison_note(), Some(C4));
    assert!(rig.engine.state().voices().is_sounding(Zone::Whole, C4));
    assert_eq!(rig.out.sounding().len(), 2);

    rig.release(C4);
    rig.poll();
    assert_eq!(rig.engine.state().unison_note(), None);
    assert!(rig.out.sounding().is_empty());
}

#[test]
fn test_unison_release_of_background_key_is_silent() {
    let mut rig = Rig::new(
        test_builder(8, KeyMode::Unison)
            .unison_voices(2)
            .build()
            .unwrap(),
    );
    rig.press(C4);
    rig.press(E4);
    rig.poll();
    rig.out.clear();

    rig.release(C4);
    rig.poll();
    assert!(rig.out.commands.is_empty());
    assert_eq!(rig.engine.state().unison_note(), Some(E4));
}

#[test]
fn test_zone_config_change_silences_everything() {
    let mut rig = rig(8, KeyMode::Whole);
    rig.engine.on_pedal_event(true);
    rig.press(C4);
    rig.press(E4);
    rig.release(C4);
    rig.poll();

    rig.engine.on_zone_config_change(KeyMode::Dual);
    rig.poll();
    assert!(rig.out.sounding().is_empty());
    assert_eq!(rig.engine.state().key_mode(), KeyMode::Dual);
    assert_eq!(rig.engine.state().hold().latched_count(Zone::Whole), 0);

    // Keys held across the change must be struck again
    rig.release(E4);
    rig.poll();
    assert!(rig.out.sounding().is_empty());
}

#[test]
fn test_split_point_change_moves_boundary() {
    let mut rig = rig(8, KeyMode::Split);
    rig.engine.set_split_point(C4 + 12).unwrap();
    rig.press(E4);
    rig.poll();
    assert!(rig.engine.state().voices().is_sounding(Zone::Lower, E4));
}

#[test]
fn test_zone_change_stops_arp() {
    let mut rig = arp_rig(ArpMode::Up, 1);
    rig.press(C4);
    rig.poll();

    rig.engine.on_zone_config_change(KeyMode::Split);
    rig.poll();
    assert!(rig.out.saw(EngineEvent::ArpStopped));
    assert!(rig.out.sounding().is_empty());
    assert!(!rig.engine.state().arp().is_running());
}
