//! Voice allocation through the engine

use approx::assert_relative_eq;
use polykey::prelude::*;

use crate::helpers::*;

#[test]
fn test_note_on_off_frees_voice() {
    let mut rig = rig(4, KeyMode::Whole);

    rig.press(C4);
    rig.poll();
    assert_eq!(rig.out.note_ons(), vec![0]);
    assert!(rig.engine.state().voices().is_sounding(Zone::Whole, C4));

    rig.release(C4);
    rig.poll();
    assert_eq!(rig.out.note_offs(), vec![0]);
    assert_eq!(rig.engine.state().voices().active_count(Zone::Whole), 0);
    assert!(rig.out.sounding().is_empty());
}

#[test]
fn test_chord_uses_lowest_free_voices() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.press(C4);
    rig.press(E4);
    rig.press(G4);
    rig.release(E4);
    rig.press(A4);
    rig.poll();

    assert_eq!(rig.out.note_ons(), vec![0, 1, 2, 1]);
    assert_eq!(rig.out.note_offs(), vec![1]);
    assert_eq!(rig.engine.state().voices().active_count(Zone::Whole), 3);
}

#[test]
fn test_single_voice_steal_emits_off_before_on() {
    let mut rig = rig(1, KeyMode::Whole);
    rig.press(C4);
    rig.press(E4);
    rig.poll();

    assert_eq!(rig.out.commands.len(), 3);
    assert!(matches!(rig.out.commands[0], Command::On { voice: 0, .. }));
    assert_eq!(rig.out.commands[1], Command::Off { voice: 0 });
    assert!(matches!(rig.out.commands[2], Command::On { voice: 0, .. }));
    assert!(rig.engine.state().voices().is_sounding(Zone::Whole, E4));
    assert!(!rig.engine.state().voices().is_sounding(Zone::Whole, C4));
}

#[test]
fn test_release_of_stolen_key_is_silent() {
    let mut rig = rig(1, KeyMode::Whole);
    rig.press(C4);
    rig.press(E4);
    rig.poll();
    rig.out.clear();

    rig.release(C4);
    rig.poll();
    assert!(rig.out.commands.is_empty());
    assert!(rig.engine.state().voices().is_sounding(Zone::Whole, E4));
}

#[test]
fn test_no_steal_drops_new_note() {
    let mut rig = rig(1, KeyMode::Whole);
    rig.engine.set_steal_policy(Zone::Whole, StealPolicy::NoSteal);

    rig.press(C4);
    rig.press(E4);
    rig.poll();

    assert_eq!(rig.out.note_ons(), vec![0]);
    assert!(rig.out.note_offs().is_empty());
    assert!(rig.engine.state().voices().is_sounding(Zone::Whole, C4));
    // The key is still tracked as held
    assert_eq!(rig.engine.state().registry().held_count(Zone::Whole), 2);
}

#[test]
fn test_highest_note_policy_steals_highest() {
    let mut rig = Rig::new(
        test_builder(2, KeyMode::Whole)
            .steal_policy(Zone::Whole, StealPolicy::HighestNote)
            .build()
            .unwrap(),
    );
    rig.press(G4);
    rig.press(C4);
    rig.press(E4);
    rig.poll();

    let voices = rig.engine.state().voices();
    assert!(!voices.is_sounding(Zone::Whole, G4));
    assert!(voices.is_sounding(Zone::Whole, C4));
    assert!(voices.is_sounding(Zone::Whole, E4));
}

#[test]
fn test_duplicate_key_down_ignored() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.press(C4);
    rig.press(C4);
    rig.poll();

    assert_eq!(rig.out.note_ons(), vec![0]);
    assert_eq!(rig.engine.state().voices().active_count(Zone::Whole), 1);
}

#[test]
fn test_a4_frequency() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.press(A4);
    rig.poll();
    assert_relative_eq!(rig.out.frequencies()[0], 440.0, epsilon = FREQ_EPSILON);
}

#[test]
fn test_octave_shift_applies_to_new_notes() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.engine.set_octave(Zone::Whole, 1);
    rig.press(A4);
    rig.engine.set_octave(Zone::Whole, -1);
    rig.press(C4);
    rig.poll();

    let freqs = rig.out.frequencies();
    assert_relative_eq!(freqs[0], 880.0, epsilon = FREQ_EPSILON);
    assert_relative_eq!(freqs[1], 130.8128, epsilon = FREQ_EPSILON);
}

#[test]
fn test_reference_pitch() {
    let mut rig = Rig::new(test_builder(4, KeyMode::Whole).reference_hz(432.0).build().unwrap());
    rig.press(A4);
    rig.press(A4 + 12);
    rig.poll();

    let freqs = rig.out.frequencies();
    assert_relative_eq!(freqs[0], 432.0, epsilon = FREQ_EPSILON);
    assert_relative_eq!(freqs[1], 864.0, epsilon = FREQ_EPSILON);
}

#[test]
fn test_velocity_passed_through() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.engine.on_key_event(Zone::Whole, C4, true, 37);
    rig.poll();
    assert!(matches!(
        rig.out.commands[0],
        Command::On { velocity: 37, .. }
    ));
}
