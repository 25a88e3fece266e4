//! Sustain pedal and manual hold

use polykey::prelude::*;

use crate::helpers::*;

#[test]
fn test_pedal_latches_then_releases_voice() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.engine.on_pedal_event(true);
    rig.press(C4);
    rig.release(C4);
    rig.poll();

    assert_eq!(rig.out.note_ons(), vec![0]);
    assert!(rig.out.note_offs().is_empty());
    assert!(rig.engine.state().hold().is_latched(Zone::Whole, C4));

    rig.engine.on_pedal_event(false);
    rig.poll();
    assert_eq!(rig.out.note_offs(), vec![0]);
    assert_eq!(rig.engine.state().hold().latched_count(Zone::Whole), 0);
    assert!(rig.out.sounding().is_empty());
}

#[test]
fn test_pedal_up_releases_only_latched_voices() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.press(C4);
    rig.press(E4);
    rig.engine.on_pedal_event(true);
    rig.release(C4);
    rig.press(G4);
    rig.engine.on_pedal_event(false);
    rig.poll();

    assert_eq!(rig.out.note_offs(), vec![0]);
    let sounding: Vec<usize> = rig.out.sounding().into_iter().collect();
    assert_eq!(sounding, vec![1, 2]);
}

#[test]
fn test_pedal_down_late_does_not_catch_released_keys() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.press(C4);
    rig.release(C4);
    rig.engine.on_pedal_event(true);
    rig.poll();

    assert_eq!(rig.out.note_offs(), vec![0]);
    assert_eq!(rig.engine.state().hold().latched_count(Zone::Whole), 0);
}

#[test]
fn test_repress_latched_key_retriggers_same_voice() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.engine.on_pedal_event(true);
    rig.press(C4);
    rig.release(C4);
    rig.press(C4);
    rig.poll();

    assert_eq!(rig.out.note_ons(), vec![0, 0]);
    assert_eq!(rig.out.note_offs(), vec![0]);
    assert!(!rig.engine.state().hold().is_latched(Zone::Whole, C4));

    rig.release(C4);
    rig.engine.on_pedal_event(false);
    rig.poll();
    assert_eq!(rig.out.note_offs(), vec![0, 0]);
}

#[test]
fn test_manual_hold_toggle() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.engine.on_manual_hold_toggle();
    assert!(rig.engine.state().hold().is_active(Zone::Whole));

    rig.press(C4);
    rig.press(E4);
    rig.release(C4);
    rig.release(E4);
    rig.poll();
    assert!(rig.out.note_offs().is_empty());
    assert_eq!(rig.engine.state().hold().latched_count(Zone::Whole), 2);

    rig.engine.on_manual_hold_toggle();
    rig.poll();
    assert_eq!(rig.out.note_offs(), vec![0, 1]);
}

#[test]
fn test_pedal_and_manual_hold_combine() {
    let mut rig = rig(4, KeyMode::Whole);
    rig.engine.set_manual_hold(Zone::Whole, true);
    rig.engine.on_pedal_event(true);
    rig.press(C4);
    rig.release(C4);

    // Hold stays active while either source is on
    rig.engine.on_pedal_event(false);
    rig.poll();
    assert!(rig.out.note_offs().is_empty());

    rig.engine.set_manual_hold(Zone::Whole, false);
    rig.poll();
    assert_eq!(rig.out.note_offs(), vec![0]);
}

#[test]
fn test_stolen_latched_voice_is_forgotten() {
    let mut rig = rig(1, KeyMode::Whole);
    rig.engine.on_pedal_event(true);
    rig.press(C4);
    rig.release(C4);
    rig.press(E4);
    rig.poll();

    let hold = rig.engine.state().hold();
    assert!(!hold.is_latched(Zone::Whole, C4));
    assert!(rig.engine.state().voices().is_sounding(Zone::Whole, E4));

    rig.out.clear();
    rig.engine.on_pedal_event(false);
    rig.poll();
    // E4 is still held down
    assert!(rig.out.note_offs().is_empty());
}

#[test]
fn test_split_pedal_applies_to_both_zones() {
    let mut rig = rig(8, KeyMode::Split);
    rig.engine.on_pedal_event(true);
    rig.press(48);
    rig.press(72);
    rig.release(48);
    rig.release(72);
    rig.poll();
    assert!(rig.out.note_offs().is_empty());

    rig.engine.on_pedal_event(false);
    rig.poll();
    let mut offs = rig.out.note_offs();
    offs.sort_unstable();
    assert_eq!(offs, vec![0, 4]);
}

#[test]
fn test_pedal_released_in_other_layout_does_not_stick() {
    let mut rig = rig(8, KeyMode::Whole);
    rig.engine.on_pedal_event(true);
    rig.engine.on_zone_config_change(KeyMode::Split);
    rig.engine.on_pedal_event(false);
    rig.engine.on_zone_config_change(KeyMode::Whole);
    assert!(!rig.engine.state().hold().is_active(Zone::Whole));

    rig.press(C4);
    rig.release(C4);
    rig.poll();
    assert_eq!(rig.out.note_ons(), vec![0]);
    assert_eq!(rig.out.note_offs(), vec![0]);
    assert!(rig.out.sounding().is_empty());
}

#[test]
fn test_pedal_held_across_layout_change_keeps_sustaining() {
    let mut rig = rig(8, KeyMode::Whole);
    rig.engine.on_pedal_event(true);
    rig.engine.on_zone_config_change(KeyMode::Split);
    rig.press(48);
    rig.release(48);
    rig.poll();
    assert!(rig.out.note_offs().is_empty());
    assert!(rig.engine.state().hold().is_latched(Zone::Lower, 48));

    rig.engine.on_pedal_event(false);
    rig.poll();
    assert_eq!(rig.out.note_offs(), vec![0]);
    assert!(rig.out.sounding().is_empty());
}

#[test]
fn test_manual_hold_cleared_for_zones_leaving_layout() {
    let mut rig = rig(8, KeyMode::Whole);
    rig.engine.on_manual_hold_toggle();
    rig.engine.on_zone_config_change(KeyMode::Split);
    rig.engine.on_zone_config_change(KeyMode::Whole);
    assert!(!rig.engine.state().hold().manual(Zone::Whole));

    rig.press(C4);
    rig.release(C4);
    rig.poll();
    assert!(rig.out.sounding().is_empty());
}
