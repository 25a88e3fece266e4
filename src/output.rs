//! Engine output: voice commands and telemetry.

use polykey_core::MidiTransport;

/// Notifications for displays, LEDs and logging. None of them affect sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The arpeggiator sounded `pitch` at `position` in its pattern
    ArpStep { pitch: u8, position: usize },
    ArpStarted,
    ArpStopped,
    /// An external clock pulse was accepted since the last poll
    ExternalClockPulse,
    /// No external pulse within the loss timeout
    ExternalClockLost,
    /// External pulses arrived again after a loss, or for the first time
    ExternalClockLocked,
    MidiTransport(MidiTransport),
}

/// Receiver for everything the engine produces during [`poll`].
///
/// Voice commands arrive in emission order: a stolen voice's `voice_note_off`
/// always precedes the `voice_note_on` that reuses it.
///
/// [`poll`]: crate::PerformanceEngine::poll
pub trait EngineOutput {
    fn voice_note_on(&mut self, voice: usize, frequency: f32, velocity: u8);

    fn voice_note_off(&mut self, voice: usize);

    fn telemetry(&mut self, _event: EngineEvent) {}
}
