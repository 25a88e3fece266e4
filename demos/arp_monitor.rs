//! # Arp Monitor
//!
//! Runs the arpeggiator over a held C major chord on the internal clock and
//! prints every voice command. Set `RUST_LOG=trace` to see the engine's own
//! tracing output alongside.
//!
//! ```bash
//! cargo run --example arp_monitor
//! ```

use polykey::prelude::*;

struct Printer;

impl EngineOutput for Printer {
    fn voice_note_on(&mut self, voice: usize, frequency: f32, velocity: u8) {
        println!("  on  voice {voice} {frequency:7.2} Hz vel {velocity}");
    }

    fn voice_note_off(&mut self, voice: usize) {
        println!("  off voice {voice}");
    }

    fn telemetry(&mut self, event: EngineEvent) {
        if let EngineEvent::ArpStep { pitch, position } = event {
            println!("step {position}: note {pitch}");
        }
    }
}

fn main() -> polykey::Result<()> {
    tracing_subscriber::fmt::init();

    let mut engine = PerformanceEngine::builder()
        .voices(8)
        .arp_mode(ArpMode::UpDown)
        .arp_range(2)
        .arp_rate(8.0)
        .build()?;

    // C major chord: C4, E4, G4
    for pitch in [60, 64, 67] {
        engine.on_key_event(Zone::Whole, pitch, true, 100);
    }

    // Two seconds of a 1 kHz poll loop
    for ms in 0..2_000u32 {
        engine.poll(ms * 1_000, &mut Printer);
    }

    for pitch in [60, 64, 67] {
        engine.on_key_event(Zone::Whole, pitch, false, 0);
    }
    engine.poll(2_000_000, &mut Printer);

    Ok(())
}
