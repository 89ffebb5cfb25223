//! Types for representing pulse data in the bin file format

use bon::Builder;

/// A single pulse event (5 bytes):
/// - 2 bytes: pulse time
/// - 1 byte: pulse width
/// - 2 bytes: pulse intensity
#[derive(Debug, Clone, Copy, PartialEq, Builder)]
pub struct PulseEvent {
    pub time: u16,
    pub width: u8,
    pub intensity: u16,
}

impl PulseEvent {
    /// Whether the pulse arrived inside the inclusive tof window
    #[inline]
    pub fn within(&self, lower: u16, upper: u16) -> bool {
        self.time >= lower && self.time <= upper
    }
}

/// A trigger event for one pixel. An 8‑byte record carries the number of pulse events in its
/// last 2 bytes; one 5‑byte record per pulse follows.
#[derive(Debug, PartialEq, Builder)]
pub struct TriggerEvent {
    pub num_pulses: u16,
    pub pulses: Vec<PulseEvent>,
}
