use crate::types::pixel_data::{PulseEvent, TriggerEvent};
use winnow::{
    Parser,
    binary::{le_u8, le_u16},
    combinator::repeat,
    error::ContextError,
    token::take,
};

/// Parses a single pulse event record (5 bytes):
/// - 2 bytes: pulse time (u16, little‑endian)
/// - 1 byte: pulse width (u8, little‑endian)
/// - 2 bytes: pulse intensity (u16, little‑endian)
pub fn parse_pulse_event(input: &mut &[u8]) -> Result<PulseEvent, ContextError> {
    let time = le_u16::<_, ContextError>.parse_next(input)?;
    let width = le_u8::<_, ContextError>.parse_next(input)?;
    let intensity = le_u16::<_, ContextError>.parse_next(input)?;

    Ok(PulseEvent::builder()
        .time(time)
        .width(width)
        .intensity(intensity)
        .build())
}

/// Parses the 8‑byte trigger record and returns its pulse count (bytes 6..8)
pub fn parse_trigger_record(input: &mut &[u8]) -> Result<u16, ContextError> {
    take::<_, _, ContextError>(6usize).parse_next(input)?;
    le_u16::<_, ContextError>.parse_next(input)
}

/// Parses a trigger event for a pixel: the trigger record followed by its pulses.
pub fn parse_trigger_event(input: &mut &[u8]) -> Result<TriggerEvent, ContextError> {
    let num_pulses = parse_trigger_record(input)?;
    let pulses = repeat(num_pulses as usize, parse_pulse_event).parse_next(input)?;

    Ok(TriggerEvent::builder()
        .num_pulses(num_pulses)
        .pulses(pulses)
        .build())
}

/// Skips the pulses of a trigger without decoding them
pub fn skip_pulses(input: &mut &[u8], num_pulses: u16) -> Result<(), ContextError> {
    take::<_, _, ContextError>(num_pulses as usize * 5).parse_next(input)?;
    Ok(())
}
