//! Test data builders for creating test objects

use wavescope_rs::types::{Direction, EventId, LogEvent};

/// Builder for creating test LogEvents
pub struct EventBuilder {
    id: u64,
    direction: Direction,
    payload: Vec<u8>,
}

impl EventBuilder {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            direction: Direction::Tx,
            payload: vec![0x41],
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn build(self) -> LogEvent {
        LogEvent::new(EventId(self.id), self.direction, self.payload)
    }
}

/// Expected sample count for a waveform holding the given per-event byte
/// counts, including the bootstrap sample and a `gap`-sample pause per
/// event
pub fn expected_samples(byte_counts: &[usize], gap: usize) -> usize {
    1 + byte_counts.iter().map(|b| 10 * b).sum::<usize>() + gap * byte_counts.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_builder() {
        let event = EventBuilder::new(7)
            .direction(Direction::Rx)
            .payload(vec![0x01, 0x02])
            .build();

        assert_eq!(event.id, EventId(7));
        assert_eq!(event.direction, Direction::Rx);
        assert_eq!(event.payload, vec![0x01, 0x02]);
    }

    #[test]
    fn test_expected_samples() {
        // bootstrap + 10 per byte + 4 per event
        assert_eq!(expected_samples(&[1], 4), 15);
        assert_eq!(expected_samples(&[2, 1], 4), 39);
        assert_eq!(expected_samples(&[], 4), 1);
    }
}
