//! Main decoder API
//!
//! The bus decoder is a fold over the sample sequence. [`DecoderState`] holds
//! everything carried from one sample to the next and [`DecoderState::step`] is
//! the transition function, so single transitions can be exercised directly.
//! [`Decoder`] is the entry point that ties loading and decoding together.

use crate::config::DecoderConfig;
use crate::formats::{IlaCsv, TraceFormat};
use crate::types::{BusEvent, Direction, Result, Sample, Transaction};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bus condition detected between the previous and the current sample
///
/// Detection order is fixed: START, then STOP, then rising clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// SDA falls while SCL is high
    Start,
    /// SDA rises while SCL is high
    Stop,
    /// SCL rises; SDA holds the next bit
    RisingEdge,
    /// Nothing of interest
    Other,
}

impl Condition {
    /// Classify a sample against the levels of the previous one
    pub fn classify(prev_clock: bool, prev_data: bool, sample: Sample) -> Self {
        if sample.clock && !sample.data && prev_data {
            Condition::Start
        } else if sample.clock && sample.data && !prev_data {
            Condition::Stop
        } else if sample.clock && !prev_clock {
            Condition::RisingEdge
        } else {
            Condition::Other
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum BusPhase {
    #[default]
    Idle,
    Running(Transaction),
}

/// Decoder state threaded from one sample to the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderState {
    phase: BusPhase,
    prev_clock: bool,
    prev_data: bool,
    shift: u8,
    bit_count: u8,
    byte_index: usize,
}

impl Default for DecoderState {
    fn default() -> Self {
        Self {
            phase: BusPhase::Idle,
            prev_clock: false,
            // An idle bus is pulled high
            prev_data: true,
            shift: 0,
            bit_count: 0,
            byte_index: 0,
        }
    }
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// State to feed the next sample into
    pub state: DecoderState,
    /// Transaction closed by a STOP on this sample
    pub completed: Option<Transaction>,
}

impl DecoderState {
    /// Initial state: idle bus, SCL low, SDA high
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a transaction is open
    pub fn is_running(&self) -> bool {
        matches!(self.phase, BusPhase::Running(_))
    }

    /// Transaction currently being assembled, if any
    pub fn pending(&self) -> Option<&Transaction> {
        match &self.phase {
            BusPhase::Running(transaction) => Some(transaction),
            BusPhase::Idle => None,
        }
    }

    /// Number of bits shifted into the current byte (0-8)
    pub fn bit_count(&self) -> u8 {
        self.bit_count
    }

    /// Index of the next byte within the current (repeated) start; 0 is the address byte
    pub fn byte_index(&self) -> usize {
        self.byte_index
    }

    fn reset_byte(&mut self) {
        self.shift = 0;
        self.bit_count = 0;
    }

    /// Consume one sample
    pub fn step(mut self, sample: Sample) -> Step {
        let mut completed = None;

        match Condition::classify(self.prev_clock, self.prev_data, sample) {
            Condition::Start => {
                match &mut self.phase {
                    BusPhase::Idle => {
                        let mut transaction = Transaction::new();
                        transaction.push_start();
                        self.phase = BusPhase::Running(transaction);
                    }
                    BusPhase::Running(transaction) => transaction.push_repeated_start(),
                }
                self.reset_byte();
                self.byte_index = 0;
            }
            Condition::Stop => {
                if let BusPhase::Running(mut transaction) = std::mem::take(&mut self.phase) {
                    transaction.push_stop();
                    completed = Some(transaction);
                }
            }
            Condition::RisingEdge => {
                if let BusPhase::Running(transaction) = &mut self.phase {
                    if self.bit_count < 8 {
                        self.shift = (self.shift << 1) | u8::from(sample.data);
                        self.bit_count += 1;
                    } else {
                        // Ninth clock: receiver pulls SDA low to acknowledge
                        let ack = !sample.data;
                        if self.byte_index == 0 {
                            transaction.push_address(
                                self.shift >> 1,
                                Direction::from_rw_bit(self.shift),
                                ack,
                            );
                        } else {
                            transaction.push_data(self.shift, ack);
                        }
                        self.shift = 0;
                        self.bit_count = 0;
                        self.byte_index += 1;
                    }
                }
            }
            Condition::Other => {}
        }

        self.prev_clock = sample.clock;
        self.prev_data = sample.data;

        Step {
            state: self,
            completed,
        }
    }

    /// End of input: return the transaction left open, if any
    ///
    /// The open transaction is never part of the decoded output; it is handed
    /// back only so callers can report on it.
    pub fn finish(self) -> Option<Transaction> {
        match self.phase {
            BusPhase::Running(transaction) => Some(transaction),
            BusPhase::Idle => None,
        }
    }
}

/// Counters collected while decoding one trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    /// Samples consumed
    pub samples: usize,
    /// Transactions closed by a STOP
    pub transactions: usize,
    /// Repeated starts inside completed transactions
    pub repeated_starts: usize,
    /// Unacknowledged address and data phases inside completed transactions
    pub nacks: usize,
    /// True if the trace ended inside a transaction
    pub dropped_open: bool,
}

/// Decode samples into completed transactions
pub fn decode<I>(samples: I) -> Vec<Transaction>
where
    I: IntoIterator<Item = Sample>,
{
    decode_with_stats(samples).0
}

/// Decode samples and collect counters along the way
pub fn decode_with_stats<I>(samples: I) -> (Vec<Transaction>, DecodeStats)
where
    I: IntoIterator<Item = Sample>,
{
    let mut stats = DecodeStats::default();
    let mut transactions = Vec::new();

    let state = samples
        .into_iter()
        .fold(DecoderState::new(), |state, sample| {
            stats.samples += 1;
            let step = state.step(sample);
            if let Some(transaction) = step.completed {
                stats.repeated_starts += transaction
                    .events()
                    .iter()
                    .filter(|e| **e == BusEvent::RepeatedStart)
                    .count();
                stats.nacks += transaction.nack_count();
                transactions.push(transaction);
            }
            step.state
        });

    if let Some(open) = state.finish() {
        log::debug!(
            "Trace ended inside a transaction ({} events), dropping it",
            open.events().len()
        );
        stats.dropped_open = true;
    }

    stats.transactions = transactions.len();
    log::debug!(
        "Decoded {} transactions from {} samples",
        stats.transactions,
        stats.samples
    );
    (transactions, stats)
}

/// Loads capture files and decodes them with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder for the given signal configuration
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Configuration this decoder was built with
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Load the samples of a capture file
    ///
    /// # Example
    /// ```no_run
    /// use i2c_trace_decoder::{Decoder, DecoderConfig};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new(DecoderConfig::new().with_signals("scl_rx", "sda_rx"));
    /// let samples = decoder.load(Path::new("capture.csv")).unwrap();
    /// println!("{} samples", samples.len());
    /// ```
    pub fn load(&self, path: &Path) -> Result<Vec<Sample>> {
        IlaCsv::load(path, &self.config)
    }

    /// Load and decode a capture file
    pub fn decode_file(&self, path: &Path) -> Result<Vec<Transaction>> {
        Ok(decode(self.load(path)?))
    }

    /// Load and decode a capture file, returning decode counters as well
    pub fn decode_file_with_stats(&self, path: &Path) -> Result<(Vec<Transaction>, DecodeStats)> {
        Ok(decode_with_stats(self.load(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds edge-only sample sequences the way a logic analyzer captures them
    #[derive(Default)]
    struct Bus {
        samples: Vec<Sample>,
    }

    impl Bus {
        fn push(&mut self, clock: bool, data: bool) -> &mut Self {
            self.samples.push(Sample::new(clock, data));
            self
        }

        fn idle(&mut self) -> &mut Self {
            self.push(true, true)
        }

        fn start(&mut self) -> &mut Self {
            self.push(true, true).push(true, false).push(false, false)
        }

        fn repeated_start(&mut self) -> &mut Self {
            self.push(false, true).push(true, true).push(true, false).push(false, false)
        }

        fn bit(&mut self, level: bool) -> &mut Self {
            self.push(false, level).push(true, level).push(false, level)
        }

        fn byte(&mut self, value: u8, ack: bool) -> &mut Self {
            for i in (0..8).rev() {
                self.bit(value & (1 << i) != 0);
            }
            self.bit(!ack)
        }

        fn stop(&mut self) -> &mut Self {
            self.push(false, false).push(true, false).push(true, true)
        }

        fn samples(&self) -> Vec<Sample> {
            self.samples.clone()
        }
    }

    #[test]
    fn test_classify_priority() {
        assert_eq!(
            Condition::classify(true, true, Sample::new(true, false)),
            Condition::Start
        );
        assert_eq!(
            Condition::classify(true, false, Sample::new(true, true)),
            Condition::Stop
        );
        // SCL and SDA rising together reads as STOP, not as a data bit
        assert_eq!(
            Condition::classify(false, false, Sample::new(true, true)),
            Condition::Stop
        );
        assert_eq!(
            Condition::classify(false, true, Sample::new(true, true)),
            Condition::RisingEdge
        );
        assert_eq!(
            Condition::classify(true, true, Sample::new(false, true)),
            Condition::Other
        );
    }

    #[test]
    fn test_step_start_and_stop() {
        let state = DecoderState::new();
        let step = state.step(Sample::new(true, false));
        assert!(step.completed.is_none());
        assert!(step.state.is_running());
        assert_eq!(step.state.pending().unwrap().events(), &[BusEvent::Start]);

        let step = step.state.step(Sample::new(true, true));
        assert!(!step.state.is_running());
        let done = step.completed.unwrap();
        assert_eq!(done.events(), &[BusEvent::Start, BusEvent::Stop]);
    }

    #[test]
    fn test_stop_while_idle_ignored() {
        let state = DecoderState {
            prev_data: false,
            ..DecoderState::new()
        };
        let step = state.step(Sample::new(true, true));
        assert!(step.completed.is_none());
        assert!(!step.state.is_running());
    }

    #[test]
    fn test_bits_accumulate_msb_first() {
        let mut bus = Bus::default();
        bus.idle().start();
        for level in [true, false, true] {
            bus.bit(level);
        }
        let state = bus
            .samples()
            .into_iter()
            .fold(DecoderState::new(), |s, sample| s.step(sample).state);
        assert_eq!(state.bit_count(), 3);
        assert_eq!(state.shift, 0b101);
        assert_eq!(state.byte_index(), 0);
    }

    #[test]
    fn test_no_conditions_no_transactions() {
        let mut bus = Bus::default();
        bus.push(false, true).push(true, true).push(false, true).push(true, true);
        assert!(decode(bus.samples()).is_empty());
        assert!(decode(Vec::new()).is_empty());
    }

    #[test]
    fn test_write_address_then_nacked_data() {
        let mut bus = Bus::default();
        bus.idle().start().byte(0x26 << 1, true).byte(0x55, false).stop();

        let transactions = decode(bus.samples());
        assert_eq!(transactions.len(), 1);
        let t = &transactions[0];
        assert_eq!(t.address(), 0x26);
        assert_eq!(t.direction(), Direction::Write);
        assert!(t.addr_ack());
        assert_eq!(t.data(), vec![0x55]);
        assert_eq!(t.data_ack(), vec![false]);
        assert_eq!(
            t.render(false),
            "START\n  ADDR: 0x26 WR ACK\n  DATA: 0x55 NACK\n  STOP"
        );
    }

    #[test]
    fn test_data_bytes_in_capture_order() {
        let payload = [0x00, 0xFF, 0xA5, 0x3C, 0x81];
        let mut bus = Bus::default();
        bus.idle().start().byte(0x50 << 1, true);
        for value in payload {
            bus.byte(value, true);
        }
        bus.stop();

        let transactions = decode(bus.samples());
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].data(), payload.to_vec());
        assert!(transactions[0].data_ack().iter().all(|ack| *ack));
    }

    #[test]
    fn test_repeated_start_reads_new_address() {
        let mut bus = Bus::default();
        bus.idle()
            .start()
            .byte(0x26 << 1, true)
            .byte(0x10, true)
            .repeated_start()
            .byte((0x26 << 1) | 1, true)
            .byte(0xAB, false)
            .stop();

        let (transactions, stats) = decode_with_stats(bus.samples());
        assert_eq!(transactions.len(), 1);
        let t = &transactions[0];
        assert!(t.has_repeated_start());
        assert_eq!(t.direction(), Direction::Read);
        assert_eq!(t.data(), vec![0x10, 0xAB]);
        assert_eq!(
            t.events(),
            &[
                BusEvent::Start,
                BusEvent::AddressPhase {
                    address: 0x26,
                    direction: Direction::Write,
                    ack: true
                },
                BusEvent::DataPhase { value: 0x10, ack: true },
                BusEvent::RepeatedStart,
                BusEvent::AddressPhase {
                    address: 0x26,
                    direction: Direction::Read,
                    ack: true
                },
                BusEvent::DataPhase { value: 0xAB, ack: false },
                BusEvent::Stop,
            ]
        );
        assert_eq!(stats.repeated_starts, 1);
        assert_eq!(stats.nacks, 1);
    }

    #[test]
    fn test_open_transaction_dropped() {
        let mut bus = Bus::default();
        bus.idle()
            .start()
            .byte(0x26 << 1, true)
            .stop()
            .idle()
            .start()
            .byte(0x27 << 1, true)
            .byte(0x01, true);

        let (transactions, stats) = decode_with_stats(bus.samples());
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].address(), 0x26);
        assert!(stats.dropped_open);
        assert_eq!(stats.transactions, 1);
    }

    #[test]
    fn test_partial_byte_before_stop_is_discarded() {
        let mut bus = Bus::default();
        bus.idle().start().byte(0x26 << 1, true).bit(true).bit(false).stop();

        let transactions = decode(bus.samples());
        assert_eq!(transactions.len(), 1);
        assert!(transactions[0].data().is_empty());
    }

    #[test]
    fn test_two_transactions() {
        let mut bus = Bus::default();
        bus.idle()
            .start()
            .byte(0x26 << 1, false)
            .stop()
            .idle()
            .start()
            .byte((0x48 << 1) | 1, true)
            .byte(0x7F, false)
            .stop();

        let transactions = decode(bus.samples());
        assert_eq!(transactions.len(), 2);
        assert!(!transactions[0].addr_ack());
        assert_eq!(transactions[1].address(), 0x48);
        assert_eq!(transactions[1].direction(), Direction::Read);
    }
}
