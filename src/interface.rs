//! The bus boundary of the driver: raw SPI frames plus the two GPIO lines.
//!
//! Everything above this trait is protocol; everything below it is plumbing.
//! Implementations carry no knowledge of commands, preambles, or timing
//! rules, and never retry; a short or failed transfer surfaces as-is.

/// Abstract transport to the controller: an SPI bus, the HRDY input line,
/// the reset output line, and a millisecond delay source.
pub trait DisplayInterface {
    /// Error produced by the underlying bus or pins.
    type Error;

    /// Write one SPI frame.
    fn write_frame(&mut self, buf: &[u8]) -> Result<(), Self::Error>;

    /// Full-duplex transfer of one SPI frame, in place: `buf` is transmitted
    /// and overwritten with the received bytes.
    fn transfer_frame(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Sample the HRDY line. `true` means the controller is idle and will
    /// accept a frame.
    fn ready(&mut self) -> Result<bool, Self::Error>;

    /// Drive the reset line.
    fn set_reset(&mut self, high: bool) -> Result<(), Self::Error>;

    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u16);
}

pub mod spi {
    //! `DisplayInterface` over embedded-hal blocking SPI and GPIO. The chip
    //! select is assumed to be handled by the SPI device (hardware CS or an
    //! external wrapper), as is usual for embedded-hal 0.2 buses.

    use embedded_hal as hal;

    use super::DisplayInterface;

    /// Transport failure: either the SPI bus or one of the GPIO lines.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum InterfaceError<SpiE, PinE> {
        /// The SPI transfer failed.
        Spi(SpiE),
        /// Reading HRDY or driving reset failed.
        Pin(PinE),
    }

    /// SPI interface to the controller.
    pub struct SpiInterface<SPI, READY, RESET, DELAY> {
        /// The SPI master device connected to the IT8951.
        spi: SPI,
        /// Input pin on the controller's HRDY line (high when idle).
        ready: READY,
        /// Output pin on the controller's reset line (active low).
        reset: RESET,
        /// Delay provider used for reset timing and busy polling.
        delay: DELAY,
    }

    impl<SPI, READY, RESET, DELAY, SpiE, PinE> SpiInterface<SPI, READY, RESET, DELAY>
    where
        SPI: hal::blocking::spi::Write<u8, Error = SpiE>
            + hal::blocking::spi::Transfer<u8, Error = SpiE>,
        READY: hal::digital::v2::InputPin<Error = PinE>,
        RESET: hal::digital::v2::OutputPin<Error = PinE>,
        DELAY: hal::blocking::delay::DelayMs<u16>,
    {
        /// Create a new SPI interface from the bus, the HRDY input, the
        /// reset output, and a delay provider.
        pub fn new(spi: SPI, ready: READY, reset: RESET, delay: DELAY) -> Self {
            Self {
                spi,
                ready,
                reset,
                delay,
            }
        }

        /// Tear down the interface and hand back its parts.
        pub fn release(self) -> (SPI, READY, RESET, DELAY) {
            (self.spi, self.ready, self.reset, self.delay)
        }
    }

    impl<SPI, READY, RESET, DELAY, SpiE, PinE> DisplayInterface
        for SpiInterface<SPI, READY, RESET, DELAY>
    where
        SPI: hal::blocking::spi::Write<u8, Error = SpiE>
            + hal::blocking::spi::Transfer<u8, Error = SpiE>,
        READY: hal::digital::v2::InputPin<Error = PinE>,
        RESET: hal::digital::v2::OutputPin<Error = PinE>,
        DELAY: hal::blocking::delay::DelayMs<u16>,
    {
        type Error = InterfaceError<SpiE, PinE>;

        fn write_frame(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
            self.spi.write(buf).map_err(InterfaceError::Spi)
        }

        fn transfer_frame(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
            self.spi
                .transfer(buf)
                .map(|_| ())
                .map_err(InterfaceError::Spi)
        }

        fn ready(&mut self) -> Result<bool, Self::Error> {
            self.ready.is_high().map_err(InterfaceError::Pin)
        }

        fn set_reset(&mut self, high: bool) -> Result<(), Self::Error> {
            if high {
                self.reset.set_high().map_err(InterfaceError::Pin)
            } else {
                self.reset.set_low().map_err(InterfaceError::Pin)
            }
        }

        fn delay_ms(&mut self, ms: u16) {
            self.delay.delay_ms(ms);
        }
    }
}

#[cfg(test)]
pub mod test_spy {
    //! An interface for use in unit tests to spy on everything sent to the
    //! bus, script the HRDY line, and feed back read payloads.

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::vec::Vec;

    use super::DisplayInterface;

    /// One observable action at the bus boundary.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Sent {
        /// An SPI frame, as transmitted (for duplex transfers, the outgoing
        /// bytes).
        Frame(Vec<u8>),
        /// A level change on the reset line.
        Reset(bool),
        /// A blocking delay, in milliseconds.
        Delay(u16),
    }

    struct SpyState {
        sent: Vec<Sent>,
        ready: VecDeque<bool>,
        ready_default: bool,
        read_data: VecDeque<u8>,
    }

    pub struct TestSpyInterface {
        state: Rc<RefCell<SpyState>>,
    }

    impl TestSpyInterface {
        pub fn new() -> Self {
            TestSpyInterface {
                state: Rc::new(RefCell::new(SpyState {
                    sent: Vec::new(),
                    ready: VecDeque::new(),
                    ready_default: true,
                    read_data: VecDeque::new(),
                })),
            }
        }

        /// A second handle onto the same spy state, for moving into the
        /// code under test while keeping one to assert with.
        pub fn split(&self) -> Self {
            TestSpyInterface {
                state: self.state.clone(),
            }
        }

        pub fn clear(&mut self) {
            self.state.borrow_mut().sent.clear();
        }

        /// Everything observed so far, in order.
        pub fn sent(&self) -> Vec<Sent> {
            self.state.borrow().sent.clone()
        }

        /// Only the SPI frames observed so far.
        pub fn frames(&self) -> Vec<Vec<u8>> {
            self.state
                .borrow()
                .sent
                .iter()
                .filter_map(|s| match s {
                    Sent::Frame(f) => Some(f.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Make HRDY read busy forever.
        pub fn stall_ready(&mut self) {
            self.state.borrow_mut().ready_default = false;
        }

        /// Script the next HRDY samples; once exhausted the line reads the
        /// default again.
        pub fn script_ready(&mut self, samples: &[bool]) {
            self.state.borrow_mut().ready.extend(samples.iter().cloned());
        }

        /// Queue the payload of one read transaction. The controller
        /// prefixes every read response with 4 dummy bytes on the wire;
        /// this helper queues those too.
        pub fn queue_response(&mut self, payload: &[u8]) {
            let mut state = self.state.borrow_mut();
            state.read_data.extend([0u8; 4].iter().cloned());
            state.read_data.extend(payload.iter().cloned());
        }

        /// Queue a single big-endian word as a read response.
        pub fn queue_response_word(&mut self, word: u16) {
            self.queue_response(&word.to_be_bytes());
        }
    }

    impl DisplayInterface for TestSpyInterface {
        type Error = ();

        fn write_frame(&mut self, buf: &[u8]) -> Result<(), ()> {
            self.state.borrow_mut().sent.push(Sent::Frame(buf.to_vec()));
            Ok(())
        }

        fn transfer_frame(&mut self, buf: &mut [u8]) -> Result<(), ()> {
            let mut state = self.state.borrow_mut();
            state.sent.push(Sent::Frame(buf.to_vec()));
            for slot in buf.iter_mut() {
                *slot = state.read_data.pop_front().unwrap_or(0);
            }
            Ok(())
        }

        fn ready(&mut self) -> Result<bool, ()> {
            let mut state = self.state.borrow_mut();
            let default = state.ready_default;
            Ok(state.ready.pop_front().unwrap_or(default))
        }

        fn set_reset(&mut self, high: bool) -> Result<(), ()> {
            self.state.borrow_mut().sent.push(Sent::Reset(high));
            Ok(())
        }

        fn delay_ms(&mut self, ms: u16) {
            self.state.borrow_mut().sent.push(Sent::Delay(ms));
        }
    }
}
