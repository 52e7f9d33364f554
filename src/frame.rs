//! Wire framing and the HRDY handshake underneath every transaction.
//!
//! Each SPI frame opens with a 2-byte preamble naming its kind, and no frame
//! may start until the HRDY line reports the controller idle. Commands and
//! their trailing parameter words are sent inside a single method call, so
//! the exclusive `&mut` borrow guarantees no other frames interleave with
//! the sequence.

use crate::command::Command;
use crate::config::Config;
use crate::interface::DisplayInterface;
use crate::Error;

use alloc::vec;
use alloc::vec::Vec;

/// Frame preamble announcing a command opcode.
const PREAMBLE_COMMAND: [u8; 2] = [0x60, 0x00];
/// Frame preamble announcing a data word or pixel payload.
const PREAMBLE_DATA: [u8; 2] = [0x00, 0x00];
/// Frame preamble announcing a read transaction.
const PREAMBLE_READ: [u8; 2] = [0x10, 0x00];

/// Encodes commands and data into the controller's SPI frame format and
/// enforces the ready-pin wait before every transaction.
pub struct Framer<DI> {
    iface: DI,
    config: Config,
}

impl<DI> Framer<DI>
where
    DI: DisplayInterface,
{
    pub fn new(iface: DI, config: Config) -> Self {
        Framer { iface, config }
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Tear down the framer and hand back the interface.
    pub fn release(self) -> DI {
        self.iface
    }

    pub(crate) fn set_reset(&mut self, high: bool) -> Result<(), Error<DI::Error>> {
        self.iface.set_reset(high).map_err(Error::Interface)
    }

    pub(crate) fn delay_ms(&mut self, ms: u16) {
        self.iface.delay_ms(ms);
    }

    /// Poll the HRDY line until the controller reports idle. Waiting longer
    /// than the configured timeout fails with [`Error::Timeout`] without
    /// touching the bus.
    pub fn wait_ready(&mut self) -> Result<(), Error<DI::Error>> {
        let timeout = u32::from(self.config.ready_timeout_ms);
        let interval = self.config.ready_poll_interval_ms;
        let mut waited: u32 = 0;
        loop {
            if self.iface.ready().map_err(Error::Interface)? {
                return Ok(());
            }
            if waited >= timeout {
                return Err(Error::Timeout);
            }
            self.iface.delay_ms(interval);
            waited += u32::from(interval);
        }
    }

    /// Send a command opcode followed by its parameter words. The whole
    /// sequence happens under this one call; each frame is individually
    /// gated by [`Framer::wait_ready`].
    pub fn send_command(&mut self, command: Command, args: &[u16]) -> Result<(), Error<DI::Error>> {
        let opcode = command.opcode().to_be_bytes();
        self.wait_ready()?;
        self.iface
            .write_frame(&[PREAMBLE_COMMAND[0], PREAMBLE_COMMAND[1], opcode[0], opcode[1]])
            .map_err(Error::Interface)?;
        for &arg in args {
            self.send_word(arg)?;
        }
        Ok(())
    }

    /// Send a single 16-bit data word.
    pub fn send_word(&mut self, word: u16) -> Result<(), Error<DI::Error>> {
        let word = word.to_be_bytes();
        self.wait_ready()?;
        self.iface
            .write_frame(&[PREAMBLE_DATA[0], PREAMBLE_DATA[1], word[0], word[1]])
            .map_err(Error::Interface)?;
        Ok(())
    }

    /// Stream a pixel payload, split into frames of at most the configured
    /// size, each gated by the ready pin. The payload must be word-aligned.
    /// With `swap_words` set, every 2-byte word is byte-swapped on its way
    /// out; the controller expects the opposite endianness from the packed
    /// byte order in some modes.
    pub fn send_pixels(&mut self, data: &[u8], swap_words: bool) -> Result<(), Error<DI::Error>> {
        if data.len() % 2 != 0 {
            return Err(Error::OddPayloadLength(data.len()));
        }
        let mut frame = Vec::with_capacity(PREAMBLE_DATA.len() + self.config.max_frame_bytes);
        for chunk in data.chunks(self.config.max_frame_bytes) {
            frame.clear();
            frame.extend_from_slice(&PREAMBLE_DATA);
            frame.extend_from_slice(chunk);
            if swap_words {
                for pair in frame[PREAMBLE_DATA.len()..].chunks_exact_mut(2) {
                    pair.swap(0, 1);
                }
            }
            self.wait_ready()?;
            self.iface.write_frame(&frame).map_err(Error::Interface)?;
        }
        Ok(())
    }

    /// Read `out.len()` bytes from the controller. The duplex frame carries
    /// the read preamble and 2 dummy bytes ahead of the payload; both are
    /// discarded.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<(), Error<DI::Error>> {
        let mut frame = vec![0u8; out.len() + 4];
        frame[..2].copy_from_slice(&PREAMBLE_READ);
        self.wait_ready()?;
        self.iface
            .transfer_frame(&mut frame)
            .map_err(Error::Interface)?;
        out.copy_from_slice(&frame[4..]);
        Ok(())
    }

    /// Read a single big-endian 16-bit word.
    pub fn read_word(&mut self) -> Result<u16, Error<DI::Error>> {
        let mut buf = [0u8; 2];
        self.read_bytes(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }
}
