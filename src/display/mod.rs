//! The main API to the display driver. It provides the stateful controller
//! operations (reset, initialization, registers, VCOM, temperature, image
//! loads, refreshes) and the draw methods that compose packing with the
//! load/refresh sequence.

pub mod buffer;

use crate::command::{
    image_mode_word, registers, Command, ImageEndianness, PixelFormat, RefreshMode, Rotation,
};
use crate::config::Config;
use crate::display::buffer::DrawingBuffer;
use crate::frame::Framer;
use crate::interface::DisplayInterface;
use crate::Error;

use alloc::string::String;
use alloc::vec;

use log::{debug, trace};

/// LUT firmware family this driver is written against. Anything else gets
/// rejected during init rather than risking a wrong waveform table.
const SUPPORTED_LUT_VERSION: &str = "M641";

/// Reset line timing: settle high, pulse low, recover high.
const RESET_SETTLE_MS: u16 = 200;
const RESET_PULSE_MS: u16 = 10;
const RESET_RECOVER_MS: u16 = 200;

/// BGVR value for 1 bpp mode: foreground G0 (black), background G15 (white).
const BGVR_BLACK_ON_WHITE: u16 = 0x00F0;

/// A target rectangle on the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Area {
            x,
            y,
            width,
            height,
        }
    }
}

/// The device descriptor returned by `GetDeviceInfo`, parsed once during
/// initialization and immutable afterward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Panel width in pixels.
    pub width: u16,
    /// Panel height in pixels.
    pub height: u16,
    /// Base address of the image buffer in controller memory.
    pub buffer_address: u32,
    /// Firmware version string.
    pub version: String,
    /// LUT (waveform table) version string; identifies the firmware family.
    pub lut_version: String,
}

impl DeviceInfo {
    /// Parse the fixed 40-byte response: width, height, and the two halves
    /// of the buffer address as big-endian words, then two 16-byte version
    /// strings. The device stores string words byte-swapped relative to
    /// host order; the swap is undone before looking for the terminator.
    pub(crate) fn parse(raw: &[u8; 40]) -> DeviceInfo {
        let width = u16::from_be_bytes([raw[0], raw[1]]);
        let height = u16::from_be_bytes([raw[2], raw[3]]);
        let addr_low = u16::from_be_bytes([raw[4], raw[5]]);
        let addr_high = u16::from_be_bytes([raw[6], raw[7]]);
        DeviceInfo {
            width,
            height,
            buffer_address: u32::from(addr_high) << 16 | u32::from(addr_low),
            version: decode_swapped_string(&raw[8..24]),
            lut_version: decode_swapped_string(&raw[24..40]),
        }
    }
}

/// Un-swap the 16-bit words of a device string and decode up to the first
/// zero byte as ASCII.
fn decode_swapped_string(raw: &[u8]) -> String {
    let mut bytes = [0u8; 16];
    for (out, pair) in bytes.chunks_exact_mut(2).zip(raw.chunks_exact(2)) {
        out[0] = pair[1];
        out[1] = pair[0];
    }
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

/// A driver for an IT8951-based panel.
///
/// Constructed over any [`DisplayInterface`]; nothing but
/// [`Display::init`] (and the raw register/VCOM accessors) may be called
/// until `init` has succeeded, because the draw operations need the
/// geometry and buffer address the device reports about itself.
pub struct Display<DI>
where
    DI: DisplayInterface,
{
    link: Framer<DI>,
    info: Option<DeviceInfo>,
}

impl<DI> Display<DI>
where
    DI: DisplayInterface,
{
    /// Construct a new display driver over `iface` with timing `config`.
    pub fn new(iface: DI, config: Config) -> Self {
        Display {
            link: Framer::new(iface, config),
            info: None,
        }
    }

    /// Tear down the driver and hand back the interface.
    pub fn release(self) -> DI {
        self.link.release()
    }

    /// Pulse the reset line and wait for the controller to come up. Must
    /// precede any other operation; [`Display::init`] calls it.
    pub fn reset(&mut self) -> Result<(), Error<DI::Error>> {
        trace!("hardware reset");
        self.link.set_reset(true)?;
        self.link.delay_ms(RESET_SETTLE_MS);
        self.link.set_reset(false)?;
        self.link.delay_ms(RESET_PULSE_MS);
        self.link.set_reset(true)?;
        self.link.delay_ms(RESET_RECOVER_MS);
        self.link.wait_ready()
    }

    /// Reset the controller, start its system clock, fetch and validate the
    /// device descriptor, and enable packed pixel writes.
    ///
    /// A LUT version other than the supported firmware family fails with
    /// [`Error::IncompatibleFirmware`] and leaves the driver uninitialized.
    pub fn init(&mut self) -> Result<(), Error<DI::Error>> {
        self.reset()?;
        self.link.send_command(Command::SystemRun, &[])?;
        self.link.wait_ready()?;
        let info = self.get_device_info()?;
        if info.lut_version != SUPPORTED_LUT_VERSION {
            return Err(Error::IncompatibleFirmware);
        }
        debug!(
            "IT8951 up: {}x{}, buffer 0x{:08X}, fw {}, lut {}",
            info.width, info.height, info.buffer_address, info.version, info.lut_version
        );
        self.info = Some(info);
        // The staged formats are packed; the chip defaults to one pixel
        // per word.
        self.write_register(registers::I80CPCR, 1)
    }

    /// The device descriptor, once [`Display::init`] has succeeded.
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    /// Query the 40-byte device descriptor.
    pub fn get_device_info(&mut self) -> Result<DeviceInfo, Error<DI::Error>> {
        self.link.send_command(Command::GetDeviceInfo, &[])?;
        let mut raw = [0u8; 40];
        self.link.read_bytes(&mut raw)?;
        Ok(DeviceInfo::parse(&raw))
    }

    /// Read one 16-bit register.
    pub fn read_register(&mut self, address: u16) -> Result<u16, Error<DI::Error>> {
        self.link.send_command(Command::RegisterRead, &[address])?;
        self.link.read_word()
    }

    /// Write one 16-bit register.
    pub fn write_register(&mut self, address: u16, value: u16) -> Result<(), Error<DI::Error>> {
        self.link
            .send_command(Command::RegisterWrite, &[address, value])
    }

    /// Read the VCOM magnitude in millivolts. The panel bias is negative;
    /// the sign is implicit.
    pub fn vcom(&mut self) -> Result<u16, Error<DI::Error>> {
        self.link.send_command(Command::Vcom, &[0])?;
        self.link.read_word()
    }

    /// Set the VCOM voltage. Transmitted as an unsigned millivolt
    /// magnitude rounded to the nearest integer; `-1.91` and `1.91` both
    /// program 1910 mV.
    pub fn set_vcom(&mut self, volts: f32) -> Result<(), Error<DI::Error>> {
        let magnitude = if volts < 0.0 { -volts } else { volts } * 1000.0;
        let millivolts = (magnitude + 0.5) as u16;
        self.link.send_command(Command::Vcom, &[1, millivolts])
    }

    /// Read the temperature words: the user-forced value and the
    /// system-measured one.
    pub fn temperature(&mut self) -> Result<(u16, u16), Error<DI::Error>> {
        self.link.send_command(Command::Temperature, &[0])?;
        let user = self.link.read_word()?;
        let system = self.link.read_word()?;
        Ok((user, system))
    }

    /// Stop the system clock, keeping state.
    pub fn standby(&mut self) -> Result<(), Error<DI::Error>> {
        self.link.send_command(Command::Standby, &[])
    }

    /// Enter deep sleep.
    pub fn sleep(&mut self) -> Result<(), Error<DI::Error>> {
        self.link.send_command(Command::Sleep, &[])
    }

    /// Point the controller's image-load engine at `address` in its local
    /// memory. Precedes every image load.
    pub fn set_target_memory_address(&mut self, address: u32) -> Result<(), Error<DI::Error>> {
        let low = address as u16;
        let high = (address >> 16) as u16;
        self.write_register(registers::LISAR + 2, high)?;
        self.write_register(registers::LISAR, low)
    }

    /// Begin a full-frame image load.
    pub fn load_image_start(
        &mut self,
        endian: ImageEndianness,
        format: PixelFormat,
        rotation: Rotation,
    ) -> Result<(), Error<DI::Error>> {
        self.link.send_command(
            Command::LoadImage,
            &[image_mode_word(endian, format, rotation)],
        )
    }

    /// Begin a rectangular image load.
    pub fn load_image_area_start(
        &mut self,
        endian: ImageEndianness,
        format: PixelFormat,
        rotation: Rotation,
        area: Area,
    ) -> Result<(), Error<DI::Error>> {
        self.link.send_command(
            Command::LoadImageArea,
            &[
                image_mode_word(endian, format, rotation),
                area.x,
                area.y,
                area.width,
                area.height,
            ],
        )
    }

    /// Stream packed pixel bytes into the open image load.
    pub fn send_pixel_data(
        &mut self,
        data: &[u8],
        swap_words: bool,
    ) -> Result<(), Error<DI::Error>> {
        self.link.send_pixels(data, swap_words)
    }

    /// Terminate the open image load. Must follow every
    /// [`Display::load_image_start`]/[`Display::load_image_area_start`]
    /// once the payload is in, or the controller stays in its load state.
    pub fn load_image_end(&mut self) -> Result<(), Error<DI::Error>> {
        self.link.send_command(Command::LoadImageEnd, &[])
    }

    /// Refresh `area` of the panel from the image buffer with the given
    /// waveform.
    pub fn display_area(&mut self, area: Area, mode: RefreshMode) -> Result<(), Error<DI::Error>> {
        self.link.send_command(
            Command::DisplayArea,
            &[area.x, area.y, area.width, area.height, mode.code()],
        )
    }

    /// Refresh `area` sourcing pixels from an explicit buffer address
    /// instead of the current load target.
    pub fn display_buffer_area(
        &mut self,
        area: Area,
        mode: RefreshMode,
        address: u32,
    ) -> Result<(), Error<DI::Error>> {
        self.link.send_command(
            Command::DisplayBufferArea,
            &[
                area.x,
                area.y,
                area.width,
                area.height,
                mode.code(),
                address as u16,
                (address >> 16) as u16,
            ],
        )
    }

    /// Switch the refresh engine in or out of 1 bpp mode. Enabling also
    /// programs the fixed black-on-white gray levels. Draw code brackets
    /// every 1 bpp refresh with this and restores the flag on all exit
    /// paths; leaving it set corrupts later grayscale refreshes.
    pub fn set_1bpp_mode(&mut self, enabled: bool) -> Result<(), Error<DI::Error>> {
        let mut value = self.read_register(registers::UP1SR2)?;
        if enabled {
            value |= registers::UP1SR2_1BPP_ENABLE;
            self.write_register(registers::BGVR, BGVR_BLACK_ON_WHITE)?;
        } else {
            value &= !registers::UP1SR2_1BPP_ENABLE;
        }
        self.write_register(registers::UP1SR2, value)
    }

    /// Poll the LUT engine status register until the previous refresh has
    /// finished. Distinct from the HRDY handshake: HRDY gates individual
    /// frames, this reports the waveform engine. Exceeding the configured
    /// bound fails with [`Error::Timeout`]; issue no further commands
    /// after that without a fresh reset.
    pub fn wait_for_display_ready(&mut self) -> Result<(), Error<DI::Error>> {
        let timeout = u32::from(self.link.config().refresh_timeout_ms);
        let interval = self.link.config().refresh_poll_interval_ms;
        let mut waited: u32 = 0;
        loop {
            if self.read_register(registers::LUTAFSR)? == 0 {
                return Ok(());
            }
            if waited >= timeout {
                return Err(Error::Timeout);
            }
            self.link.delay_ms(interval);
            waited += u32::from(interval);
        }
    }

    /// Draw a full screen.
    ///
    /// `rows` is called once per scanline with a buffer of one 8-bit
    /// sample per pixel to fill; samples are packed down to `format` and
    /// streamed to the device, then the whole panel is refreshed in
    /// `mode`. For [`PixelFormat::Bpp1`] the packed bits are transferred
    /// disguised as 8 bpp data (see [`Display::draw_area`]).
    pub fn draw_screen<F>(
        &mut self,
        mode: RefreshMode,
        format: PixelFormat,
        rows: F,
    ) -> Result<(), Error<DI::Error>>
    where
        F: FnMut(u16, &mut [u8]),
    {
        let (width, height, address) = self.screen_params()?;
        debug!("draw {}x{} {:?} {:?}", width, height, format, mode);
        let staged = Self::pack_rows(0, 0, width, height, format, rows)?;
        self.wait_for_display_ready()?;
        self.set_target_memory_address(address)?;
        let screen = Area::new(0, 0, width, height);
        if format == PixelFormat::Bpp1 {
            self.load_1bpp_as_bpp8(screen, &staged)?;
            self.refresh_1bpp(screen, mode)
        } else {
            self.load_image_start(ImageEndianness::Big, format, Rotation::Rotate0)?;
            self.send_pixel_data(staged.data(), false)?;
            self.load_image_end()?;
            self.display_area(screen, mode)
        }
    }

    /// Draw a rectangle of the screen.
    ///
    /// Like [`Display::draw_screen`] but loads and refreshes only `area`.
    /// For [`PixelFormat::Bpp1`], `area.x` and `area.width` must be
    /// multiples of 32; a violation is rejected before anything touches
    /// the bus. The native 1 bpp load path is unreliable, so the packed
    /// bytes travel as 8 bpp data at one eighth the width, the refresh
    /// engine is flipped into 1 bpp mode just for the refresh command,
    /// and flipped back afterwards no matter how the refresh went.
    pub fn draw_area<F>(
        &mut self,
        mode: RefreshMode,
        format: PixelFormat,
        area: Area,
        rows: F,
    ) -> Result<(), Error<DI::Error>>
    where
        F: FnMut(u16, &mut [u8]),
    {
        if format == PixelFormat::Bpp1 && (area.x % 32 != 0 || area.width % 32 != 0) {
            return Err(Error::MisalignedArea {
                x: area.x,
                width: area.width,
            });
        }
        let (_, _, address) = self.screen_params()?;
        debug!(
            "draw area {},{} {}x{} {:?} {:?}",
            area.x, area.y, area.width, area.height, format, mode
        );
        let staged = Self::pack_rows(area.x, area.y, area.width, area.height, format, rows)?;
        self.wait_for_display_ready()?;
        self.set_target_memory_address(address)?;
        if format == PixelFormat::Bpp1 {
            self.load_1bpp_as_bpp8(area, &staged)?;
            self.refresh_1bpp(area, mode)
        } else {
            self.load_image_area_start(ImageEndianness::Big, format, Rotation::Rotate0, area)?;
            self.send_pixel_data(staged.data(), false)?;
            self.load_image_end()?;
            self.display_area(area, mode)
        }
    }

    /// Fill the whole screen with white and refresh it in `mode`.
    pub fn clear_screen(&mut self, mode: RefreshMode) -> Result<(), Error<DI::Error>> {
        // Full-intensity samples pack to all-ones bytes in every format.
        self.draw_screen(mode, PixelFormat::Bpp4, |_, row| {
            for sample in row.iter_mut() {
                *sample = 0xFF;
            }
        })
    }

    fn screen_params(&self) -> Result<(u16, u16, u32), Error<DI::Error>> {
        match self.info {
            Some(ref info) => Ok((info.width, info.height, info.buffer_address)),
            None => Err(Error::NotInitialized),
        }
    }

    fn pack_rows<F>(
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        format: PixelFormat,
        mut rows: F,
    ) -> Result<DrawingBuffer, Error<DI::Error>>
    where
        F: FnMut(u16, &mut [u8]),
    {
        let mut staged = DrawingBuffer::new(x, y, width, height, format)?;
        let mut samples = vec![0u8; usize::from(width)];
        for row in 0..height {
            rows(row, &mut samples);
            staged.pack_row(row, &samples);
        }
        Ok(staged)
    }

    /// Ship an already-packed 1 bpp payload as 8 bpp: each byte carries 8
    /// real pixels, so the transferred rectangle is an eighth as wide.
    fn load_1bpp_as_bpp8(
        &mut self,
        area: Area,
        staged: &DrawingBuffer,
    ) -> Result<(), Error<DI::Error>> {
        let disguised = Area::new(area.x / 8, area.y, area.width / 8, area.height);
        self.load_image_area_start(
            ImageEndianness::Big,
            PixelFormat::Bpp8,
            Rotation::Rotate0,
            disguised,
        )?;
        self.send_pixel_data(staged.data(), false)?;
        self.load_image_end()
    }

    fn refresh_1bpp(&mut self, area: Area, mode: RefreshMode) -> Result<(), Error<DI::Error>> {
        self.set_1bpp_mode(true)?;
        let refresh = self.display_area(area, mode);
        // The flag must come back off even when the refresh failed.
        let restore = self.set_1bpp_mode(false);
        refresh.and(restore)
    }
}
