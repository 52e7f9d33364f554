//! The host command set and register map of the IT8951.
//!
//! Every command is a 16-bit opcode transmitted big-endian inside a command
//! frame; trailing parameters travel as separate 16-bit data frames. The
//! numeric values here go to the hardware verbatim and are not negotiable.

/// A command understood by the controller's host interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Leave standby and run the system clock. Required once after reset
    /// before any other command.
    SystemRun,
    /// Stop the system clock but keep state; any command wakes the chip.
    Standby,
    /// Enter deep sleep. Only a reset or `SystemRun` recovers from this.
    Sleep,
    /// Read one 16-bit register. One address parameter, one word response.
    RegisterRead,
    /// Write one 16-bit register. Address and value parameters.
    RegisterWrite,
    /// Arm a burst read of controller memory.
    BurstReadTrigger,
    /// Start streaming out a previously armed burst read.
    BurstReadStart,
    /// Start a burst write into controller memory.
    BurstWrite,
    /// Terminate the current burst transaction.
    BurstEnd,
    /// Begin a full-frame image load into the target memory area. One
    /// parameter: the packed mode word (see [`image_mode_word`]).
    LoadImage,
    /// Begin a rectangular image load. Parameters: mode word, x, y, width,
    /// height.
    LoadImageArea,
    /// Terminate an image load. Every `LoadImage`/`LoadImageArea` must be
    /// paired with exactly one of these after the pixel payload, or the
    /// controller stays in its load state and corrupts later commands.
    LoadImageEnd,
    /// Refresh a rectangle of the panel from the image buffer. Parameters:
    /// x, y, width, height, waveform mode code.
    DisplayArea,
    /// Like `DisplayArea` but sourcing from an explicit buffer address,
    /// passed as two trailing words (low half first).
    DisplayBufferArea,
    /// Run the panel power-up/down sequence.
    PowerSequence,
    /// Read (sub-op 0) or write (sub-op 1, then millivolts) the VCOM
    /// magnitude.
    Vcom,
    /// Read (sub-op 0) or force (sub-op 1) the temperature used for
    /// waveform selection.
    Temperature,
    /// Query the 40-byte device descriptor.
    GetDeviceInfo,
}

impl Command {
    /// The wire opcode.
    pub fn opcode(self) -> u16 {
        match self {
            Command::SystemRun => 0x0001,
            Command::Standby => 0x0002,
            Command::Sleep => 0x0003,
            Command::RegisterRead => 0x0010,
            Command::RegisterWrite => 0x0011,
            Command::BurstReadTrigger => 0x0012,
            Command::BurstReadStart => 0x0013,
            Command::BurstWrite => 0x0014,
            Command::BurstEnd => 0x0015,
            Command::LoadImage => 0x0020,
            Command::LoadImageArea => 0x0021,
            Command::LoadImageEnd => 0x0022,
            Command::DisplayArea => 0x0034,
            Command::DisplayBufferArea => 0x0037,
            Command::PowerSequence => 0x0038,
            Command::Vcom => 0x0039,
            Command::Temperature => 0x0040,
            Command::GetDeviceInfo => 0x0302,
        }
    }
}

/// Registers the driver touches, addressed through `RegisterRead`/
/// `RegisterWrite`.
pub mod registers {
    /// Host interface packed-write enable. Must be 1 for the packed pixel
    /// formats this driver stages; the chip otherwise expects one pixel per
    /// 16-bit word.
    pub const I80CPCR: u16 = 0x0004;
    /// Second word of the update parameter register; bit 2 switches the
    /// refresh engine into 1 bpp mode.
    pub const UP1SR2: u16 = 0x1140;
    /// 1 bpp enable bit within [`UP1SR2`].
    pub const UP1SR2_1BPP_ENABLE: u16 = 0b0000_0100;
    /// LUT engine status. Non-zero while a refresh waveform is running.
    pub const LUTAFSR: u16 = 0x1224;
    /// Foreground/background gray levels applied in 1 bpp mode.
    pub const BGVR: u16 = 0x1250;
    /// Load-image target address, low word. The high word lives at
    /// `LISAR + 2`.
    pub const LISAR: u16 = 0x2008;
}

/// The packed wire depth of transferred pixels.
///
/// Each format fixes how many bits a pixel occupies on the wire and the bit
/// boundary transfers must align to: one 16-bit memory lane for every
/// format except 1 bpp, which aligns to two lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Two bits per pixel, four gray levels.
    Bpp2,
    /// Defined by the protocol but with no load path in the controller
    /// firmware; packs as 4 bits. Attempting to stage pixels in this format
    /// is an error.
    Bpp3,
    /// Four bits per pixel, the native 16 gray levels.
    Bpp4,
    /// One byte per pixel; the low nibble is ignored by the panel.
    Bpp8,
    /// One bit per pixel. Transfers in this format use reversed sub-pixel
    /// bit order and a 32-pixel alignment boundary, and the hardware load
    /// path for it is unreliable enough that drawing code ships the packed
    /// bytes disguised as 8 bpp instead.
    Bpp1,
}

impl PixelFormat {
    /// Bits in the mode word of `LoadImage`/`LoadImageArea`.
    pub fn mode_bits(self) -> u16 {
        match self {
            PixelFormat::Bpp2 => 0x0000,
            PixelFormat::Bpp3 => 0x0010,
            PixelFormat::Bpp4 => 0x0020,
            PixelFormat::Bpp8 => 0x0030,
            PixelFormat::Bpp1 => 0x00F0,
        }
    }

    /// Wire depth of one pixel sample.
    pub fn bits_per_pixel(self) -> u16 {
        match self {
            PixelFormat::Bpp2 => 2,
            PixelFormat::Bpp3 => 4,
            PixelFormat::Bpp4 => 4,
            PixelFormat::Bpp8 => 8,
            PixelFormat::Bpp1 => 1,
        }
    }

    /// How many pixels share one transferred byte.
    pub fn pixels_per_byte(self) -> u16 {
        8 / self.bits_per_pixel()
    }

    /// Alignment unit of packed transfers, in bits.
    pub fn alignment_width(self) -> u16 {
        match self {
            PixelFormat::Bpp1 => 32,
            _ => 16,
        }
    }

    /// Pixels per alignment unit; horizontal gaps are computed modulo this.
    pub fn pixels_per_pack(self) -> u16 {
        self.alignment_width() / self.bits_per_pixel()
    }
}

/// Byte order the controller assumes for incoming pixel words.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageEndianness {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl ImageEndianness {
    /// Bits in the mode word of `LoadImage`/`LoadImageArea`.
    pub fn mode_bits(self) -> u16 {
        match self {
            ImageEndianness::Little => 0x0000,
            ImageEndianness::Big => 0x0100,
        }
    }
}

/// Rotation applied by the controller while loading image data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation.
    Rotate0,
    /// 90 degrees clockwise.
    Rotate90,
    /// 180 degrees.
    Rotate180,
    /// 270 degrees clockwise.
    Rotate270,
}

impl Rotation {
    /// Bits in the mode word of `LoadImage`/`LoadImageArea`.
    pub fn mode_bits(self) -> u16 {
        match self {
            Rotation::Rotate0 => 0x0000,
            Rotation::Rotate90 => 0x0001,
            Rotation::Rotate180 => 0x0002,
            Rotation::Rotate270 => 0x0003,
        }
    }
}

/// Waveform selection for `DisplayArea`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshMode {
    /// Initialization wipe. Clears the panel regardless of image content.
    Init,
    /// 16-level grayscale refresh; slow, highest quality.
    Gc16,
    /// Fast two-level black/white refresh.
    A2,
}

impl RefreshMode {
    /// The wire mode code.
    pub fn code(self) -> u16 {
        match self {
            RefreshMode::Init => 0,
            RefreshMode::Gc16 => 2,
            RefreshMode::A2 => 4,
        }
    }
}

/// Assemble the mode word carried by `LoadImage`/`LoadImageArea`.
pub fn image_mode_word(endian: ImageEndianness, format: PixelFormat, rotation: Rotation) -> u16 {
    endian.mode_bits() | format.mode_bits() | rotation.mode_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes() {
        assert_eq!(Command::SystemRun.opcode(), 0x0001);
        assert_eq!(Command::Standby.opcode(), 0x0002);
        assert_eq!(Command::Sleep.opcode(), 0x0003);
        assert_eq!(Command::RegisterRead.opcode(), 0x0010);
        assert_eq!(Command::RegisterWrite.opcode(), 0x0011);
        assert_eq!(Command::BurstReadTrigger.opcode(), 0x0012);
        assert_eq!(Command::BurstReadStart.opcode(), 0x0013);
        assert_eq!(Command::BurstWrite.opcode(), 0x0014);
        assert_eq!(Command::BurstEnd.opcode(), 0x0015);
        assert_eq!(Command::LoadImage.opcode(), 0x0020);
        assert_eq!(Command::LoadImageArea.opcode(), 0x0021);
        assert_eq!(Command::LoadImageEnd.opcode(), 0x0022);
        assert_eq!(Command::DisplayArea.opcode(), 0x0034);
        assert_eq!(Command::DisplayBufferArea.opcode(), 0x0037);
        assert_eq!(Command::PowerSequence.opcode(), 0x0038);
        assert_eq!(Command::Vcom.opcode(), 0x0039);
        assert_eq!(Command::Temperature.opcode(), 0x0040);
        assert_eq!(Command::GetDeviceInfo.opcode(), 0x0302);
    }

    #[test]
    fn pixel_format_geometry() {
        assert_eq!(PixelFormat::Bpp2.bits_per_pixel(), 2);
        assert_eq!(PixelFormat::Bpp3.bits_per_pixel(), 4);
        assert_eq!(PixelFormat::Bpp4.bits_per_pixel(), 4);
        assert_eq!(PixelFormat::Bpp8.bits_per_pixel(), 8);
        assert_eq!(PixelFormat::Bpp1.bits_per_pixel(), 1);

        assert_eq!(PixelFormat::Bpp2.pixels_per_byte(), 4);
        assert_eq!(PixelFormat::Bpp4.pixels_per_byte(), 2);
        assert_eq!(PixelFormat::Bpp8.pixels_per_byte(), 1);
        assert_eq!(PixelFormat::Bpp1.pixels_per_byte(), 8);

        assert_eq!(PixelFormat::Bpp2.pixels_per_pack(), 8);
        assert_eq!(PixelFormat::Bpp3.pixels_per_pack(), 4);
        assert_eq!(PixelFormat::Bpp4.pixels_per_pack(), 4);
        assert_eq!(PixelFormat::Bpp8.pixels_per_pack(), 2);
        assert_eq!(PixelFormat::Bpp1.pixels_per_pack(), 32);
    }

    #[test]
    fn mode_word_assembly() {
        assert_eq!(
            image_mode_word(
                ImageEndianness::Little,
                PixelFormat::Bpp2,
                Rotation::Rotate0
            ),
            0x0000
        );
        assert_eq!(
            image_mode_word(ImageEndianness::Big, PixelFormat::Bpp4, Rotation::Rotate0),
            0x0120
        );
        assert_eq!(
            image_mode_word(ImageEndianness::Big, PixelFormat::Bpp8, Rotation::Rotate90),
            0x0131
        );
        assert_eq!(
            image_mode_word(
                ImageEndianness::Little,
                PixelFormat::Bpp1,
                Rotation::Rotate270
            ),
            0x00F3
        );
    }

    #[test]
    fn refresh_mode_codes() {
        assert_eq!(RefreshMode::Init.code(), 0);
        assert_eq!(RefreshMode::Gc16.code(), 2);
        assert_eq!(RefreshMode::A2.code(), 4);
    }
}
