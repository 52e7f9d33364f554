//! Driver library for the ITE IT8951 e-paper panel controller.
//!
//! The IT8951 sits between a host SPI bus and an electrophoretic panel. The
//! host talks to it with a small 16-bit command set framed over SPI, gated by
//! a ready ("HRDY") GPIO line, and ships pixel data into the controller's
//! local image buffer in one of several packed wire formats before requesting
//! a waveform refresh. This crate implements that protocol: the frame layer
//! with its handshake, the command and register surface, the packed-pixel
//! staging buffers with their alignment rules, and full- and partial-screen
//! draw operations built on top.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod command;
pub mod config;
pub mod display;
pub mod frame;
pub mod interface;

/// Errors reported by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<IfErr> {
    /// The underlying SPI or GPIO transfer failed. Never retried; the
    /// transport error is carried verbatim.
    Interface(IfErr),
    /// The ready pin or the refresh engine stayed busy past its configured
    /// bound. The operation is abandoned; no partially sent frames are
    /// rolled back.
    Timeout,
    /// The controller identified itself with a LUT firmware family this
    /// driver does not support.
    IncompatibleFirmware,
    /// An operation that needs the device geometry was called before a
    /// successful [`Display::init`](display::Display::init).
    NotInitialized,
    /// The 3 bpp format exists in the protocol enumeration but the packing
    /// path for it does not; it is rejected rather than quietly substituted
    /// with 4 bpp.
    UnsupportedPixelFormat(PixelFormat),
    /// 1 bpp partial updates require the horizontal position and width to be
    /// multiples of 32 pixels.
    MisalignedArea {
        /// Requested horizontal position.
        x: u16,
        /// Requested width.
        width: u16,
    },
    /// Pixel payloads travel as 16-bit words and must contain an even number
    /// of bytes.
    OddPayloadLength(usize),
}

// Re-exports for primary API.
pub use crate::command::{Command, ImageEndianness, PixelFormat, RefreshMode, Rotation};
pub use crate::config::Config;
pub use crate::display::{Area, DeviceInfo, Display};
pub use crate::interface::spi::SpiInterface;
