//! Timing and transfer-size configuration for the driver.
//!
//! The controller has two independent busy indications: the HRDY pin, which
//! gates every SPI frame, and the LUTAFSR register, which reports the
//! refresh engine. They are polled at different rates in practice (100 ms
//! versus 10 ms) and the two intervals are kept as separate settings here
//! rather than unified.

/// Driver timing and transfer-size settings. Builder methods override the
/// defaults, which match the reference behavior of the chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub(crate) ready_timeout_ms: u16,
    pub(crate) ready_poll_interval_ms: u16,
    pub(crate) refresh_timeout_ms: u16,
    pub(crate) refresh_poll_interval_ms: u16,
    pub(crate) max_frame_bytes: usize,
}

impl Config {
    /// Create a configuration with the reference defaults: 1 s HRDY timeout
    /// polled at 100 ms, 5 s refresh timeout polled at 10 ms, 2048-byte
    /// pixel frames.
    pub fn new() -> Self {
        Config {
            ready_timeout_ms: 1000,
            ready_poll_interval_ms: 100,
            refresh_timeout_ms: 5000,
            refresh_poll_interval_ms: 10,
            max_frame_bytes: 2048,
        }
    }

    /// Bound on any single wait for the HRDY pin.
    pub fn ready_timeout_ms(self, ms: u16) -> Self {
        Self {
            ready_timeout_ms: ms,
            ..self
        }
    }

    /// Interval between HRDY pin samples while waiting.
    pub fn ready_poll_interval_ms(self, ms: u16) -> Self {
        Self {
            ready_poll_interval_ms: ms,
            ..self
        }
    }

    /// Bound on waiting for the refresh engine to go idle.
    pub fn refresh_timeout_ms(self, ms: u16) -> Self {
        Self {
            refresh_timeout_ms: ms,
            ..self
        }
    }

    /// Interval between LUTAFSR register reads while waiting.
    pub fn refresh_poll_interval_ms(self, ms: u16) -> Self {
        Self {
            refresh_poll_interval_ms: ms,
            ..self
        }
    }

    /// Largest pixel payload carried in one SPI frame. Must be even, since
    /// payloads are sequences of 16-bit words.
    pub fn max_frame_bytes(self, bytes: usize) -> Self {
        Self {
            max_frame_bytes: bytes,
            ..self
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::new();
        assert_eq!(cfg.ready_timeout_ms, 1000);
        assert_eq!(cfg.ready_poll_interval_ms, 100);
        assert_eq!(cfg.refresh_timeout_ms, 5000);
        assert_eq!(cfg.refresh_poll_interval_ms, 10);
        assert_eq!(cfg.max_frame_bytes, 2048);
    }

    #[test]
    fn builder_overrides() {
        let cfg = Config::new()
            .ready_timeout_ms(100)
            .refresh_timeout_ms(30)
            .refresh_poll_interval_ms(5)
            .max_frame_bytes(64);
        assert_eq!(cfg.ready_timeout_ms, 100);
        assert_eq!(cfg.ready_poll_interval_ms, 100);
        assert_eq!(cfg.refresh_timeout_ms, 30);
        assert_eq!(cfg.refresh_poll_interval_ms, 5);
        assert_eq!(cfg.max_frame_bytes, 64);
    }
}
