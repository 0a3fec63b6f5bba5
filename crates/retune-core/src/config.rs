//! Retuner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::allocator::ChannelMask;
use crate::{Error, Result};

/// Startup configuration; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetuneConfig {
    /// Pitch-bend half range of the receiver, in cents.
    pub pitch_range_cents: f64,
    /// Enabled output channels, bit 0 = channel 1.
    pub channel_mask: u16,
    pub sample_rate: f64,
    /// Frames per block.
    pub block_size: usize,
    /// Events per block in either direction.
    pub event_capacity: usize,
    /// Inbound messages buffered between the MIDI callback and the block thread.
    pub queue_capacity: usize,
    pub client_name: String,
    pub input_port: String,
    pub output_port: String,
    /// Connect to the first input port whose name contains this instead of
    /// creating a virtual port.
    pub connect_input: Option<String>,
    pub connect_output: Option<String>,
}

impl Default for RetuneConfig {
    fn default() -> Self {
        Self {
            pitch_range_cents: 200.0,
            channel_mask: 0xFFFF,
            sample_rate: 48000.0,
            block_size: 256,
            event_capacity: 256,
            queue_capacity: 1024,
            client_name: "retune".to_string(),
            input_port: "in".to_string(),
            output_port: "out".to_string(),
            connect_input: None,
            connect_output: None,
        }
    }
}

impl RetuneConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.pitch_range_cents.is_finite() && self.pitch_range_cents > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "pitch_range_cents must be positive, got {}",
                self.pitch_range_cents
            )));
        }
        if self.channel_mask == 0 {
            return Err(Error::InvalidConfig(
                "channel_mask enables no output channel".to_string(),
            ));
        }
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !(16..=8192).contains(&self.block_size) {
            return Err(Error::InvalidConfig(format!(
                "block_size {} out of range (16-8192 frames)",
                self.block_size
            )));
        }
        if self.event_capacity < 2 {
            return Err(Error::InvalidConfig(format!(
                "event_capacity {} too small (minimum 2)",
                self.event_capacity
            )));
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig("queue_capacity must be non-zero".to_string()));
        }
        if self.client_name.is_empty() {
            return Err(Error::InvalidConfig("client_name must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn channels(&self) -> ChannelMask {
        ChannelMask::from_bits(self.channel_mask)
    }

    /// Wall-clock length of one block.
    pub fn block_period(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetuneConfig::default();
        assert_eq!(config.pitch_range_cents, 200.0);
        assert_eq!(config.channels(), ChannelMask::ALL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_block_period() {
        let config = RetuneConfig {
            sample_rate: 48000.0,
            block_size: 480,
            ..Default::default()
        };
        assert_eq!(config.block_period(), Duration::from_millis(10));
    }

    #[test]
    fn test_validation() {
        let invalid = [
            RetuneConfig {
                pitch_range_cents: 0.0,
                ..Default::default()
            },
            RetuneConfig {
                channel_mask: 0,
                ..Default::default()
            },
            RetuneConfig {
                sample_rate: 1000.0,
                ..Default::default()
            },
            RetuneConfig {
                block_size: 8,
                ..Default::default()
            },
            RetuneConfig {
                event_capacity: 1,
                ..Default::default()
            },
            RetuneConfig {
                queue_capacity: 0,
                ..Default::default()
            },
        ];
        for config in invalid {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfig(_))),
                "{:?} should be rejected",
                config
            );
        }
    }
}
