//! Configuration persistence
//!
//! Loads and saves the packed parameter block in the last flash sector.
//! Falls back to compile-time defaults when the sector is blank or fails
//! its CRC.

use defmt::*;

use axle_core::config::{AxisConfig, ConfigError, CONFIG_BLOCK_SIZE};
use axle_hal_rp2040::flash::{ConfigFlash, FlashError};

/// Configuration store errors
#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum StoreError {
    Flash(FlashError),
    Block(ConfigError),
}

impl From<FlashError> for StoreError {
    fn from(e: FlashError) -> Self {
        StoreError::Flash(e)
    }
}

/// Flash-backed configuration store
pub struct ConfigStore<'d> {
    flash: ConfigFlash<'d>,
}

impl<'d> ConfigStore<'d> {
    /// Create a store over the flash peripheral
    pub fn new(flash: ConfigFlash<'d>) -> Self {
        Self { flash }
    }

    /// Load the persisted configuration
    pub fn load(&mut self) -> Result<AxisConfig, StoreError> {
        let block = self.flash.read_block()?;
        AxisConfig::decode_block(&block).map_err(StoreError::Block)
    }

    /// Load the persisted configuration, or defaults if none is valid
    pub fn load_or_default(&mut self) -> AxisConfig {
        match self.load() {
            Ok(config) => {
                info!("Loaded configuration from flash");
                config
            }
            Err(e) => {
                warn!("No valid configuration in flash ({:?}), using defaults", e);
                AxisConfig::default()
            }
        }
    }

    /// Persist a packed configuration block
    pub fn save(&mut self, block: &[u8; CONFIG_BLOCK_SIZE]) -> Result<(), StoreError> {
        self.flash.write_block(block)?;
        info!("Configuration saved to flash");
        Ok(())
    }
}
