//! Flash storage for the persisted configuration block
//!
//! The block lives in the last erase sector of the external flash, clear
//! of the firmware image. The block carries its own version and CRC, so
//! no additional envelope is needed here; a blank or torn sector simply
//! fails the CRC check on load.

use embassy_rp::flash::{Blocking, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;

use axle_core::config::CONFIG_BLOCK_SIZE;

/// Total flash size (W25Q16, as fitted on the reference board)
pub const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Byte offset of the configuration sector
pub const CONFIG_OFFSET: u32 = (FLASH_SIZE - ERASE_SIZE) as u32;

/// Flash access errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    Read,
    Erase,
    Write,
}

/// Configuration block storage in the last flash sector
pub struct ConfigFlash<'d> {
    flash: Flash<'d, FLASH, Blocking, FLASH_SIZE>,
}

impl<'d> ConfigFlash<'d> {
    /// Take ownership of the flash peripheral
    pub fn new(flash: Peri<'d, FLASH>) -> Self {
        Self {
            flash: Flash::new_blocking(flash),
        }
    }

    /// Read the raw configuration block
    pub fn read_block(&mut self) -> Result<[u8; CONFIG_BLOCK_SIZE], FlashError> {
        let mut block = [0u8; CONFIG_BLOCK_SIZE];
        self.flash
            .blocking_read(CONFIG_OFFSET, &mut block)
            .map_err(|_| FlashError::Read)?;
        Ok(block)
    }

    /// Erase the configuration sector and write a new block
    pub fn write_block(&mut self, block: &[u8; CONFIG_BLOCK_SIZE]) -> Result<(), FlashError> {
        self.flash
            .blocking_erase(CONFIG_OFFSET, CONFIG_OFFSET + ERASE_SIZE as u32)
            .map_err(|_| FlashError::Erase)?;
        self.flash
            .blocking_write(CONFIG_OFFSET, block)
            .map_err(|_| FlashError::Write)?;
        Ok(())
    }
}
