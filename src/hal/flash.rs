//! Settings Storage
//!
//! Operator settings live in the last page of internal flash as one framed
//! record (see [`crate::config::encode_settings`]).

use embassy_stm32::flash::{Blocking, Error as FlashError, Flash};

use crate::config::{
    decode_settings, encode_settings, BeaconConfig, SETTINGS_FLASH_OFFSET, SETTINGS_PAGE_SIZE,
    SETTINGS_RECORD_SIZE,
};

/// Settings store failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// Flash erase, program or read failed
    Flash(FlashError),
    /// Settings text does not fit the record
    TooLarge,
}

impl defmt::Format for StoreError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Flash(e) => defmt::write!(f, "Flash({})", e),
            Self::TooLarge => defmt::write!(f, "TooLarge"),
        }
    }
}

impl From<FlashError> for StoreError {
    fn from(err: FlashError) -> Self {
        Self::Flash(err)
    }
}

/// Flash-backed settings store
pub struct SettingsStore<'d> {
    flash: Flash<'d, Blocking>,
}

impl<'d> SettingsStore<'d> {
    /// Wrap the flash peripheral
    #[must_use]
    pub fn new(flash: Flash<'d, Blocking>) -> Self {
        Self { flash }
    }

    /// Load stored settings, falling back to defaults
    pub fn load(&mut self) -> BeaconConfig {
        let mut record = [0u8; SETTINGS_RECORD_SIZE];
        if let Err(e) = self.flash.blocking_read(SETTINGS_FLASH_OFFSET, &mut record) {
            warn!("settings: read failed {}, using defaults", e);
            return BeaconConfig::default();
        }
        decode_settings(&record).unwrap_or_else(|| {
            info!("settings: none stored, using defaults");
            BeaconConfig::default()
        })
    }

    /// Erase the settings page and write `config`
    ///
    /// # Errors
    ///
    /// See [`StoreError`].
    pub fn save(&mut self, config: &BeaconConfig) -> Result<(), StoreError> {
        let record = encode_settings(config).map_err(|_| StoreError::TooLarge)?;
        self.flash
            .blocking_erase(SETTINGS_FLASH_OFFSET, SETTINGS_FLASH_OFFSET + SETTINGS_PAGE_SIZE)?;
        self.flash.blocking_write(SETTINGS_FLASH_OFFSET, &record)?;
        info!("settings: saved");
        Ok(())
    }
}
