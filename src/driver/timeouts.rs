use std::ops::{Deref, DerefMut};

use super::action_driver::{ActionDriver, Timeouts};
use super::error::DriverError;

/// Scoped override of the driver's process-wide timeouts.
///
/// The previous values are captured on [`TimeoutOverride::apply`] and
/// written back when the guard drops, on every exit path including `?`
/// returns and panics. All driver calls made while the override is active
/// go through the guard.
pub struct TimeoutOverride<'a> {
    driver: &'a mut dyn ActionDriver,
    saved: Timeouts,
}

impl<'a> TimeoutOverride<'a> {
    pub fn apply(
        driver: &'a mut dyn ActionDriver,
        overrides: Timeouts,
    ) -> Result<Self, DriverError> {
        let saved = driver.timeouts()?;
        if let Err(e) = driver.set_timeouts(overrides) {
            let _ = driver.set_timeouts(saved);
            return Err(e);
        }
        Ok(Self { driver, saved })
    }

    /// Zero every wait so walking hundreds of nodes pays no idle cost.
    pub fn zero(driver: &'a mut dyn ActionDriver) -> Result<Self, DriverError> {
        Self::apply(driver, Timeouts::ZERO)
    }

    /// Values that will be restored on drop.
    pub fn saved(&self) -> Timeouts {
        self.saved
    }
}

impl<'a> Deref for TimeoutOverride<'a> {
    type Target = dyn ActionDriver + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.driver
    }
}

impl<'a> DerefMut for TimeoutOverride<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.driver
    }
}

impl Drop for TimeoutOverride<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.driver.set_timeouts(self.saved) {
            tracing::warn!(error = %e, "failed to restore driver timeouts");
        }
    }
}
