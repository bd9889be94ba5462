use serde::{Deserialize, Serialize};

use crate::api_client::types::SettingsResponse;

pub const DEFAULT_COOLDOWN_HOURS: u32 = 24;

/// Low-stock popup policy, as configured on the inventory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    pub popup_enabled: bool,
    /// Pin low-stock rows to the top of the overview.
    pub pin_enabled: bool,
    /// Minimum time between popups while the count is not rising. At
    /// least one hour.
    pub cooldown_hours: u32,
}

impl AlertPolicy {
    pub fn new(popup_enabled: bool, pin_enabled: bool, cooldown_hours: u32) -> Self {
        Self {
            popup_enabled,
            pin_enabled,
            cooldown_hours: cooldown_hours.max(1),
        }
    }

    pub fn cooldown_millis(&self) -> i64 {
        i64::from(self.cooldown_hours.max(1)) * 60 * 60 * 1000
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(true, true, DEFAULT_COOLDOWN_HOURS)
    }
}

impl From<SettingsResponse> for AlertPolicy {
    fn from(settings: SettingsResponse) -> Self {
        let defaults = Self::default();
        let cooldown_hours = settings
            .popup_cooldown_hours
            .map(|hours| hours.clamp(1, i64::from(u32::MAX)) as u32)
            .unwrap_or(defaults.cooldown_hours);
        Self::new(
            settings
                .low_stock_popup_enabled
                .unwrap_or(defaults.popup_enabled),
            settings
                .low_stock_pin_enabled
                .unwrap_or(defaults.pin_enabled),
            cooldown_hours,
        )
    }
}
