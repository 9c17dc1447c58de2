//! Warehouse location mapping.

use stock_proxy_core::{Country, LocationId};

use crate::config::LocationConfig;

/// Maps a storefront country to the warehouse location that serves it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationMapping {
    uk: Option<LocationId>,
    us: Option<LocationId>,
}

impl From<LocationConfig> for LocationMapping {
    fn from(config: LocationConfig) -> Self {
        Self {
            uk: config.uk,
            us: config.us,
        }
    }
}

impl LocationMapping {
    #[must_use]
    pub const fn new(uk: Option<LocationId>, us: Option<LocationId>) -> Self {
        Self { uk, us }
    }

    /// Location for `country`, or `None` if it is not configured.
    #[must_use]
    pub const fn location_for(&self, country: Country) -> Option<LocationId> {
        match country {
            Country::Uk => self.uk,
            Country::Us => self.us,
        }
    }

    /// Whether both warehouses are configured.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.uk.is_some() && self.us.is_some()
    }
}
