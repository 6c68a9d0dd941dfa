use embassy_time::Duration;

use crate::constants::{DEFAULT_ADDRESS, DEFAULT_TIMEOUT};

/// Configuration settings for an Egismos laser module.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// The slave address commands are sent to (1-255).
    pub address: u8,
    /// How long to wait for a complete reply frame.
    pub timeout: Duration,
}

impl Config {
    /// Creates a new `Config` instance.
    ///
    /// # Arguments
    ///
    /// * `address` - The slave address of the module.
    /// * `timeout` - The maximum time to wait for a reply.
    ///
    /// # Returns
    ///
    /// A new `Config` instance with the specified address and timeout.
    pub fn new(address: u8, timeout: Duration) -> Config {
        Config { address, timeout }
    }
    /// Sets the slave address for the configuration.
    ///
    /// Only change this when several modules have been readdressed; the
    /// factory address is `0x01`.
    pub fn address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }
    /// Sets the reply timeout for the configuration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Provides default configuration values for the laser module.
impl Default for Config {
    /// Returns the default configuration.
    ///
    /// The default configuration uses address `0x01` and a 5 second timeout.
    fn default() -> Config {
        Config {
            address: DEFAULT_ADDRESS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
