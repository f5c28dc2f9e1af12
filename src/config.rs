//! Configuration for the LiteDB client
//!
//! Centralized configuration with sensible defaults.

use crate::error::{LiteDbError, Result};
use crate::protocol::{DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, MAX_MESSAGE_SIZE};
use crate::queue::DEFAULT_MAX_QUEUE_LENGTH;

/// Main configuration for a client connection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Server Configuration
    // -------------------------------------------------------------------------
    /// Server hostname or IP
    pub host: String,

    /// Server TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Queue Configuration
    // -------------------------------------------------------------------------
    /// Max commands outstanding (waiting to be sent + waiting for reply)
    pub max_queue_length: usize,

    /// Max byte length of a single command string
    pub max_message_size: usize,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Bytes buffered in the writer before the transport reports itself full
    pub write_high_water_mark: usize,

    /// Size of each socket read (bytes)
    pub read_buffer_size: usize,

    /// Connect timeout (milliseconds, 0 = no timeout)
    pub connect_timeout_ms: u64,

    /// Disable Nagle's algorithm
    pub nodelay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            max_queue_length: DEFAULT_MAX_QUEUE_LENGTH,
            max_message_size: MAX_MESSAGE_SIZE,
            write_high_water_mark: 64 * 1024, // 64 KB
            read_buffer_size: 8 * 1024,       // 8 KB
            connect_timeout_ms: 5000,
            nodelay: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` string for connecting
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_queue_length == 0 {
            return Err(LiteDbError::Config(
                "max_queue_length must be at least 1".to_string(),
            ));
        }
        if self.max_message_size == 0 || self.max_message_size > i32::MAX as usize {
            return Err(LiteDbError::Config(format!(
                "max_message_size must be between 1 and {}",
                i32::MAX
            )));
        }
        if self.read_buffer_size == 0 {
            return Err(LiteDbError::Config(
                "read_buffer_size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the admission bound on outstanding commands
    pub fn max_queue_length(mut self, len: usize) -> Self {
        self.config.max_queue_length = len;
        self
    }

    /// Set the maximum command size (in bytes)
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Set the writer high-water mark (in bytes)
    pub fn write_high_water_mark(mut self, bytes: usize) -> Self {
        self.config.write_high_water_mark = bytes;
        self
    }

    /// Set the socket read size (in bytes)
    pub fn read_buffer_size(mut self, bytes: usize) -> Self {
        self.config.read_buffer_size = bytes;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
