//! Crate-wide constants and default values
//!
//! Centralized location for hard-coded values so settings defaults and tests agree

/// Socket identity and naming defaults
pub mod socket {
    /// Prefix of generated socket ids ("socket-<uuid>")
    pub const DEFAULT_ID_PREFIX: &str = "socket";

    /// Default display name prefix for input sockets ("Input 1", "Input 2", ...)
    pub const DEFAULT_INPUT_NAME_PREFIX: &str = "Input";

    /// Default display name prefix for output sockets
    pub const DEFAULT_OUTPUT_NAME_PREFIX: &str = "Output";

    /// Upper bound on sockets of one type on a single card
    pub const DEFAULT_MAX_SOCKETS_PER_SIDE: usize = 256;
}

/// View card defaults
pub mod view_card {
    pub const DEFAULT_NAME: &str = "View";
    pub const DEFAULT_DESCRIPTION: &str = "View Node";
}

/// Settings file location and logging defaults
pub mod settings {
    /// Directory under the platform config dir holding the settings file
    pub const CONFIG_DIR_NAME: &str = "card-sockets";

    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// env_logger filter used when RUST_LOG is unset
    pub const DEFAULT_LOG_FILTER: &str = "info";
}
