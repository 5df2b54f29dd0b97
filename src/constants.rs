pub mod defaults {
    pub const CONFIG_FILE: &str = "./storage.json";

    /// Log level used when RUST_LOG is not set
    pub const LOG_LEVEL: &str = "warn";

    /// Template key used when no volume template matches a mount path
    pub const TEMPLATE_PATH: &str = "";

    /// Encryption methods assumed available when the system description
    /// does not list them
    pub const ENCRYPTION_METHODS: [&str; 5] = [
        "luks1",
        "luks2",
        "protected_swap",
        "secure_swap",
        "random_swap",
    ];
}

pub const ENV_PRODUCT_FILE: &str = "STORAGE_CONFIG_PRODUCT";
pub const ENV_LOG: &str = "RUST_LOG";

pub const ROOT_PATH: &str = "/";
pub const SWAP_PATH: &str = "swap";

/// Search shorthand matching any device
pub const SEARCH_ANY: &str = "*";

/// Size bound meaning "use the size of the existing device"
pub const SIZE_CURRENT: &str = "current";
pub const SIZE_UNLIMITED: &str = "unlimited";
