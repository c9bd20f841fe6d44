// Configuration constants

/// Path to load the harness configuration from when none is given.
pub const HARNESS_CONFIG_PATH_DEFAULT: &str = "/etc/arraycheck/config.yaml";

/// Array management CLI binary.
pub const DEFAULT_CLI_BINARY: &str = "poseidonos-cli";

/// Array service process terminated during cleanup.
pub const DEFAULT_SERVICE_PROCESS: &str = "poseidonos";

/// Directory holding the result artifacts.
pub const DEFAULT_RESULT_DIR: &str = "/var/lib/arraycheck/results";

/// Mount point of sysfs.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

/// Name of the array under test.
pub const DEFAULT_ARRAY_NAME: &str = "POSArray1";

/// Wait after each device detach, in milliseconds.
pub const DEFAULT_DETACH_SETTLE_MS: u64 = 100;

/// Wait after a PCI rescan, in milliseconds.
pub const DEFAULT_RESCAN_SETTLE_MS: u64 = 1000;

// Result artifact constants

/// Extension of the per-scenario result artifact.
pub const RESULT_FILE_EXTENSION: &str = "result";

/// Extension of the per-scenario JSON log.
pub const LOG_FILE_EXTENSION: &str = "log";

/// Code recorded when the CLI could not be invoked at all, so no response
/// code exists.
pub const INVOCATION_FAILURE_CODE: i64 = -1;
