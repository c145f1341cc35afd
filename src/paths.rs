/// Unit template, relative to the application directory
pub const UNIT_TEMPLATE: &str = "dist/server-backup-simple.service";

/// Default destination of the rendered unit
pub const UNIT_DEST: &str = "/etc/systemd/system/server-backup-simple.service";

/// Parent directory of user home directories
pub const HOME_ROOT: &str = "/home";

/// SSH directory name inside a home directory
pub const SSH_DIR: &str = ".ssh";

/// Directory holding backup configurations, relative to the application directory
pub const CONFIG_DIR: &str = "config";

/// Log file name, relative to the application directory
pub const LOG_FILE: &str = "server-backup-simple.log";

/// chrono format of dump file stems (e.g. "2024-03-01 02_30_00")
pub const DUMP_TIME_FORMAT: &str = "%Y-%m-%d %H_%M_%S";

/// Environment variable carrying the SSH identity used for remote commands
pub const SSH_KEY_ENV: &str = "SBS_SSH_KEY";
