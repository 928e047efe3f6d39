//! User configuration.
//!
//! Settings are read from `~/.roadtiles/config.ini` and then overridden by
//! environment variables. Each INI section maps onto one component:
//!
//! | Section        | Component                 |
//! |----------------|---------------------------|
//! | `[provider]`   | Kerala PWD tile provider  |
//! | `[cache]`      | tiered tile cache         |
//! | `[rate_limit]` | per-client admission      |
//! | `[officials]`  | officials registry client |
//! | `[matcher]`    | road matcher              |
//! | `[logging]`    | log filter and file       |
//!
//! ```no_run
//! use roadtiles::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let cache = config.cache_config();
//! # Ok::<(), roadtiles::config::ConfigFileError>(())
//! ```

mod defaults;
mod env;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use env::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, ConfigFile, LoggingSettings, MatcherSettings, OfficialsSettings,
    ProviderSettings, RateLimitSettings,
};
