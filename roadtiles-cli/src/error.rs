//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use roadtiles::config::ConfigFileError;
use roadtiles::error::ServiceError;
use roadtiles::provider::ProviderError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration could not be loaded or saved
    Config(ConfigFileError),
    /// Bad command-line argument
    InvalidArgument(String),
    /// Failed to build the service
    ServiceCreation(ProviderError),
    /// A service operation failed
    Service(ServiceError),
    FileRead { path: String, error: std::io::Error },
    FileWrite { path: String, error: std::io::Error },
    /// Failed to render JSON output
    Output(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Service(ServiceError::UpstreamUnavailable(_)) => {
                eprintln!();
                eprintln!("The upstream server did not respond after retries.");
                eprintln!("Check connectivity, or override the endpoint with KERALA_PWD_BASE_URL.");
            }
            CliError::Service(ServiceError::RateLimited { .. }) => {
                eprintln!();
                eprintln!("Disable local rate limiting with RATE_LIMIT_ENABLED=false.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::ServiceCreation(e) => write!(f, "Failed to create service: {}", e),
            CliError::Service(e) => write!(f, "{}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Output(e) => write!(f, "Failed to format output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::ServiceCreation(e) => Some(e),
            CliError::Service(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
