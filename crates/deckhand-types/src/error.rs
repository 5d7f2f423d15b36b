//! Error types and handling for deckhand
//!
//! Only [`Error::NotOwned`] is meant to cross the transfer-call boundary.
//! Every other variant describes a condition that the engine logs and
//! absorbs (resolution failures, per-file and per-plugin transfer failures).

use std::path::PathBuf;

/// Main error type for deckhand operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// A target was handed to a workspace that does not own it
    #[error("'{item}' can not be handled by workspace '{workspace}'")]
    NotOwned {
        /// File or package the operation was started for
        item: String,
        /// Root path of the invoking workspace
        workspace: PathBuf,
    },

    /// A plugin failed to transfer a batch or a single file
    #[error("Transfer error: {message}")]
    Transfer {
        /// Error message describing the transfer failure
        message: String,
    },

    /// A plugin was asked for a capability it does not provide
    #[error("Plugin '{plugin}' does not support {capability}")]
    Unsupported {
        /// Normalized type of the plugin
        plugin: String,
        /// Name of the missing capability
        capability: String,
    },

    /// A target operation failed while executing
    #[error("Operation '{operation}' failed: {message}")]
    Operation {
        /// Normalized operation type
        operation: String,
        /// Error message
        message: String,
    },

    /// The interactive chooser failed
    #[error("Prompt error: {message}")]
    Prompt {
        /// Error message
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

impl Error {
    /// Check if the error is local to one plugin attempt or one file.
    ///
    /// Recoverable failures are reported as warnings; configuration,
    /// ownership and operation errors point at something the user must fix.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Config { .. } | Self::NotOwned { .. } | Self::Operation { .. } => false,
            Self::Io { .. }
            | Self::Transfer { .. }
            | Self::Unsupported { .. }
            | Self::Prompt { .. }
            | Self::Other { .. } => true,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new ownership error
    pub fn not_owned<S: Into<String>, P: Into<PathBuf>>(item: S, workspace: P) -> Self {
        Self::NotOwned {
            item: item.into(),
            workspace: workspace.into(),
        }
    }

    /// Create a new transfer error
    pub fn transfer<S: Into<String>>(message: S) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }

    /// Create a new unsupported-capability error
    pub fn unsupported<P: Into<String>, C: Into<String>>(plugin: P, capability: C) -> Self {
        Self::Unsupported {
            plugin: plugin.into(),
            capability: capability.into(),
        }
    }

    /// Create a new operation error
    pub fn operation<O: Into<String>, S: Into<String>>(operation: O, message: S) -> Self {
        Self::Operation {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a new prompt error
    pub fn prompt<S: Into<String>>(message: S) -> Self {
        Self::Prompt {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_not_owned_names_item_and_workspace() {
        let error = Error::not_owned("src/main.rs", "/home/dev/project");

        assert!(!error.is_recoverable());

        let message = error.to_string();
        assert!(message.contains("src/main.rs"));
        assert!(message.contains("/home/dev/project"));
    }

    #[rstest]
    #[case(Error::config("no dir"), false)]
    #[case(Error::operation("open", "exit 1"), false)]
    #[case(Error::transfer("connection reset"), true)]
    #[case(Error::unsupported("sftp", "download"), true)]
    #[case(Error::prompt("no tty"), true)]
    fn test_is_recoverable(#[case] error: Error, #[case] expected: bool) {
        assert_eq!(error.is_recoverable(), expected);
    }

    #[test]
    fn test_transfer_errors_are_absorbed() {
        assert!(Error::transfer("connection reset").is_recoverable());
        assert!(Error::unsupported("sftp", "download").is_recoverable());
        assert_eq!(
            Error::unsupported("sftp", "download").to_string(),
            "Plugin 'sftp' does not support download"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "test file");
        let error = Error::from(io_error);

        assert!(matches!(error, Error::Io { .. }));
        assert!(error.is_recoverable());
        assert!(error.to_string().contains("test file"));
    }
}
