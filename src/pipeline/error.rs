use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot open domain list {}: {source}", .path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed reading domain list after queuing {queued} domains: {source}")]
    ReadInput {
        queued: usize,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn open_input(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OpenInput {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read_input(queued: usize, source: std::io::Error) -> Self {
        Self::ReadInput { queued, source }
    }
}

/// Failures of the vulnerable-domain ledger.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot create ledger {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot flush ledger {}: {source}", .path.display())]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SinkError {
    pub(crate) fn create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Create {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn flush(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Flush {
            path: path.into(),
            source,
        }
    }
}
