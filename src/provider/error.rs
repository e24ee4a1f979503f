use std::path::PathBuf;

use thiserror::Error;

/// Failures while opening the provider library
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to load provider library {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("provider library {} does not export `{symbol}`", .path.display())]
    MissingSymbol {
        path: PathBuf,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}
