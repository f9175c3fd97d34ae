//! MM Mod Loader core.
//!
//! Discovers native mod libraries in the host's mod directory, loads each
//! one into the process via `libloading`, dispatches conventional entry
//! points, and reports the method patches the mods registered while
//! loading.
//!
//! The whole run executes synchronously on the thread the host uses to
//! invoke it; the only shared mutable state is the diagnostic log sink and
//! the patch registry, both process-wide.

pub mod loader;
pub mod logger;
pub mod patch;
pub mod run;

pub use loader::{EntryPoint, LoadOptions, LoadedMod, ModLoader};
pub use patch::{PatchInfo, PatchRecord, PatchStage};
pub use run::{mod_directory, run, run_in};

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Loader error types.
///
/// Every variant is a per-module condition: the run loop logs it at the
/// module boundary and moves on, so no error ever escapes [`run`].
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// The module binary could not be loaded into the process.
    #[error("failed to load module: {0}")]
    LoadFailed(String),

    /// The module does not export a loader descriptor.
    #[error("missing mod descriptor: {0}")]
    MissingDescriptor(String),

    /// The module was built against an incompatible ABI.
    #[error("mod ABI mismatch: expected {expected}, found {found}")]
    AbiMismatch { expected: u32, found: u32 },

    /// The module descriptor contains invalid data.
    #[error("invalid mod descriptor: {0}")]
    InvalidDescriptor(String),

    /// An entry point panicked or reported failure.
    #[error("entry point {owner}.{method} failed")]
    EntryPointFailed { owner: String, method: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
