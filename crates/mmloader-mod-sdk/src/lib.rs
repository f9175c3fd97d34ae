//! MM Mod Loader SDK
//!
//! This crate defines the ABI shared between the loader and mod binaries:
//! the C-compatible descriptor a mod exports, the argument encoding used
//! when entry points are dispatched, and the host services a mod may call
//! back into while its entry points run.
//!
//! # Quick Start
//!
//! ```rust
//! use mmloader_mod_sdk::prelude::*;
//! use mmloader_mod_sdk::mm_mod;
//!
//! fn init(host: &HostContext, _args: &[ArgValue]) {
//!     host.log("hello from my mod");
//! }
//!
//! mm_mod! {
//!     name: "my-mod",
//!     entry_points: [
//!         { owner: "MyMod", method: "init", params: [], handler: init },
//!     ],
//! }
//! ```

pub mod descriptor;
pub mod host;
#[macro_use]
pub mod macros;
pub mod types;

pub use descriptor::{
    BindingFlags, EntryInvokeFn, MM_MOD_ABI_VERSION, MOD_DESCRIPTOR_SYMBOL, RawArgument,
    RawEntryPoint, RawModDescriptor, RawParam,
};
pub use host::{invoke_entry, HostApi, HostContext};
pub use types::{decode_args, ArgValue, EncodedArgs, PatchStage};

/// Prelude module with common imports for mod authors.
pub mod prelude {
    pub use crate::descriptor::{BindingFlags, MM_MOD_ABI_VERSION};
    pub use crate::host::{HostApi, HostContext};
    pub use crate::types::{ArgValue, PatchStage};
    pub use serde_json::Value;
}
