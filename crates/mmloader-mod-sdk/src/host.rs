//! Host services exposed to mods during entry-point invocation.

use crate::descriptor::RawArgument;
use crate::types::{decode_args, ArgValue, PatchStage};

/// C-compatible vtable of host services.
///
/// The loader passes a pointer to this table into every entry-point
/// invocation; it stays valid for the lifetime of the host process.
#[repr(C)]
pub struct HostApi {
    pub abi_version: u32,

    /// Record one method-interception hook.
    ///
    /// `stage` is a [`PatchStage`] code. Returns 0 on success.
    pub register_patch: unsafe extern "C" fn(
        target: *const u8,
        target_len: usize,
        stage: u32,
        owner: *const u8,
        owner_len: usize,
    ) -> i32,

    /// Append one line to the loader's diagnostic log.
    pub log: unsafe extern "C" fn(message: *const u8, message_len: usize),
}

/// Safe mod-side wrapper around the host vtable.
pub struct HostContext {
    api: *const HostApi,
}

impl HostContext {
    /// Wrap a raw vtable pointer.
    ///
    /// # Safety
    /// `api` must point to a live [`HostApi`] for the lifetime of the
    /// returned context. The loader guarantees this for the pointer it
    /// passes to entry-point shims.
    pub unsafe fn from_raw(api: *const HostApi) -> Self {
        Self { api }
    }

    /// Register a hook against a host method. Returns false if the host
    /// rejected the registration.
    pub fn register_patch(&self, target: &str, stage: PatchStage, owner: &str) -> bool {
        let status = unsafe {
            ((*self.api).register_patch)(
                target.as_ptr(),
                target.len(),
                stage.code(),
                owner.as_ptr(),
                owner.len(),
            )
        };
        status == 0
    }

    /// Write one line into the loader's diagnostic log.
    pub fn log(&self, message: &str) {
        unsafe { ((*self.api).log)(message.as_ptr(), message.len()) }
    }
}

/// Glue called by `mm_mod!`-generated shims: decodes the raw argument list,
/// runs the handler, and contains any panic behind a nonzero status.
///
/// # Safety
/// `host` must point to a live [`HostApi`] and `args`/`args_len` must
/// describe a valid [`RawArgument`] array (or be null/zero).
pub unsafe fn invoke_entry(
    host: *const HostApi,
    args: *const RawArgument,
    args_len: usize,
    handler: fn(&HostContext, &[ArgValue]),
) -> i32 {
    let decoded = unsafe { decode_args(args, args_len) };
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let ctx = unsafe { HostContext::from_raw(host) };
        handler(&ctx, &decoded);
    }));
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}
