//! Mod descriptor ABI.
//!
//! Every mod exports exactly one [`RawModDescriptor`] as the `#[no_mangle]`
//! static named by [`MOD_DESCRIPTOR_SYMBOL`]. All strings cross the boundary
//! as pointer/length pairs into `'static`, read-only data.

use bitflags::bitflags;

use crate::host::HostApi;

/// ABI version stamped into every descriptor. The loader refuses modules
/// built against a different version.
pub const MM_MOD_ABI_VERSION: u32 = 1;

/// Symbol name under which a mod exports its descriptor.
pub const MOD_DESCRIPTOR_SYMBOL: &[u8] = b"mm_mod_descriptor";

bitflags! {
    /// Visibility/staticness constraints used when resolving entry points.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BindingFlags: u32 {
        const PUBLIC = 1 << 0;
        const STATIC = 1 << 1;
    }
}

impl BindingFlags {
    /// The conventional binding for exported entry points.
    pub const PUBLIC_STATIC: BindingFlags = BindingFlags::PUBLIC.union(BindingFlags::STATIC);
}

/// One declared parameter of an entry point.
#[repr(C)]
#[derive(Debug)]
pub struct RawParam {
    pub type_name: *const u8,
    pub type_name_len: usize,
}

/// One argument value crossing the module boundary.
///
/// A null `type_name` pointer denotes the null argument, which matches any
/// declared parameter type during dispatch.
#[repr(C)]
#[derive(Debug)]
pub struct RawArgument {
    pub type_name: *const u8,
    pub type_name_len: usize,
    pub value_json: *const u8,
    pub value_json_len: usize,
}

/// Signature of the `mm_mod!`-generated entry-point shim.
///
/// Returns 0 on success; any other value reports a contained failure (for
/// example a panic inside the handler).
pub type EntryInvokeFn =
    unsafe extern "C" fn(host: *const HostApi, args: *const RawArgument, args_len: usize) -> i32;

/// One exported entry point: owner type name, method name, declared
/// parameter type names, binding flags, and the invocation shim.
#[repr(C)]
#[derive(Debug)]
pub struct RawEntryPoint {
    pub owner: *const u8,
    pub owner_len: usize,
    pub method: *const u8,
    pub method_len: usize,
    pub params: *const RawParam,
    pub params_len: usize,
    pub binding: u32,
    pub invoke: EntryInvokeFn,
}

/// Descriptor exported by every mod.
#[repr(C)]
#[derive(Debug)]
pub struct RawModDescriptor {
    pub abi_version: u32,
    pub name: *const u8,
    pub name_len: usize,
    pub entry_points: *const RawEntryPoint,
    pub entry_points_len: usize,
}

// Descriptors are assembled by `mm_mod!` from `'static`, read-only data and
// never mutated, so sharing the statics across threads is sound.
unsafe impl Sync for RawParam {}
unsafe impl Sync for RawEntryPoint {}
unsafe impl Sync for RawModDescriptor {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binding_covers_public_static() {
        assert!(BindingFlags::PUBLIC_STATIC.contains(BindingFlags::PUBLIC));
        assert!(BindingFlags::PUBLIC_STATIC.contains(BindingFlags::STATIC));
    }

    #[test]
    fn test_binding_round_trip_through_bits() {
        let bits = BindingFlags::PUBLIC_STATIC.bits();
        assert_eq!(BindingFlags::from_bits_truncate(bits), BindingFlags::PUBLIC_STATIC);
    }
}
