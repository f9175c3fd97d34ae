//! Declarative export macro for mod binaries.

/// Declare a mod's name and entry points, and export the descriptor the
/// loader resolves.
///
/// Generates the `mm_mod_descriptor` static plus one `extern "C"` shim per
/// entry point. Shims decode the argument list, run the handler, and
/// contain panics behind a nonzero status so a misbehaving mod can never
/// unwind into the host.
///
/// Every exported entry point carries `BindingFlags::PUBLIC_STATIC`: the
/// registration convention only admits publicly visible, free-standing
/// handlers.
///
/// # Example
///
/// ```ignore
/// use mmloader_mod_sdk::prelude::*;
/// use mmloader_mod_sdk::mm_mod;
///
/// fn init(host: &HostContext, _args: &[ArgValue]) {
///     host.register_patch("GameTimer.Update", PatchStage::Prefix, "com.example.my-mod");
/// }
///
/// fn configure(host: &HostContext, args: &[ArgValue]) {
///     host.log(&format!("configured with {} args", args.len()));
/// }
///
/// mm_mod! {
///     name: "my-mod",
///     entry_points: [
///         { owner: "MyMod", method: "init", params: [], handler: init },
///         { owner: "MySettings", method: "configure", params: ["String", "i64"], handler: configure },
///     ],
/// }
/// ```
#[macro_export]
macro_rules! mm_mod {
    (
        name: $name:expr,
        entry_points: [
            $( {
                owner: $owner:expr,
                method: $method:expr,
                params: [ $( $param:expr ),* $(,)? ],
                handler: $handler:path
            } ),+ $(,)?
        ] $(,)?
    ) => {
        #[doc(hidden)]
        const __MM_MOD_OWNERS: &[&str] = &[$( $owner ),+];

        #[doc(hidden)]
        static __MM_MOD_ENTRY_POINTS: [$crate::RawEntryPoint; __MM_MOD_OWNERS.len()] = [
            $(
                {
                    const __PARAM_NAMES: &[&str] = &[$( $param ),*];
                    const __PARAM_COUNT: usize = __PARAM_NAMES.len();

                    static __PARAMS: [$crate::RawParam; __PARAM_COUNT] = [
                        $( $crate::RawParam {
                            type_name: $param.as_ptr(),
                            type_name_len: $param.len(),
                        } ),*
                    ];

                    unsafe extern "C" fn __mm_invoke(
                        host: *const $crate::HostApi,
                        args: *const $crate::RawArgument,
                        args_len: usize,
                    ) -> i32 {
                        unsafe { $crate::invoke_entry(host, args, args_len, $handler) }
                    }

                    $crate::RawEntryPoint {
                        owner: $owner.as_ptr(),
                        owner_len: $owner.len(),
                        method: $method.as_ptr(),
                        method_len: $method.len(),
                        params: &__PARAMS as *const _ as *const $crate::RawParam,
                        params_len: __PARAM_COUNT,
                        binding: $crate::BindingFlags::PUBLIC_STATIC.bits(),
                        invoke: __mm_invoke,
                    }
                }
            ),+
        ];

        /// Descriptor resolved by the loader.
        #[allow(non_upper_case_globals)]
        #[no_mangle]
        pub static mm_mod_descriptor: $crate::RawModDescriptor = $crate::RawModDescriptor {
            abi_version: $crate::MM_MOD_ABI_VERSION,
            name: $name.as_ptr(),
            name_len: $name.len(),
            entry_points: &__MM_MOD_ENTRY_POINTS as *const _ as *const $crate::RawEntryPoint,
            entry_points_len: __MM_MOD_OWNERS.len(),
        };
    };
}
