//! Native mod loading and entry-point dispatch.
//!
//! Each mod is a dynamic library exporting an `mm_mod_descriptor` static
//! (see `mmloader-mod-sdk`). Loading one is a `Result`-returning operation
//! whose error is logged at the module boundary by the run loop; a single
//! bad mod never aborts the overall run.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use mmloader_mod_sdk::{
    ArgValue, BindingFlags, EncodedArgs, EntryInvokeFn, HostApi, PatchStage, RawModDescriptor,
    MM_MOD_ABI_VERSION, MOD_DESCRIPTOR_SYMBOL,
};

use crate::{logger, patch, LoaderError, Result};

/// Options controlling entry-point resolution for one module.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Entry-point method name. Defaults to the conventional `"init"`.
    pub method_name: String,

    /// Restrict resolution to exactly this owner type, when set.
    /// Unset means every exported type is scanned.
    pub type_name: Option<String>,

    /// Arguments to match against parameterized entry points.
    pub args: Option<Vec<ArgValue>>,

    /// Binding flags a candidate entry point must carry.
    pub binding: BindingFlags,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            method_name: "init".to_string(),
            type_name: None,
            args: None,
            binding: BindingFlags::PUBLIC_STATIC,
        }
    }
}

/// An entry point parsed out of a mod descriptor.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    /// Owning type name.
    pub owner: String,
    /// Method name.
    pub method: String,
    /// Declared parameter type names, positionally.
    pub params: Vec<String>,
    /// Binding flags the mod exported the entry point with.
    pub binding: BindingFlags,
    /// Invocation shim inside the mod binary.
    pub invoke: EntryInvokeFn,
}

/// A mod that has been loaded into the process.
pub struct LoadedMod {
    // Keeps the binary mapped; entry-point fn pointers stay valid as long
    // as this handle is alive.
    _library: Library,
    pub name: String,
    pub path: PathBuf,
    pub entry_points: Vec<EntryPoint>,
}

/// Loads mod binaries and dispatches their entry points.
pub struct ModLoader {
    loaded: Vec<LoadedMod>,
}

impl ModLoader {
    pub fn new() -> Self {
        Self { loaded: Vec::new() }
    }

    /// Mods loaded so far in this run.
    pub fn loaded_mods(&self) -> &[LoadedMod] {
        &self.loaded
    }

    /// Immediate files in `dir` whose extension case-insensitively equals
    /// the platform dynamic-library suffix. Not recursive; ordering is
    /// whatever the directory listing yields.
    pub fn discover(dir: &Path) -> Vec<PathBuf> {
        let mut mods = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() && is_mod_library(&path) {
                    mods.push(path);
                }
            }
        }
        mods
    }

    /// Load one mod binary and dispatch its entry points.
    ///
    /// On success the library handle is retained for the process lifetime.
    /// Any error is a per-module condition for the caller to log.
    pub fn load_mod(&mut self, path: &Path, options: &LoadOptions) -> Result<()> {
        let file_name = display_file_name(path);

        let library = unsafe { Library::new(path) }
            .map_err(|e| LoaderError::LoadFailed(e.to_string()))?;

        // The exported symbol is the descriptor static itself, so its
        // address must be read back as a pointer, not as the struct value.
        let descriptor: &RawModDescriptor = unsafe {
            let symbol: Symbol<*const RawModDescriptor> = library
                .get(MOD_DESCRIPTOR_SYMBOL)
                .map_err(|e| LoaderError::MissingDescriptor(e.to_string()))?;
            &**symbol
        };

        if descriptor.abi_version != MM_MOD_ABI_VERSION {
            return Err(LoaderError::AbiMismatch {
                expected: MM_MOD_ABI_VERSION,
                found: descriptor.abi_version,
            });
        }

        let (name, entry_points) = unsafe { parse_descriptor(descriptor)? };

        tracing::info!("loaded mod {} from {}", name, path.display());
        dispatch_entry_points(&file_name, &entry_points, options)?;

        self.loaded.push(LoadedMod {
            _library: library,
            name,
            path: path.to_path_buf(),
            entry_points,
        });
        Ok(())
    }
}

impl Default for ModLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy a raw descriptor into owned entry points.
///
/// # Safety
/// `raw` must be a valid descriptor whose pointer/length pairs reference
/// live, readable memory (the `mm_mod!` macro guarantees this for the
/// exported static).
pub unsafe fn parse_descriptor(raw: &RawModDescriptor) -> Result<(String, Vec<EntryPoint>)> {
    let name = unsafe { lossy_str(raw.name, raw.name_len) };

    if raw.entry_points.is_null() && raw.entry_points_len != 0 {
        return Err(LoaderError::InvalidDescriptor(
            "null entry point table".to_string(),
        ));
    }

    let raw_entries = if raw.entry_points_len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(raw.entry_points, raw.entry_points_len) }
    };

    let mut entry_points = Vec::with_capacity(raw_entries.len());
    for entry in raw_entries {
        let params = if entry.params_len == 0 {
            Vec::new()
        } else if entry.params.is_null() {
            return Err(LoaderError::InvalidDescriptor(
                "null parameter table".to_string(),
            ));
        } else {
            unsafe { std::slice::from_raw_parts(entry.params, entry.params_len) }
                .iter()
                .map(|p| unsafe { lossy_str(p.type_name, p.type_name_len) })
                .collect()
        };

        entry_points.push(EntryPoint {
            owner: unsafe { lossy_str(entry.owner, entry.owner_len) },
            method: unsafe { lossy_str(entry.method, entry.method_len) },
            params,
            binding: BindingFlags::from_bits_truncate(entry.binding),
            invoke: entry.invoke,
        });
    }

    Ok((name, entry_points))
}

/// Dispatch every candidate entry point of one module.
///
/// Candidates are entries matching the requested method name and binding
/// flags, narrowed to the requested owner type when one was given. Zero
/// candidates is a recoverable per-module condition, logged and swallowed.
pub fn dispatch_entry_points(
    file_name: &str,
    entry_points: &[EntryPoint],
    options: &LoadOptions,
) -> Result<()> {
    let candidates: Vec<&EntryPoint> = entry_points
        .iter()
        .filter(|e| e.method == options.method_name)
        .filter(|e| e.binding.contains(options.binding))
        .filter(|e| {
            options
                .type_name
                .as_deref()
                .map_or(true, |t| e.owner == t)
        })
        .collect();

    if candidates.is_empty() {
        logger::log_with_timestamp(&format!(
            "{}: Failed to find specified entry point: {}.{}",
            file_name,
            options.type_name.as_deref().unwrap_or("NotSpecified"),
            options.method_name,
        ));
        tracing::warn!(
            "{}: no entry point {}.{}",
            file_name,
            options.type_name.as_deref().unwrap_or("NotSpecified"),
            options.method_name
        );
        return Ok(());
    }

    for entry in candidates {
        if entry.params.is_empty() {
            logger::log_with_timestamp(&format!(
                "{}: Found and called entry point with no params: {}.{}",
                file_name, entry.owner, entry.method,
            ));
            invoke_entry_point(entry, &[])?;
            continue;
        }

        if let Some(args) = options.args.as_deref() {
            if args_match(args, &entry.params) {
                logger::log_with_timestamp(&format!(
                    "{}: Found and called entry point with params: {}.{}",
                    file_name, entry.owner, entry.method,
                ));
                invoke_entry_point(entry, args)?;
                continue;
            }
        }

        // Diagnosing mismatches from the log alone is hard; dump both sides.
        logger::log_with_timestamp(&format!(
            "{}: Provided args don't match {}.{}",
            file_name, entry.owner, entry.method,
        ));
        logger::log("\tPassed in args:");
        match options.args.as_deref() {
            Some(args) if !args.is_empty() => {
                for arg in args {
                    logger::log(&format!(
                        "\t\t{}",
                        arg.type_name.as_deref().unwrap_or("null")
                    ));
                }
            }
            _ => logger::log("\t\tno arguments supplied"),
        }
        logger::log("\tDeclared params:");
        for param in &entry.params {
            logger::log(&format!("\t\t{}", param));
        }
    }

    Ok(())
}

/// Positional argument match: counts must be equal, and every non-null
/// argument's runtime type name must equal the declared parameter type.
/// A null argument matches any parameter type.
pub fn args_match(args: &[ArgValue], params: &[String]) -> bool {
    args.len() == params.len()
        && args
            .iter()
            .zip(params)
            .all(|(arg, param)| arg.type_name.as_deref().map_or(true, |t| t == param))
}

fn invoke_entry_point(entry: &EntryPoint, args: &[ArgValue]) -> Result<()> {
    let encoded = EncodedArgs::new(args);
    let status = unsafe { (entry.invoke)(host_api(), encoded.as_ptr(), encoded.len()) };
    if status != 0 {
        return Err(LoaderError::EntryPointFailed {
            owner: entry.owner.clone(),
            method: entry.method.clone(),
        });
    }
    Ok(())
}

/// The host vtable handed to every entry-point invocation.
pub fn host_api() -> *const HostApi {
    &HOST_API
}

static HOST_API: HostApi = HostApi {
    abi_version: MM_MOD_ABI_VERSION,
    register_patch: host_register_patch,
    log: host_log,
};

unsafe extern "C" fn host_register_patch(
    target: *const u8,
    target_len: usize,
    stage: u32,
    owner: *const u8,
    owner_len: usize,
) -> i32 {
    let Some(stage) = PatchStage::from_code(stage) else {
        tracing::warn!("mod supplied an unknown patch stage code {}", stage);
        return 1;
    };
    let target = unsafe { lossy_str(target, target_len) };
    let owner = unsafe { lossy_str(owner, owner_len) };
    patch::register(&target, stage, &owner);
    0
}

unsafe extern "C" fn host_log(message: *const u8, message_len: usize) {
    let message = unsafe { lossy_str(message, message_len) };
    logger::log(&message);
}

unsafe fn lossy_str(ptr: *const u8, len: usize) -> String {
    if ptr.is_null() || len == 0 {
        return String::new();
    }
    let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
    String::from_utf8_lossy(bytes).into_owned()
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("<unknown>")
        .to_string()
}

/// Platform dynamic-library suffix, or None on unsupported platforms.
fn mod_library_extension() -> Option<&'static str> {
    match std::env::consts::OS {
        "macos" => Some("dylib"),
        "linux" => Some("so"),
        "windows" => Some("dll"),
        _ => None,
    }
}

fn is_mod_library(path: &Path) -> bool {
    let Some(expected) = mod_library_extension() else {
        return false;
    };
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected))
}
