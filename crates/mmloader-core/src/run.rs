//! Top-level startup sequence, invoked once by the host.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::loader::{LoadOptions, ModLoader};
use crate::patch::PatchStage;
use crate::{logger, patch};

/// Globally unique identifier the patch subsystem is initialized under.
pub const PATCH_INSTANCE_ID: &str = "de.morphyum.MMModLoader";

/// Mod directory relative to the host application data path, fixed by
/// convention with the host.
pub const MOD_SUBDIRECTORY: &str = "Modding/Harmony";

/// Log file name inside the mod directory.
pub const LOG_FILE_NAME: &str = "MMModLoader.log";

/// The watched mod directory: `<host application data path>/Modding/Harmony`.
pub fn mod_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(MOD_SUBDIRECTORY)
}

/// Run the loader against the conventional mod directory.
pub fn run() {
    run_in(&mod_directory());
}

/// Run the loader against an explicit mod directory.
///
/// Every fault is downgraded to a log entry; this function never returns
/// an error and never unwinds into the host over a module failure.
pub fn run_in(dir: &Path) {
    let started = Instant::now();

    let log_path = match prepare(dir) {
        Ok(path) => path,
        Err(e) => {
            tracing::error!("cannot prepare mod directory {}: {}", dir.display(), e);
            return;
        }
    };
    logger::configure(&log_path);

    patch::initialize(PATCH_INSTANCE_ID);

    let mod_paths = ModLoader::discover(dir);
    if mod_paths.is_empty() {
        logger::log(&format!(
            "No mod libraries loaded. Mod libraries must be placed in the root of {}.",
            dir.display()
        ));
        return;
    }

    let mut loader = ModLoader::new();
    let options = LoadOptions::default();
    for path in &mod_paths {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unknown>");
        logger::log(&format!("Found mod library: {}", file_name));
        if let Err(e) = loader.load_mod(path, &options) {
            // Module boundary: one bad mod never aborts the run.
            logger::log_with_timestamp(&format!(
                "{}: While loading a mod library, an error occurred: {}",
                file_name, e,
            ));
            tracing::warn!("failed to load {}: {}", path.display(), e);
        }
    }

    logger::log("");
    logger::log(&format!(
        "Took {} seconds to load mods",
        started.elapsed().as_secs_f64()
    ));

    log_patch_summary();
}

// Ensure the mod directory exists, then truncate the log and write the
// startup banner.
fn prepare(dir: &Path) -> crate::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let log_path = dir.join(LOG_FILE_NAME);
    let mut file = std::fs::File::create(&log_path)?;
    writeln!(
        file,
        "MMModLoader -- {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    Ok(log_path)
}

/// One block per patched method; stage labels appear only for stages with
/// at least one hook, in Prefixes -> Replacements -> Postfixes order.
pub(crate) fn log_patch_summary() {
    let methods = patch::patched_methods();
    if methods.is_empty() {
        logger::log("No patches loaded.");
        return;
    }

    logger::log("");
    logger::log("Patched methods (after mod loader startup):");

    for method in methods {
        let Some(info) = patch::patch_info(&method) else {
            continue;
        };
        logger::log(&format!("{}:", method));
        for stage in PatchStage::ALL {
            let records = info.records(stage);
            if records.is_empty() {
                continue;
            }
            logger::log(&format!("\t{}:", stage.label()));
            for record in records {
                logger::log(&format!("\t\t{}", record.owner));
            }
        }
    }

    logger::log("");
}
