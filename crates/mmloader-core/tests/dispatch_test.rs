//! Entry-point resolution and argument matching, exercised in-process.
//!
//! The smoke mod is linked as an rlib, so its exported descriptor can be
//! parsed and dispatched without going through the dynamic linker; the
//! host vtable routes straight into this process's patch registry and log.

use std::sync::Mutex;

use mmloader_core::loader::{dispatch_entry_points, parse_descriptor, EntryPoint, LoadOptions};
use mmloader_core::patch::PatchStage;
use mmloader_core::{logger, patch, LoaderError};
use mmloader_mod_sdk::{ArgValue, BindingFlags};
use serde_json::json;

static GLOBAL_STATE: Mutex<()> = Mutex::new(());

fn lock() -> std::sync::MutexGuard<'static, ()> {
    GLOBAL_STATE.lock().unwrap_or_else(|e| e.into_inner())
}

struct LogCapture {
    _dir: tempfile::TempDir,
    path: std::path::PathBuf,
}

impl LogCapture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("MMModLoader.log");
        std::fs::write(&path, "").expect("truncate");
        logger::configure(&path);
        Self { _dir: dir, path }
    }

    fn content(&self) -> String {
        std::fs::read_to_string(&self.path).expect("log readable")
    }
}

fn smoke_entry_points() -> Vec<EntryPoint> {
    let (name, entries) =
        unsafe { parse_descriptor(&mmloader_smoke_mod::mm_mod_descriptor) }.expect("descriptor");
    assert_eq!(name, "smoke");
    entries
}

#[test]
fn test_descriptor_parses_both_entry_points() {
    let entries = smoke_entry_points();
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].owner, "SmokeMod");
    assert_eq!(entries[0].method, "init");
    assert!(entries[0].params.is_empty());
    assert_eq!(entries[0].binding, BindingFlags::PUBLIC_STATIC);

    assert_eq!(entries[1].owner, "SmokeSettings");
    assert_eq!(entries[1].method, "configure");
    assert_eq!(entries[1].params, vec!["String", "i64"]);
}

#[test]
fn test_no_param_init_is_invoked_once() {
    let _guard = lock();
    patch::reset();
    let log = LogCapture::new();

    let entries = smoke_entry_points();
    dispatch_entry_points("smoke.so", &entries, &LoadOptions::default()).expect("dispatch");

    let content = log.content();
    assert_eq!(
        content
            .matches("smoke.so: Found and called entry point with no params: SmokeMod.init")
            .count(),
        1
    );
    // The handler ran: it logged through the host and registered patches.
    assert_eq!(content.matches("smoke mod initializing").count(), 1);

    let info = patch::patch_info("GameTimer.Update").expect("patched");
    assert_eq!(info.records(PatchStage::Prefix).len(), 1);
    assert_eq!(info.records(PatchStage::Postfix).len(), 1);
    assert!(info.records(PatchStage::Replacement).is_empty());

    patch::reset();
    logger::reset();
}

#[test]
fn test_matching_args_invoke_parameterized_entry() {
    let _guard = lock();
    let log = LogCapture::new();

    let entries = smoke_entry_points();
    let options = LoadOptions {
        method_name: "configure".to_string(),
        args: Some(vec![
            ArgValue::new("String", json!("monza")),
            ArgValue::new("i64", json!(3)),
        ]),
        ..LoadOptions::default()
    };
    dispatch_entry_points("smoke.so", &entries, &options).expect("dispatch");

    let content = log.content();
    assert!(content
        .contains("smoke.so: Found and called entry point with params: SmokeSettings.configure"));
    assert!(content.contains("smoke mod configured with 2 args"));

    logger::reset();
}

#[test]
fn test_type_mismatch_is_diagnosed_not_invoked() {
    let _guard = lock();
    let log = LogCapture::new();

    let entries = smoke_entry_points();
    let options = LoadOptions {
        method_name: "configure".to_string(),
        args: Some(vec![
            ArgValue::new("String", json!("monza")),
            ArgValue::new("f64", json!(3.5)),
        ]),
        ..LoadOptions::default()
    };
    dispatch_entry_points("smoke.so", &entries, &options).expect("dispatch");

    let content = log.content();
    assert!(content.contains("smoke.so: Provided args don't match SmokeSettings.configure"));
    assert!(content.contains("\tPassed in args:"));
    assert!(content.contains("\t\tf64"));
    assert!(content.contains("\tDeclared params:"));
    assert!(content.contains("\t\tString"));
    assert!(content.contains("\t\ti64"));
    assert!(!content.contains("smoke mod configured"));

    logger::reset();
}

#[test]
fn test_null_argument_matches_any_declared_type() {
    let _guard = lock();
    let log = LogCapture::new();

    let entries = smoke_entry_points();
    let options = LoadOptions {
        method_name: "configure".to_string(),
        args: Some(vec![ArgValue::null(), ArgValue::new("i64", json!(7))]),
        ..LoadOptions::default()
    };
    dispatch_entry_points("smoke.so", &entries, &options).expect("dispatch");

    assert!(log.content().contains("smoke mod configured with 2 args"));

    logger::reset();
}

#[test]
fn test_missing_args_produce_the_no_arguments_marker() {
    let _guard = lock();
    let log = LogCapture::new();

    let entries = smoke_entry_points();
    let options = LoadOptions {
        method_name: "configure".to_string(),
        ..LoadOptions::default()
    };
    dispatch_entry_points("smoke.so", &entries, &options).expect("dispatch");

    let content = log.content();
    assert!(content.contains("smoke.so: Provided args don't match SmokeSettings.configure"));
    assert!(content.contains("\t\tno arguments supplied"));

    logger::reset();
}

#[test]
fn test_unknown_method_logs_failed_to_find() {
    let _guard = lock();
    let log = LogCapture::new();

    let entries = smoke_entry_points();
    let options = LoadOptions {
        method_name: "start".to_string(),
        ..LoadOptions::default()
    };
    dispatch_entry_points("smoke.so", &entries, &options).expect("dispatch");

    assert!(log
        .content()
        .contains("smoke.so: Failed to find specified entry point: NotSpecified.start"));

    logger::reset();
}

#[test]
fn test_requested_type_name_narrows_resolution() {
    let _guard = lock();
    let log = LogCapture::new();

    let entries = smoke_entry_points();

    // An explicit owner that does not exist in the module.
    let missing = LoadOptions {
        method_name: "configure".to_string(),
        type_name: Some("Missing".to_string()),
        args: Some(vec![ArgValue::null(), ArgValue::null()]),
        ..LoadOptions::default()
    };
    dispatch_entry_points("smoke.so", &entries, &missing).expect("dispatch");
    assert!(log
        .content()
        .contains("smoke.so: Failed to find specified entry point: Missing.configure"));

    // The right owner dispatches normally.
    let exact = LoadOptions {
        type_name: Some("SmokeSettings".to_string()),
        ..missing
    };
    dispatch_entry_points("smoke.so", &entries, &exact).expect("dispatch");
    assert!(log.content().contains("smoke mod configured with 2 args"));

    logger::reset();
}

#[test]
fn test_failing_entry_point_reports_module_error() {
    let _guard = lock();
    let log = LogCapture::new();

    unsafe extern "C" fn failing_invoke(
        _host: *const mmloader_mod_sdk::HostApi,
        _args: *const mmloader_mod_sdk::RawArgument,
        _args_len: usize,
    ) -> i32 {
        1
    }

    let entries = vec![EntryPoint {
        owner: "Boom".to_string(),
        method: "init".to_string(),
        params: Vec::new(),
        binding: BindingFlags::PUBLIC_STATIC,
        invoke: failing_invoke,
    }];

    let err = dispatch_entry_points("boom.so", &entries, &LoadOptions::default())
        .expect_err("must fail");
    assert!(matches!(
        err,
        LoaderError::EntryPointFailed { ref owner, ref method } if *owner == "Boom" && *method == "init"
    ));

    // The success line was written before the failure surfaced; the module
    // boundary above this call is responsible for logging the error itself.
    assert!(log
        .content()
        .contains("boom.so: Found and called entry point with no params: Boom.init"));

    logger::reset();
}
