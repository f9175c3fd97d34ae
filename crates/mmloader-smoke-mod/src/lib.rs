//! Smoke-test mod.
//!
//! Exercises the whole mod surface: a conventional no-param `init` entry
//! that registers patches and logs through the host, plus a parameterized
//! entry for argument-matching tests.

use mmloader_mod_sdk::mm_mod;
use mmloader_mod_sdk::prelude::*;

const OWNER_ID: &str = "com.example.smoke";

fn init(host: &HostContext, _args: &[ArgValue]) {
    host.log("smoke mod initializing");
    host.register_patch("GameTimer.Update", PatchStage::Prefix, OWNER_ID);
    host.register_patch("GameTimer.Update", PatchStage::Postfix, OWNER_ID);
}

fn configure(host: &HostContext, args: &[ArgValue]) {
    host.log(&format!("smoke mod configured with {} args", args.len()));
}

mm_mod! {
    name: "smoke",
    entry_points: [
        { owner: "SmokeMod", method: "init", params: [], handler: init },
        { owner: "SmokeSettings", method: "configure", params: ["String", "i64"], handler: configure },
    ],
}
