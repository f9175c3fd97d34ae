//! Argument values and patch stages exchanged across the module boundary.

use serde_json::Value;

use crate::descriptor::RawArgument;

/// Stage at which a registered hook intercepts its target method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PatchStage {
    /// Runs before the target method.
    Prefix,
    /// Replaces or transforms the target method.
    Replacement,
    /// Runs after the target method.
    Postfix,
}

impl PatchStage {
    /// The fixed reporting order.
    pub const ALL: [PatchStage; 3] =
        [PatchStage::Prefix, PatchStage::Replacement, PatchStage::Postfix];

    /// Stage code carried over the ABI.
    pub fn code(self) -> u32 {
        match self {
            PatchStage::Prefix => 0,
            PatchStage::Replacement => 1,
            PatchStage::Postfix => 2,
        }
    }

    /// Parse a stage code received over the ABI.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(PatchStage::Prefix),
            1 => Some(PatchStage::Replacement),
            2 => Some(PatchStage::Postfix),
            _ => None,
        }
    }

    /// Label used in the patch-summary log.
    pub fn label(self) -> &'static str {
        match self {
            PatchStage::Prefix => "Prefixes",
            PatchStage::Replacement => "Replacements",
            PatchStage::Postfix => "Postfixes",
        }
    }
}

/// One caller-supplied argument.
///
/// `type_name` names the argument's runtime type. `None` is the null
/// argument, which matches any declared parameter type during dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgValue {
    pub type_name: Option<String>,
    pub value: Value,
}

impl ArgValue {
    /// A typed argument.
    pub fn new(type_name: impl Into<String>, value: Value) -> Self {
        Self {
            type_name: Some(type_name.into()),
            value,
        }
    }

    /// The null argument.
    pub fn null() -> Self {
        Self {
            type_name: None,
            value: Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        self.type_name.is_none()
    }
}

/// Decode a raw FFI argument array into owned values.
///
/// Tolerant by design: invalid UTF-8 is replaced and unparseable payloads
/// decode to JSON null, so a malformed caller cannot crash a mod.
///
/// # Safety
/// `args` must point to `args_len` valid [`RawArgument`]s (or be null with
/// `args_len == 0`); every non-null pointer/length pair must describe
/// readable memory.
pub unsafe fn decode_args(args: *const RawArgument, args_len: usize) -> Vec<ArgValue> {
    if args.is_null() || args_len == 0 {
        return Vec::new();
    }

    let raw = unsafe { std::slice::from_raw_parts(args, args_len) };
    raw.iter()
        .map(|arg| {
            if arg.type_name.is_null() {
                return ArgValue::null();
            }

            let type_name = unsafe { lossy_str(arg.type_name, arg.type_name_len) };
            let value = if arg.value_json.is_null() || arg.value_json_len == 0 {
                Value::Null
            } else {
                let bytes = unsafe { std::slice::from_raw_parts(arg.value_json, arg.value_json_len) };
                serde_json::from_slice(bytes).unwrap_or(Value::Null)
            };

            ArgValue {
                type_name: Some(type_name),
                value,
            }
        })
        .collect()
}

unsafe fn lossy_str(ptr: *const u8, len: usize) -> String {
    if len == 0 {
        return String::new();
    }
    let bytes = unsafe { std::slice::from_raw_parts(ptr, len) };
    String::from_utf8_lossy(bytes).into_owned()
}

/// FFI-ready encoding of an argument list.
///
/// Owns the serialized JSON buffers so the raw pointers stay valid for as
/// long as the encoding is alive.
pub struct EncodedArgs {
    #[allow(dead_code)]
    buffers: Vec<(Option<String>, String)>,
    raw: Vec<RawArgument>,
}

impl EncodedArgs {
    pub fn new(args: &[ArgValue]) -> Self {
        let buffers: Vec<(Option<String>, String)> = args
            .iter()
            .map(|arg| (arg.type_name.clone(), arg.value.to_string()))
            .collect();

        let raw = buffers
            .iter()
            .map(|(type_name, json)| RawArgument {
                type_name: type_name
                    .as_ref()
                    .map_or(std::ptr::null(), |s| s.as_ptr()),
                type_name_len: type_name.as_ref().map_or(0, |s| s.len()),
                value_json: json.as_ptr(),
                value_json_len: json.len(),
            })
            .collect();

        Self { buffers, raw }
    }

    pub fn as_ptr(&self) -> *const RawArgument {
        if self.raw.is_empty() {
            std::ptr::null()
        } else {
            self.raw.as_ptr()
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
