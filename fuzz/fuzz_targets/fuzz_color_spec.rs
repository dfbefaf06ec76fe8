//! Fuzz target for color name and hex parsing.
//!
//! Tests that attribute resolution handles arbitrary strings without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use screenbuffer::{AttrRequest, Rgba, named_color};

fuzz_target!(|data: &str| {
    let _ = Rgba::from_hex(data);
    let _ = named_color(data);

    if !data.starts_with('#') {
        let with_hash = format!("#{data}");
        let _ = Rgba::from_hex(&with_hash);
    }

    // Unknown names fall back to defaults instead of failing.
    let attr = AttrRequest::new().color(data).bg_color(data).resolve();
    let _ = attr.to_request();
});
