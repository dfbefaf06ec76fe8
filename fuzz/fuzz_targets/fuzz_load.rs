//! Fuzz target for the saved buffer parser.
//!
//! Arbitrary bytes must either load into a buffer whose backing array has
//! exactly the declared size, or fail with an error. Never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use screenbuffer::{ScreenBuffer256, ScreenBufferRgb};

fuzz_target!(|data: &[u8]| {
    if let Ok(buf) = ScreenBuffer256::from_bytes(data) {
        let (w, h) = buf.size();
        assert_eq!(buf.as_bytes().len(), w as usize * h as usize * 8);
        // Loaded glyph slots may hold anything; dumping must still work.
        let _ = buf.dump_chars();
    }
    if let Ok(buf) = ScreenBufferRgb::from_bytes(data) {
        let (w, h) = buf.size();
        assert_eq!(buf.as_bytes().len(), w as usize * h as usize * 14);
        let _ = buf.dump_chars();
    }
});
