//! Fuzz target for text placement.
//!
//! Writes arbitrary text in every direction, then blits and redraws the
//! result. None of this may panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use screenbuffer::{Direction, DrawOptions, PutOptions, ScreenBuffer256, Terminal};

#[derive(Arbitrary, Debug)]
struct Input {
    width: u8,
    height: u8,
    x: i32,
    y: i32,
    wrap: bool,
    direction: u8,
    text: String,
    draw_x: f64,
    draw_y: f64,
}

fuzz_target!(|input: Input| {
    let width = u32::from(input.width % 16) + 1;
    let height = u32::from(input.height % 8) + 1;
    let direction = match input.direction % 4 {
        0 => Direction::Right,
        1 => Direction::Left,
        2 => Direction::Down,
        _ => Direction::Up,
    };

    let Ok(mut buf) = ScreenBuffer256::new(width, height) else {
        return;
    };
    buf.put(
        &PutOptions::at(input.x, input.y)
            .wrap(input.wrap)
            .direction(direction),
        &input.text,
    );

    let mut other = buf.clone();
    buf.draw(&mut other, &DrawOptions::at(input.draw_x, input.draw_y));

    let mut term = Terminal::new(Vec::new(), 20, 10);
    let _ = buf.draw_terminal(&mut term, &DrawOptions::at(input.draw_x, input.draw_y).delta(true));
});
