//! Local placeholder renderer.
//!
//! Draws the prompt text centered on a dark canvas with a thin frame, using
//! the 8x8 bitmap glyphs from `font8x8` scaled up to a readable size. Output
//! is fully deterministic and needs no network or system fonts.

use std::io::Cursor;

use font8x8::legacy::BASIC_LEGACY;
use image::{ImageFormat, Rgb, RgbImage};

use crate::providers::ImageSize;

/// Prompts longer than this many characters are truncated.
pub const MAX_PROMPT_CHARS: usize = 120;

/// Marker appended to a truncated prompt.
pub const ELLIPSIS: char = '…';

const BACKGROUND: Rgb<u8> = Rgb([26, 28, 34]);
const BORDER: Rgb<u8> = Rgb([80, 85, 95]);
const TEXT: Rgb<u8> = Rgb([200, 200, 210]);

const GLYPH_SIZE: u32 = 8;
/// Blank rows between text lines, in glyph pixels.
const LINE_GAP: u32 = 3;
const MARGIN: u32 = 16;
/// Preferred glyph scale; shrinks on narrow canvases.
const MAX_SCALE: u32 = 3;
/// Columns the renderer tries to keep before shrinking the scale.
const MIN_COLUMNS: u32 = 20;

/// Shorten `prompt` to `MAX_PROMPT_CHARS` characters plus an ellipsis.
pub fn placeholder_text(prompt: &str) -> String {
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        let mut text: String = prompt.chars().take(MAX_PROMPT_CHARS).collect();
        text.push(ELLIPSIS);
        text
    } else {
        prompt.to_string()
    }
}

/// Render a PNG placeholder for `prompt` at `size`.
pub fn render_placeholder(prompt: &str, size: ImageSize) -> Result<Vec<u8>, image::ImageError> {
    let canvas = draw_placeholder(prompt, size);
    let mut buf = Cursor::new(Vec::new());
    canvas.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Draw the placeholder canvas without encoding it.
pub fn draw_placeholder(prompt: &str, size: ImageSize) -> RgbImage {
    let (width, height) = (size.width, size.height);
    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);

    if width > 10 && height > 10 {
        draw_frame(&mut canvas, 4, 4, width - 5, height - 5, 2);
    }

    let text = to_drawable(&placeholder_text(prompt));
    let scale = glyph_scale(width);
    let cell = GLYPH_SIZE * scale;
    let line_height = (GLYPH_SIZE + LINE_GAP) * scale;

    let columns = (width.saturating_sub(2 * MARGIN) / cell).max(1) as usize;
    let max_rows = (height.saturating_sub(2 * MARGIN) / line_height).max(1) as usize;

    let mut lines = wrap_text(&text, columns);
    lines.truncate(max_rows);

    let block_height = lines.len() as u32 * line_height - LINE_GAP * scale;
    let top = height.saturating_sub(block_height) / 2;

    for (row, line) in lines.iter().enumerate() {
        let line_width = line.chars().count() as u32 * cell;
        let left = width.saturating_sub(line_width) / 2;
        let y = top + row as u32 * line_height;
        for (col, ch) in line.chars().enumerate() {
            draw_glyph(&mut canvas, left + col as u32 * cell, y, ch, scale);
        }
    }

    canvas
}

fn glyph_scale(width: u32) -> u32 {
    let usable = width.saturating_sub(2 * MARGIN);
    let mut scale = MAX_SCALE;
    while scale > 1 && usable / (GLYPH_SIZE * scale) < MIN_COLUMNS {
        scale -= 1;
    }
    scale
}

/// Map text onto the glyph table: the ellipsis becomes `...`, other
/// non-ASCII characters become `?`.
fn to_drawable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            ELLIPSIS => out.push_str("..."),
            '\n' => out.push('\n'),
            '\t' => out.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Word-wrap each newline-separated line to at most `columns` characters.
fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for source_line in text.split('\n') {
        let mut current = String::new();
        for word in source_line.split_whitespace() {
            let mut word = word.to_string();
            loop {
                let needed = if current.is_empty() {
                    word.len()
                } else {
                    current.len() + 1 + word.len()
                };
                if needed <= columns {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(&word);
                    break;
                }
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    continue;
                }
                // Word alone exceeds a line; hard-split it.
                let rest = word.split_off(columns);
                lines.push(word);
                word = rest;
                if word.is_empty() {
                    break;
                }
            }
        }
        lines.push(current);
    }

    lines
}

fn draw_glyph(canvas: &mut RgbImage, x: u32, y: u32, ch: char, scale: u32) {
    let index = ch as usize;
    if index >= BASIC_LEGACY.len() || ch == ' ' {
        return;
    }

    for (gy, row) in BASIC_LEGACY[index].iter().enumerate() {
        for gx in 0..GLYPH_SIZE {
            if row & (1 << gx) == 0 {
                continue;
            }
            let px = x + gx * scale;
            let py = y + gy as u32 * scale;
            fill_rect(canvas, px, py, scale, scale, TEXT);
        }
    }
}

fn draw_frame(canvas: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, thickness: u32) {
    let w = x1 - x0 + 1;
    let h = y1 - y0 + 1;
    fill_rect(canvas, x0, y0, w, thickness, BORDER);
    fill_rect(canvas, x0, y1 + 1 - thickness, w, thickness, BORDER);
    fill_rect(canvas, x0, y0, thickness, h, BORDER);
    fill_rect(canvas, x1 + 1 - thickness, y0, thickness, h, BORDER);
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = (x + w).min(canvas.width());
    let y_end = (y + h).min(canvas.height());
    for py in y..y_end {
        for px in x..x_end {
            canvas.put_pixel(px, py, color);
        }
    }
}
