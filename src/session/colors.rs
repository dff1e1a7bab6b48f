//! Palette index to ARGB resolution.
//!
//! Atom, object and setting colors are palette indices. The session may
//! carry its own `colors` list; anything it does not define falls back to
//! the built-in base palette, which is built once and shared read-only.

use std::sync::OnceLock;

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::pickle::Value;

/// Label/measure color that contrasts with the background.
pub const COLOR_FRONT: i32 = -6;
/// Label/measure color equal to the background.
pub const COLOR_BACK: i32 = -7;
/// Indices with this bit set carry their RGB in the low 24 bits.
const DIRECT_RGB_BIT: i32 = 0x4000_0000;

const OPAQUE: u32 = 0xff00_0000;
const FALLBACK: u32 = 0xff80_8080;

fn base_palette() -> &'static FxHashMap<i32, u32> {
    static PALETTE: OnceLock<FxHashMap<i32, u32>> = OnceLock::new();
    PALETTE.get_or_init(|| {
        [
            (0, 0xffffff),
            (1, 0x000000),
            (2, 0x0000ff),
            (3, 0x00ff00),
            (4, 0xff0000),
            (5, 0x00ffff),
            (6, 0xffff00),
            (7, 0xffff00),
            (8, 0xff00ff),
            (9, 0xff9999),
            (10, 0x7fff7f),
            (11, 0x7f7fff),
            (12, 0xff007f),
            (13, 0xff7f00),
            (14, 0x7fff00),
            (15, 0x00ff7f),
            (16, 0x7f00ff),
            (17, 0x007fff),
            (18, 0xbfbf00),
            (19, 0xbf00bf),
            (20, 0x00bfbf),
            (21, 0x993333),
            (22, 0x339933),
            (23, 0x333399),
            (24, 0x7f7f7f),
            (25, 0x7f7f7f),
            (26, 0x33ff33),
            (27, 0x3333ff),
            (28, 0xff4c4c),
            (29, 0xe5e5e5),
            (30, 0xffb200),
            (31, 0xe5c53f),
        ]
        .into_iter()
        .map(|(i, rgb)| (i, OPAQUE | rgb))
        .collect()
    })
}

/// Pack a 0..1 float RGB triple into opaque ARGB.
#[must_use]
pub fn argb_from_rgb(rgb: Vec3) -> u32 {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    OPAQUE | (c(rgb.x) << 16) | (c(rgb.y) << 8) | c(rgb.z)
}

/// Session palette over the built-in base palette.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorTable {
    session: FxHashMap<i32, u32>,
    names: FxHashMap<String, i32>,
}

impl ColorTable {
    /// Decode the session's `[[name, index, [r, g, b]], ...]` list.
    #[must_use]
    pub fn from_value(list: &Value) -> Self {
        let mut table = Self::default();
        for entry in list.as_seq().unwrap_or_default() {
            let (Some(index), Some(rgb)) =
                (entry.int_at(1), entry.at(2).and_then(Value::as_point))
            else {
                continue;
            };
            let _ = table.session.insert(index, argb_from_rgb(rgb));
            if let Some(name) = entry.text_at(0) {
                let _ = table.names.insert(name.to_owned(), index);
            }
        }
        table
    }

    /// Define or replace a palette entry.
    pub fn insert(&mut self, index: i32, name: &str, argb: u32) {
        let _ = self.session.insert(index, argb);
        let _ = self.names.insert(name.to_owned(), index);
    }

    /// Index of a named session color.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<i32> {
        self.names.get(name).copied()
    }

    /// Number of session-defined colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.session.len()
    }

    /// Whether the session defined no colors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }

    /// ARGB for a palette index. Front/back contrast indices resolve
    /// against `background`.
    #[must_use]
    pub fn argb(&self, index: i32, background: u32) -> u32 {
        match index {
            COLOR_FRONT => contrast(background),
            COLOR_BACK => OPAQUE | background,
            i if i >= 0 && i & DIRECT_RGB_BIT != 0 => {
                OPAQUE | (i as u32 & 0x00ff_ffff)
            }
            i => self
                .session
                .get(&i)
                .or_else(|| base_palette().get(&i))
                .copied()
                .unwrap_or(FALLBACK),
        }
    }
}

/// Black or white, whichever reads better on `background`.
#[must_use]
pub fn contrast(background: u32) -> u32 {
    let r = (background >> 16) & 0xff;
    let g = (background >> 8) & 0xff;
    let b = background & 0xff;
    let luma = 299 * r + 587 * g + 114 * b;
    if luma > 128_000 {
        OPAQUE
    } else {
        0xffff_ffff
    }
}
