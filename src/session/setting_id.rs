//! Numeric ids of the session settings the importer reads.
//!
//! Global settings are stored as a list indexed by these ids; per-branch
//! and per-atom overrides refer to them by the same numbers.

#![allow(missing_docs)]

pub const SOLVENT_RADIUS: u32 = 4;
pub const BG_RGB: u32 = 6;
pub const RIBBON_SAMPLING: u32 = 19;
pub const RIBBON_RADIUS: u32 = 20;
pub const STICK_RADIUS: u32 = 21;
pub const ORTHOSCOPIC: u32 = 23;
pub const LINE_WIDTH: u32 = 44;
pub const ALL_STATES: u32 = 49;
pub const VALENCE: u32 = 64;
pub const NONBONDED_SIZE: u32 = 65;
pub const LABEL_COLOR: u32 = 66;
pub const DEPTH_CUE: u32 = 84;
pub const FOG: u32 = 88;
pub const CARTOON_LOOP_RADIUS: u32 = 92;
pub const CARTOON_RECT_LENGTH: u32 = 96;
pub const CARTOON_OVAL_LENGTH: u32 = 100;
pub const CARTOON_TUBE_RADIUS: u32 = 103;
pub const RIBBON_WIDTH: u32 = 106;
pub const DASH_WIDTH: u32 = 107;
pub const CARTOON_ROUND_HELICES: u32 = 111;
pub const CARTOON_FANCY_HELICES: u32 = 118;
pub const TRANSPARENCY: u32 = 138;
pub const SURFACE_MODE: u32 = 143;
pub const SURFACE_COLOR: u32 = 144;
pub const FIELD_OF_VIEW: u32 = 152;
pub const SPHERE_SCALE: u32 = 155;
pub const TWO_SIDED_LIGHTING: u32 = 156;
pub const SPHERE_TRANSPARENCY: u32 = 172;
pub const CARTOON_CYLINDRICAL_HELICES: u32 = 180;
pub const CARTOON_HELIX_RADIUS: u32 = 181;
pub const FOG_START: u32 = 192;
pub const STATE: u32 = 193;
pub const FRAME: u32 = 194;
pub const STICK_TRANSPARENCY: u32 = 198;
pub const CARTOON_TRANSPARENCY: u32 = 279;
pub const RAY_PIXEL_SCALE: u32 = 327;
pub const LABEL_FONT_ID: u32 = 328;
pub const CARTOON_PUTTY_RADIUS: u32 = 378;
pub const CARTOON_PUTTY_RANGE: u32 = 379;
pub const CARTOON_PUTTY_SCALE_MIN: u32 = 380;
pub const CARTOON_PUTTY_SCALE_MAX: u32 = 381;
pub const CARTOON_PUTTY_SCALE_POWER: u32 = 382;
pub const CARTOON_PUTTY_QUALITY: u32 = 383;
pub const CARTOON_LADDER_MODE: u32 = 448;
pub const LABEL_SIZE: u32 = 453;
pub const LABEL_POSITION: u32 = 471;
pub const LABEL_DISTANCE_DIGITS: u32 = 523;
pub const LABEL_ANGLE_DIGITS: u32 = 524;
pub const LABEL_DIHEDRAL_DIGITS: u32 = 525;
pub const DASH_COLOR: u32 = 574;
pub const CARTOON_PUTTY_TRANSFORM: u32 = 581;
