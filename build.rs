//! Generates the sin/tan lookup tables consumed by `src/trig.rs`.
//!
//! The tables are baked in as `const` arrays rather than computed by a
//! one-shot initializer at process startup, per the design note on
//! avoiding global-init ordering hazards. All math here runs on the host
//! at build time using ordinary `f64`; none of it is part of the
//! runtime determinism surface — only the resulting integer table
//! entries are.

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// One table entry per integer degree in [0, 90], inclusive.
const TABLE_COUNT: usize = 91;

/// Internal fixed-point scale the table values are stored at, wider
/// than the runtime `FixedNum` precision (2^10) so that narrowing to
/// `FixedNum` after table lookup does not lose small-angle resolution.
const ENLARGE: f64 = 1u64.wrapping_shl(20) as f64;

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set by cargo");
    let dest = Path::new(&out_dir).join("trig_tables.rs");

    let mut sin_table = [0i64; TABLE_COUNT];
    let mut tan_table = [0i64; TABLE_COUNT];
    for (degree, (sin_slot, tan_slot)) in sin_table.iter_mut().zip(tan_table.iter_mut()).enumerate() {
        let radians = (degree as f64) * std::f64::consts::PI / 180.0;
        *sin_slot = (radians.sin() * ENLARGE).round() as i64;
        // tan(90) is undefined; clamp to the largest representable table entry
        // rather than emit infinity, since the runtime only ever consults this
        // entry through clamped quadrant reflection and never at exactly 90.
        *tan_slot = if degree == 90 {
            i64::from(i32::MAX)
        } else {
            (radians.tan() * ENLARGE).round() as i64
        };
    }

    let mut out = String::new();
    writeln!(out, "// @generated by build.rs — do not edit by hand.").unwrap();
    writeln!(out, "pub const TRIG_TABLE_COUNT: usize = {TABLE_COUNT};").unwrap();
    writeln!(out, "pub const TRIG_ENLARGE: i64 = {};", ENLARGE as i64).unwrap();
    writeln!(
        out,
        "pub const SIN_TABLE: [i64; {TABLE_COUNT}] = {sin_table:?};"
    )
    .unwrap();
    writeln!(
        out,
        "pub const TAN_TABLE: [i64; {TABLE_COUNT}] = {tan_table:?};"
    )
    .unwrap();

    fs::write(&dest, out).expect("failed to write trig_tables.rs");
    println!("cargo:rerun-if-changed=build.rs");
}
