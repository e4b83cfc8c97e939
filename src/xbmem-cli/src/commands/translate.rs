//! Tiled/linear offset translation

use super::parse_address;
use anyhow::{bail, Result};
use xbmem::{linear_to_tiled, tiled_to_linear, TilePitch};

/// Handle the translate command
///
/// `tiled` is a surface-order offset to locate inside the tiled region.
/// `linear` is a region offset to map back to a surface address based at `base`.
pub fn handle(
    pitch: &str,
    depth: bool,
    tiled: Option<&str>,
    linear: Option<&str>,
    base: Option<&str>,
) -> Result<()> {
    let result = translate(pitch, depth, tiled, linear, base)?;
    println!("{:#010x}", result);
    Ok(())
}

fn translate(
    pitch: &str,
    depth: bool,
    tiled: Option<&str>,
    linear: Option<&str>,
    base: Option<&str>,
) -> Result<u32> {
    let pitch = TilePitch::new(parse_address(pitch)?)?;

    match (tiled, linear) {
        (Some(offset), None) => Ok(tiled_to_linear(pitch, parse_address(offset)?, depth)),
        (None, Some(offset)) => {
            let base = base.map(parse_address).transpose()?.unwrap_or(0);
            Ok(linear_to_tiled(pitch, parse_address(offset)?, base, depth))
        }
        _ => bail!("Specify exactly one of --tiled or --linear"),
    }
}
