//! Direct3D structures in console memory
//!
//! - Surface formats and tile pitch rules
//! - Pixel container decoding
//! - Device render targets and memory controller tiles
//! - Tiled/linear address translation

mod device;
mod format;
mod surface;
mod tiling;

pub use device::{
    map_render_targets, map_texture, D3dDevice, Tile, DEPTH_BUFFER_OFFSET,
    FRAME_BUFFER_COUNT_OFFSET, FRAME_BUFFER_OFFSET, TILE_ARRAY_OFFSET, TILE_COUNT, TILE_SIZE,
};
pub use format::{tiled_pitch, D3dFormat, TILE_PITCHES};
pub use surface::{PixelContainer, SurfaceSize, PIXEL_CONTAINER_SIZE};
pub use tiling::{linear_to_rgba, linear_to_tiled, tiled_to_linear, untile_to_rgba, TilePitch};
