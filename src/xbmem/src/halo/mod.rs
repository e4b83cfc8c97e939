//! Halo 2 title support
//!
//! Address mappings per build, the title's memory layout, and front buffer
//! capture.

mod frame;
mod layout;
mod mappings;

pub use frame::{capture_front_buffer, FrameCapture};
pub use layout::{map_title_data, unknown_array_page_count, TitleLayout, RASTERIZER_TARGET_COUNT};
pub use mappings::{
    detect_build, mapping_file_for_signature, AddressMappings, BUILD_SIGNATURE_ADDRESS,
    MAPPING_KEYS,
};
