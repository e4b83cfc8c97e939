//! Per-build address mappings
//!
//! Each supported title build ships a mapping file giving the addresses of
//! the globals the layout mapper reads:
//!
//! ```text
//! ; D3D
//! d3d_g_pDevice = 0x0052A5C4
//! ```
//!
//! Blank lines and lines starting with `;` are ignored. Values are hex, read
//! from at most the first 10 characters after the `=`.

use crate::error::{Error, Result};
use crate::source::MemorySource;
use phf::phf_map;
use serde::Serialize;
use std::collections::BTreeMap;

/// Address of the build signature in the title image header
pub const BUILD_SIGNATURE_ADDRESS: u32 = 0x10004;

static KNOWN_BUILDS: phf::Map<u32, &'static str> = phf_map! {
    0x545C_211Fu32 => "HaloAddressMappings_v1.0.ini",
    0xEB7D_2DD9u32 => "HaloAddressMappings_Test.ini",
};

/// Mapping file name for a build signature
pub fn mapping_file_for_signature(signature: u32) -> Result<&'static str> {
    KNOWN_BUILDS
        .get(&signature)
        .copied()
        .ok_or(Error::UnsupportedBuild(signature))
}

/// Read the running title's build signature and pick its mapping file
pub fn detect_build(source: &dyn MemorySource) -> Result<(u32, &'static str)> {
    let signature = source.read_u32(BUILD_SIGNATURE_ADDRESS)?;
    let file = mapping_file_for_signature(signature)?;
    tracing::info!("Build signature {:#010x} uses {}", signature, file);
    Ok((signature, file))
}

/// Every key a mapping file must define
pub const MAPPING_KEYS: [&str; 35] = [
    "d3d_g_pDevice",
    "D3DSwapCall",
    "physical_memory_globals_low_stage_address",
    "physical_memory_globals_hi_stage_address",
    "_g_rasterizer_render_targets_array",
    "xbox_texture_cache_globals_standard_cache",
    "xbox_texture_cache_globals_standard_cache_base_address",
    "xbox_texture_cache_globals_low_detail_cache_base_address",
    "xbox_geometry_cache_globals_cache",
    "xbox_geometry_cache_globals_cache_base_address",
    "xbox_sound_cache_globals_cache",
    "xbox_sound_cache_globals_base_address",
    "xbox_animation_cache_globals_cache",
    "xbox_animation_cache_globals_cache_base_address",
    "xbox_animation_cache_globals_animation_cache_size_bytes",
    "g_cache_file_globals_header",
    "_g_something_count",
    "_g_something_count2",
    "_g_network_channels_array",
    "_g_network_channels_array_entry_size",
    "_g_network_connections",
    "_g_network_connections_entry_size",
    "_g_network_message_queues",
    "_g_network_message_queues_entry_size",
    "_g_simulation_view_data_array",
    "_g_simulation_view_data_array_entry_size",
    "_g_simulation_distributed_view_data_array",
    "_g_simulation_distributed_view_data_array_entry_size",
    "_g_simulation_distributed_world",
    "_g_simulation_distributed_world_size",
    "_g_simulation_data_view_array_modifier",
    "_g_network_heap_size",
    "_g_network_heap",
    "_g_webstats_size",
    "_g_webstats",
];

/// Addresses of the title globals for one build
///
/// Fields holding sizes or counts are values rather than addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressMappings {
    // D3D
    pub d3d_device: u32,
    pub d3d_swap_call: u32,

    // Physical memory globals
    pub low_stage_address: u32,
    pub hi_stage_address: u32,

    pub rasterizer_render_targets: u32,

    // LRUV caches and their base addresses
    pub texture_cache: u32,
    pub texture_cache_base: u32,
    pub low_detail_texture_cache_base: u32,
    pub geometry_cache: u32,
    pub geometry_cache_base: u32,
    pub sound_cache: u32,
    pub sound_cache_base: u32,
    pub animation_cache: u32,
    pub animation_cache_base: u32,
    pub animation_cache_size_bytes: u32,

    pub cache_file_header: u32,

    // Network and simulation
    pub something_count: u32,
    pub something_count2: u32,
    pub network_channels: u32,
    pub network_channels_entry_size: u32,
    pub network_connections: u32,
    pub network_connections_entry_size: u32,
    pub network_message_queues: u32,
    pub network_message_queues_entry_size: u32,
    pub simulation_view_data: u32,
    pub simulation_view_data_entry_size: u32,
    pub simulation_distributed_view_data: u32,
    pub simulation_distributed_view_data_entry_size: u32,
    pub simulation_distributed_world: u32,
    pub simulation_distributed_world_size: u32,
    pub simulation_data_view_modifier: i32,
    pub network_heap_size: u32,
    pub network_heap: u32,
    pub webstats_size: u32,
    pub webstats: u32,
}

impl AddressMappings {
    /// Parse a mapping file
    ///
    /// Unknown keys are logged and skipped. Every key in [`MAPPING_KEYS`] must
    /// be present.
    pub fn parse(text: &str) -> Result<Self> {
        let values = parse_values(text)?;
        let get = |key: &'static str| values.get(key).copied().ok_or(Error::MissingMapping(key));

        Ok(Self {
            d3d_device: get("d3d_g_pDevice")?,
            d3d_swap_call: get("D3DSwapCall")?,
            low_stage_address: get("physical_memory_globals_low_stage_address")?,
            hi_stage_address: get("physical_memory_globals_hi_stage_address")?,
            rasterizer_render_targets: get("_g_rasterizer_render_targets_array")?,
            texture_cache: get("xbox_texture_cache_globals_standard_cache")?,
            texture_cache_base: get("xbox_texture_cache_globals_standard_cache_base_address")?,
            low_detail_texture_cache_base: get(
                "xbox_texture_cache_globals_low_detail_cache_base_address",
            )?,
            geometry_cache: get("xbox_geometry_cache_globals_cache")?,
            geometry_cache_base: get("xbox_geometry_cache_globals_cache_base_address")?,
            sound_cache: get("xbox_sound_cache_globals_cache")?,
            sound_cache_base: get("xbox_sound_cache_globals_base_address")?,
            animation_cache: get("xbox_animation_cache_globals_cache")?,
            animation_cache_base: get("xbox_animation_cache_globals_cache_base_address")?,
            animation_cache_size_bytes: get(
                "xbox_animation_cache_globals_animation_cache_size_bytes",
            )?,
            cache_file_header: get("g_cache_file_globals_header")?,
            something_count: get("_g_something_count")?,
            something_count2: get("_g_something_count2")?,
            network_channels: get("_g_network_channels_array")?,
            network_channels_entry_size: get("_g_network_channels_array_entry_size")?,
            network_connections: get("_g_network_connections")?,
            network_connections_entry_size: get("_g_network_connections_entry_size")?,
            network_message_queues: get("_g_network_message_queues")?,
            network_message_queues_entry_size: get("_g_network_message_queues_entry_size")?,
            simulation_view_data: get("_g_simulation_view_data_array")?,
            simulation_view_data_entry_size: get("_g_simulation_view_data_array_entry_size")?,
            simulation_distributed_view_data: get("_g_simulation_distributed_view_data_array")?,
            simulation_distributed_view_data_entry_size: get(
                "_g_simulation_distributed_view_data_array_entry_size",
            )?,
            simulation_distributed_world: get("_g_simulation_distributed_world")?,
            simulation_distributed_world_size: get("_g_simulation_distributed_world_size")?,
            simulation_data_view_modifier: get("_g_simulation_data_view_array_modifier")? as i32,
            network_heap_size: get("_g_network_heap_size")?,
            network_heap: get("_g_network_heap")?,
            webstats_size: get("_g_webstats_size")?,
            webstats: get("_g_webstats")?,
        })
    }
}

fn parse_values(text: &str) -> Result<BTreeMap<&'static str, u32>> {
    let mut values = BTreeMap::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let (name, value) = line.split_once('=').ok_or_else(|| Error::InvalidMapping {
            line: index + 1,
            reason: "expected 'name = value'".to_string(),
        })?;
        let name = name.trim();

        let Some(key) = MAPPING_KEYS.iter().copied().find(|k| *k == name) else {
            tracing::warn!("Mapping '{}' not recognized, ignoring", name);
            continue;
        };

        let value = parse_hex(value.trim()).ok_or_else(|| Error::InvalidMapping {
            line: index + 1,
            reason: format!("'{}' is not a hex value", value.trim()),
        })?;
        values.insert(key, value);
    }

    Ok(values)
}

/// Hex value from at most the first 10 characters, `0x` prefix optional
fn parse_hex(value: &str) -> Option<u32> {
    let end = value
        .char_indices()
        .nth(10)
        .map_or(value.len(), |(i, _)| i);
    let digits = &value[..end];
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    u32::from_str_radix(digits, 16).ok()
}
