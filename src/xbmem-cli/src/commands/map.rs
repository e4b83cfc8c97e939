//! Memory map command

use super::load_mappings;
use crate::config::Config;
use crate::render::render_memory_map;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use xbmem::{map_title_data, read_page_table_map, MemorySource, PageTableMap, RamSize, TitleLayout};

/// Options for the map command
pub struct MapOptions<'a> {
    pub ram: Option<u32>,
    pub title: bool,
    pub mappings: Option<&'a Path>,
    pub output: &'a Path,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct MapReport {
    ram_mb: u32,
    total_pages: usize,
    used_pages: usize,
    summary: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<TitleLayout>,
}

impl MapReport {
    fn new(map: &PageTableMap, title: Option<TitleLayout>) -> Self {
        Self {
            ram_mb: map.ram_size().megabytes(),
            total_pages: map.len(),
            used_pages: map.used_pages(),
            summary: map
                .summary()
                .into_iter()
                .map(|(tag, pages)| (tag.to_string(), pages))
                .collect(),
            title,
        }
    }
}

/// RAM size from the command line, then the config file, then 64 MB
fn resolve_ram(ram: Option<u32>, config: &Config) -> Result<RamSize> {
    match ram {
        Some(mb) => match RamSize::from_megabytes(mb) {
            Some(ram) => Ok(ram),
            None => bail!("RAM size must be 64 or 128, got {}", mb),
        },
        None => Ok(config.ram_size()?.unwrap_or(RamSize::Mb64)),
    }
}

/// Handle the map command
pub fn handle(source: &dyn MemorySource, options: MapOptions<'_>, config: &Config) -> Result<()> {
    let ram = resolve_ram(options.ram, config)?;

    eprintln!("Reading PTE database ({} MB)...", ram.megabytes());
    let mut map = read_page_table_map(source, ram).context("Failed to classify physical memory")?;

    let title = if options.title {
        let mappings = load_mappings(source, options.mappings, config)?;
        eprintln!("Mapping title data...");
        Some(map_title_data(source, &mappings, &mut map).context("Failed to map title data")?)
    } else {
        None
    };

    let img = render_memory_map(&map);
    img.save(options.output)
        .with_context(|| format!("Failed to save PNG to {}", options.output.display()))?;
    eprintln!("Saved memory map to {}", options.output.display());

    let report = MapReport::new(&map, title);
    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &MapReport) {
    println!(
        "{} MB, {} of {} pages in use",
        report.ram_mb, report.used_pages, report.total_pages
    );
    println!();
    for (tag, pages) in &report.summary {
        println!("  {:<28} {:>6}  ({} KB)", tag, pages, pages * 4);
    }

    if let Some(title) = &report.title {
        println!();
        println!(
            "Title runtime data {:#010x}-{:#010x}",
            title.runtime_start, title.runtime_end
        );
        for region in &title.regions {
            println!(
                "  {:<28} {:#010x} {:>6} pages",
                region.kind.name(),
                region.address,
                region.pages
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbmem::{MappedRegion, PageUseType, RegionKind};

    #[test]
    fn test_resolve_ram() {
        let mut config = Config::default();
        assert_eq!(resolve_ram(None, &config).unwrap(), RamSize::Mb64);
        assert_eq!(resolve_ram(Some(128), &config).unwrap(), RamSize::Mb128);
        assert!(resolve_ram(Some(32), &config).is_err());

        config.set_ram_mb(128).unwrap();
        assert_eq!(resolve_ram(None, &config).unwrap(), RamSize::Mb128);
        assert_eq!(resolve_ram(Some(64), &config).unwrap(), RamSize::Mb64);
    }

    #[test]
    fn test_report_summary() {
        let mut map = PageTableMap::new(RamSize::Mb64);
        map.force_pages(0x8000_0000, 3, PageUseType::Kernel).unwrap();
        map.force_pages(0x8001_0000, 2, PageUseType::Region(RegionKind::TagData))
            .unwrap();

        let report = MapReport::new(&map, None);
        assert_eq!(report.ram_mb, 64);
        assert_eq!(report.total_pages, 16384);
        assert_eq!(report.used_pages, 5);
        assert_eq!(report.summary["Kernel"], 3);
        assert_eq!(report.summary["TagData"], 2);
        assert_eq!(report.summary["Free"], 16379);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("title").is_none());
    }

    #[test]
    fn test_report_with_title() {
        let map = PageTableMap::new(RamSize::Mb64);
        let title = TitleLayout {
            runtime_start: 0x8040_0000,
            runtime_end: 0x8050_0000,
            regions: vec![MappedRegion {
                kind: RegionKind::FrontBuffer,
                address: 0x8100_0000,
                pages: 300,
            }],
        };

        let json = serde_json::to_value(MapReport::new(&map, Some(title))).unwrap();
        assert_eq!(json["title"]["regions"][0]["pages"], 300);
        assert_eq!(json["title"]["regions"][0]["kind"], "FrontBuffer");
    }
}
