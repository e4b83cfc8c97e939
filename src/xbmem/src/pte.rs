//! Page table entry classification
//!
//! The kernel keeps one 32-bit PTE per physical page in a database at a fixed
//! physical frame. A PTE is decoded as:
//!
//! | Bits  | Meaning                                   |
//! |-------|-------------------------------------------|
//! | 0     | Valid: page is mapped                     |
//! | 16    | Busy: page is owned by a kernel subsystem |
//! | 28-31 | Busy type (1-10) when bit 16 is set       |

use crate::error::{Error, Result};
use crate::pages::{
    pfn_to_physical, BusyType, PageTableMap, PageUseType, RamSize, PAGE_SIZE,
};
use crate::source::MemorySource;
use byteorder::{ByteOrder, LE};

/// Physical frame holding the PTE database
pub const PTE_DATABASE_PFN: u32 = 0x03FF0;

const PTE_VALID: u32 = 1 << 0;
const PTE_BUSY: u32 = 1 << 16;
const PTE_BUSY_TYPE_SHIFT: u32 = 28;

const PTES_PER_PAGE: usize = PAGE_SIZE as usize / 4;

/// Kernel image, always resident at the bottom of physical memory
const KERNEL_START: u32 = 0x8000_0000;
const KERNEL_END: u32 = 0x8006_0000;

const INSTANCE_MEMORY_PAGES: u32 = 16;

/// Decode one PTE word
pub fn decode_pte(pte: u32, pfn: usize) -> Result<PageUseType> {
    if pte & PTE_VALID != 0 {
        return Ok(PageUseType::Allocated);
    }

    if pte & PTE_BUSY != 0 {
        let code = (pte >> PTE_BUSY_TYPE_SHIFT) as u8 & 0xF;
        return BusyType::from_code(code)
            .map(PageUseType::Busy)
            .ok_or(Error::UnsupportedBusyType { code, pte, pfn });
    }

    Ok(PageUseType::Free)
}

/// Build a page map from the raw PTE database
///
/// `ptes` holds one word per physical page in frame order. Reserved ranges
/// (kernel image, the PTE database itself, GPU instance memory) are stamped
/// after decoding regardless of what their PTEs say.
pub fn classify(ptes: &[u32], ram: RamSize) -> Result<PageTableMap> {
    if ptes.len() != ram.page_count() {
        return Err(Error::PteCountMismatch {
            expected: ram.page_count(),
            actual: ptes.len(),
        });
    }

    let mut map = PageTableMap::new(ram);
    for (pfn, &pte) in ptes.iter().enumerate() {
        map.set(pfn, decode_pte(pte, pfn)?);
    }

    stamp_reserved_ranges(&mut map)?;

    tracing::info!(
        "Classified {} pages ({} in use)",
        map.len(),
        map.used_pages()
    );

    Ok(map)
}

/// Build a page map from the PTE database as raw little-endian bytes
pub fn classify_bytes(bytes: &[u8], ram: RamSize) -> Result<PageTableMap> {
    if bytes.len() % 4 != 0 {
        return Err(Error::PteCountMismatch {
            expected: ram.page_count(),
            actual: bytes.len() / 4,
        });
    }
    let ptes: Vec<u32> = bytes.chunks_exact(4).map(LE::read_u32).collect();
    classify(&ptes, ram)
}

/// Number of pages backing the PTE database
pub fn pte_database_pages(ram: RamSize) -> u32 {
    (ram.page_count() / PTES_PER_PAGE) as u32
}

/// Physical frame of the GPU instance memory
pub fn instance_memory_pfn(ram: RamSize) -> u32 {
    match ram {
        RamSize::Mb64 => 0x03FE0,
        RamSize::Mb128 => 0x07FF0,
    }
}

fn stamp_reserved_ranges(map: &mut PageTableMap) -> Result<()> {
    let ram = map.ram_size();

    map.force_range(KERNEL_START, KERNEL_END, PageUseType::Kernel)?;
    map.force_pages(
        pfn_to_physical(PTE_DATABASE_PFN),
        pte_database_pages(ram),
        PageUseType::PageTableEntries,
    )?;
    map.force_pages(
        pfn_to_physical(instance_memory_pfn(ram)),
        INSTANCE_MEMORY_PAGES,
        PageUseType::InstanceMemory,
    )?;

    Ok(())
}

/// Read the PTE database from the console, one page at a time
pub fn read_pte_database(source: &dyn MemorySource, ram: RamSize) -> Result<Vec<u32>> {
    let mut ptes = Vec::with_capacity(ram.page_count());

    for page in 0..pte_database_pages(ram) {
        let address = pfn_to_physical(PTE_DATABASE_PFN + page);
        let data = source.read_bytes(address, PAGE_SIZE as usize)?;
        ptes.extend(data.chunks_exact(4).map(LE::read_u32));
    }

    Ok(ptes)
}

/// Read and classify the PTE database in one step
pub fn read_page_table_map(source: &dyn MemorySource, ram: RamSize) -> Result<PageTableMap> {
    let ptes = read_pte_database(source, ram)?;
    classify(&ptes, ram)
}
