use super::MemoryBus;
use crate::error::BusError;

const OAM_BASE: u16 = 0xFE00;
const OAM_LEN: u16 = 0xA0;

impl MemoryBus {
    /// OAM DMA: copy 160 bytes from `source_page << 8` into OAM through
    /// normal bus accesses, so the source can live in ROM, work RAM, or
    /// the echo region. The transfer completes instantly; the 160-cycle
    /// bus-contention window is out of scope.
    pub(super) fn oam_dma(&mut self, source_page: u8) -> Result<(), BusError> {
        let base = (source_page as u16) << 8;
        log::trace!("OAM DMA from {base:#06x}");
        for offset in 0..OAM_LEN {
            // Unmapped source bytes transfer as 0xFF rather than aborting
            // the copy.
            let (byte, _) = self.safe_read8(base.wrapping_add(offset));
            self.write8(OAM_BASE + offset, byte)?;
        }
        Ok(())
    }
}
