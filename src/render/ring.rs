use crate::config::RendererConfig;
use crate::error::Result;
use crate::render::InstanceConstants;

/// A fixed set of constant regions reused round-robin across frames.
///
/// One region belongs to each frame that may be in flight. The ring only tracks
/// which region is current and packs instance data into it; the caller must
/// not begin a frame until the GPU is done with that region's previous
/// contents (see [`FrameThrottle`](crate::render::FrameThrottle)).
///
/// The ring has a single writer: every mutating method takes `&mut self`.
#[derive(Debug)]
pub struct ConstantRing {
    regions: Vec<Vec<u8>>,
    stride: usize,
    frame_index: usize,
}

impl ConstantRing {
    /// Allocate the regions described by `config`, which must pass validation.
    pub fn new(config: &RendererConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            regions: vec![vec![0; config.constant_buffer_length]; config.frames_in_flight],
            stride: config.stride(),
            // The first advance lands on region 0.
            frame_index: config.frames_in_flight - 1,
        })
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Byte capacity of each region.
    pub fn capacity(&self) -> usize {
        self.regions[0].len()
    }

    /// Number of instance slots per region.
    pub fn slot_count(&self) -> usize {
        self.capacity() / self.stride
    }

    /// Index of the region the current frame writes to.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Move to the next region and return its index.
    pub fn advance(&mut self) -> usize {
        self.frame_index = (self.frame_index + 1) % self.regions.len();
        self.frame_index
    }

    /// Whether an instance written at `offset` fits in a region.
    pub fn fits(&self, offset: usize) -> bool {
        offset + InstanceConstants::SIZE <= self.capacity()
    }

    /// Copy `constants` into the current region at byte `offset`.
    ///
    /// Returns `false`, writing nothing, when the slot would overflow the region.
    pub fn write(&mut self, offset: usize, constants: &InstanceConstants) -> bool {
        if !self.fits(offset) {
            return false;
        }
        let bytes = bytemuck::bytes_of(constants);
        self.regions[self.frame_index][offset..offset + bytes.len()].copy_from_slice(bytes);
        true
    }

    /// Contents of region `index`.
    pub fn region(&self, index: usize) -> &[u8] {
        &self.regions[index]
    }

    /// Read back the instance at `offset` in region `index`.
    pub fn read(&self, index: usize, offset: usize) -> Option<InstanceConstants> {
        let bytes = self
            .regions
            .get(index)?
            .get(offset..offset + InstanceConstants::SIZE)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }
}
