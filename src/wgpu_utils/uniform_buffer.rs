//! Uniform buffers addressed with dynamic offsets
//!
//! Every draw snapshots its program's uniform block into [`UniformStaging`];
//! the staging area is uploaded once per submission into a
//! [`DynamicUniformBuffer`] and each draw binds it at its own offset.

/// CPU side of a dynamic uniform buffer
#[derive(Debug, Clone)]
pub struct UniformStaging {
    bytes: Vec<u8>,
    alignment: usize,
}

impl UniformStaging {
    /// `alignment` is the device's minimum uniform offset alignment
    pub fn new(alignment: u32) -> Self {
        Self {
            bytes: Vec::new(),
            alignment: alignment.max(1) as usize,
        }
    }

    /// Appends a block and returns its offset
    pub fn push(&mut self, block: &[u8]) -> u32 {
        let offset = self.bytes.len().next_multiple_of(self.alignment);
        self.bytes.resize(offset, 0);
        self.bytes.extend_from_slice(block);
        offset as u32
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// GPU side of a dynamic uniform buffer; grows to fit the staging area
pub struct DynamicUniformBuffer {
    buffer: wgpu::Buffer,
    label: String,
    generation: u64,
}

impl DynamicUniformBuffer {
    const INITIAL_SIZE: u64 = 64 * 1024;

    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        Self {
            buffer: Self::create(device, label, Self::INITIAL_SIZE),
            label: label.to_string(),
            generation: 0,
        }
    }

    fn create(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Writes the staging area, reallocating when it no longer fits
    ///
    /// Returns true when the buffer was replaced and bind groups referring to
    /// it must be rebuilt.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, staging: &UniformStaging) -> bool {
        let needed = (staging.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let mut replaced = false;
        if needed > self.buffer.size() {
            let size = needed.next_power_of_two();
            self.buffer = Self::create(device, &self.label, size);
            self.generation += 1;
            replaced = true;
        }
        if needed > 0 {
            let mut bytes = staging.bytes().to_vec();
            bytes.resize(needed as usize, 0);
            queue.write_buffer(&self.buffer, 0, &bytes);
        }
        replaced
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Incremented every time the buffer is reallocated
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_aligns_every_block() {
        let mut staging = UniformStaging::new(256);
        assert_eq!(staging.push(&[1; 240]), 0);
        assert_eq!(staging.push(&[2; 1216]), 256);
        assert_eq!(staging.push(&[3; 192]), 256 + 1280);
        assert_eq!(staging.bytes()[256], 2);
        assert_eq!(staging.bytes()[250], 0);

        staging.clear();
        assert!(staging.is_empty());
        assert_eq!(staging.push(&[4; 16]), 0);
    }
}
