use std::sync::mpsc;

/// How [`PixelReadback::read`] waits for the GPU.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ReadbackMode {
    /// Copy, submit and block until the texel is on the CPU. Always current.
    #[default]
    Blocking,
    /// Resolve the previous request without waiting and issue a new one.
    /// Results lag by at least one frame; the last resolved texel is returned
    /// while a request is in flight.
    Deferred,
}

type MapResult = Result<(), wgpu::BufferAsyncError>;

/// GPU→CPU copy of single texels from an `Rgba8Unorm` target.
///
/// Owns one staging buffer sized to a single aligned row. The caller clamps
/// coordinates; out-of-range texels are clamped again here so the copy is
/// always valid.
pub struct PixelReadback {
    buffer: wgpu::Buffer,
    mode: ReadbackMode,
    pending: Option<mpsc::Receiver<MapResult>>,
    last: [u8; 4],
    warned_failure: bool,
}

impl PixelReadback {
    pub fn new(device: &wgpu::Device, label: &str, mode: ReadbackMode) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            mode,
            pending: None,
            last: [0; 4],
            warned_failure: false,
        }
    }

    pub fn mode(&self) -> ReadbackMode {
        self.mode
    }

    /// Reads the texel at `(x, y)` of `texture`.
    ///
    /// Failures (device lost, map error) return transparent black and are
    /// logged once.
    pub fn read(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        x: u32,
        y: u32,
    ) -> [u8; 4] {
        match self.mode {
            ReadbackMode::Blocking => self.read_blocking(device, queue, texture, x, y),
            ReadbackMode::Deferred => self.read_deferred(device, queue, texture, x, y),
        }
    }

    fn read_blocking(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        x: u32,
        y: u32,
    ) -> [u8; 4] {
        let rx = self.issue(device, queue, texture, x, y);

        if let Err(e) = device.poll(wgpu::PollType::wait_indefinitely()) {
            self.warn_once(&format!("device poll failed: {e}"));
            return [0; 4];
        }

        match rx.recv() {
            Ok(Ok(())) => self.take_mapped(),
            Ok(Err(e)) => {
                self.warn_once(&format!("buffer map failed: {e}"));
                [0; 4]
            }
            Err(_) => {
                self.warn_once("map callback dropped");
                [0; 4]
            }
        }
    }

    fn read_deferred(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        x: u32,
        y: u32,
    ) -> [u8; 4] {
        if let Some(rx) = self.pending.take() {
            let _ = device.poll(wgpu::PollType::Poll);
            match rx.try_recv() {
                Ok(Ok(())) => {
                    self.last = self.take_mapped();
                }
                Ok(Err(e)) => {
                    self.warn_once(&format!("buffer map failed: {e}"));
                }
                Err(mpsc::TryRecvError::Empty) => {
                    // Still in flight; the buffer stays mapped-pending.
                    self.pending = Some(rx);
                    return self.last;
                }
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.warn_once("map callback dropped");
                }
            }
        }

        self.pending = Some(self.issue(device, queue, texture, x, y));
        self.last
    }

    fn issue(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        x: u32,
        y: u32,
    ) -> mpsc::Receiver<MapResult> {
        let size = texture.size();
        let x = x.min(size.width.saturating_sub(1));
        let y = y.min(size.height.saturating_sub(1));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tableau readback encoder"),
        });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = mpsc::channel();
        self.buffer
            .slice(..4)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        rx
    }

    fn take_mapped(&self) -> [u8; 4] {
        let mut texel = [0u8; 4];
        {
            let data = self.buffer.slice(..4).get_mapped_range();
            texel.copy_from_slice(&data[..4]);
        }
        self.buffer.unmap();
        texel
    }

    fn warn_once(&mut self, msg: &str) {
        if !self.warned_failure {
            log::warn!("pixel readback: {msg}; treating as empty");
            self.warned_failure = true;
        }
    }
}
