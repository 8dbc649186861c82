use std::collections::HashMap;

use super::Bitmap;

/// Handle to a texture stored in a [`TextureCache`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(u32);

impl TextureId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// GPU copy of a cached bitmap.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

struct Entry {
    name: String,
    bitmap: Bitmap,
    gpu: Option<GpuTexture>,
}

/// Name-addressed texture store.
///
/// Ids are stable for the cache's lifetime; replacing a name keeps its id and
/// schedules a re-upload.
#[derive(Default)]
pub struct TextureCache {
    entries: Vec<Entry>,
    by_name: HashMap<String, TextureId>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bitmap: Bitmap) -> TextureId {
        let name = name.into();
        if let Some(&id) = self.by_name.get(&name) {
            let entry = &mut self.entries[id.index()];
            entry.bitmap = bitmap;
            entry.gpu = None;
            return id;
        }

        let id = TextureId(self.entries.len() as u32);
        self.entries.push(Entry {
            name: name.clone(),
            bitmap,
            gpu: None,
        });
        self.by_name.insert(name, id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(name).copied()
    }

    pub fn bitmap(&self, id: TextureId) -> Option<&Bitmap> {
        self.entries.get(id.index()).map(|e| &e.bitmap)
    }

    pub fn name(&self, id: TextureId) -> Option<&str> {
        self.entries.get(id.index()).map(|e| e.name.as_str())
    }

    pub fn gpu(&self, id: TextureId) -> Option<&GpuTexture> {
        self.entries.get(id.index()).and_then(|e| e.gpu.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries waiting for [`TextureCache::upload_pending`].
    pub fn pending_uploads(&self) -> usize {
        self.entries.iter().filter(|e| e.gpu.is_none()).count()
    }

    /// Uploads every bitmap that has no GPU copy yet.
    ///
    /// Color data is uploaded as sRGB; alpha is linear either way, so mask
    /// coverage tests see the exact stored alpha.
    pub fn upload_pending(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        for entry in self.entries.iter_mut().filter(|e| e.gpu.is_none()) {
            let bmp = &entry.bitmap;
            let size = wgpu::Extent3d {
                width: bmp.width(),
                height: bmp.height(),
                depth_or_array_layers: 1,
            };

            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("tableau texture '{}'", entry.name)),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                bmp.pixels(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * bmp.width()),
                    rows_per_image: Some(bmp.height()),
                },
                size,
            );

            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            entry.gpu = Some(GpuTexture { texture, view });
            log::debug!("uploaded texture '{}' ({}x{})", entry.name, bmp.width(), bmp.height());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup_by_name() {
        let mut cache = TextureCache::new();
        let a = cache.insert("sky", Bitmap::solid(2, 2, [0, 0, 255, 255]));
        let b = cache.insert("hill", Bitmap::solid(2, 2, [0, 255, 0, 255]));
        assert_ne!(a, b);
        assert_eq!(cache.lookup("sky"), Some(a));
        assert_eq!(cache.name(b), Some("hill"));
        assert_eq!(cache.lookup("sea"), None);
    }

    #[test]
    fn replacing_keeps_id_and_marks_pending() {
        let mut cache = TextureCache::new();
        let a = cache.insert("sky", Bitmap::solid(1, 1, [1, 1, 1, 255]));
        let again = cache.insert("sky", Bitmap::solid(1, 1, [9, 9, 9, 255]));
        assert_eq!(a, again);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.bitmap(a).map(|b| b.pixel(0, 0)), Some([9, 9, 9, 255]));
        assert_eq!(cache.pending_uploads(), 1);
    }
}
