use std::path::Path;

use anyhow::{Context, Result};
use tableau_engine::texture::{Bitmap, TextureCache};

/// Decodes every PNG in `dir` into `textures`, named by file stem.
///
/// Files are loaded in name order so the cache is stable between runs.
/// Returns the number of textures inserted.
pub fn load_dir(dir: &Path, textures: &mut TextureCache) -> Result<usize> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading asset dir {}", dir.display()))? {
        let path = entry?.path();
        if is_png(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    for path in &paths {
        let Some(name) = texture_name(path) else { continue };
        let rgba = image::open(path)
            .with_context(|| format!("decoding {}", path.display()))?
            .into_rgba8();
        let (w, h) = rgba.dimensions();
        let bitmap = Bitmap::new(w, h, rgba.into_raw())
            .with_context(|| format!("building bitmap for {}", path.display()))?;
        textures.insert(name, bitmap);
        log::debug!("loaded texture '{name}' ({w}x{h})");
    }

    Ok(paths.len())
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

fn texture_name(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tableau-viewer-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn names_come_from_file_stem() {
        assert_eq!(texture_name(Path::new("art/door_mask.png")), Some("door_mask"));
        assert!(is_png(Path::new("sky.PNG")));
        assert!(!is_png(Path::new("scene.toml")));
    }

    #[test]
    fn loads_only_pngs() {
        let dir = scratch_dir("load");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]))
            .save(dir.join("door_mask.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "not an image").unwrap();

        let mut textures = TextureCache::new();
        let n = load_dir(&dir, &mut textures).unwrap();

        assert_eq!(n, 1);
        let id = textures.lookup("door_mask").unwrap();
        let bmp = textures.bitmap(id).unwrap();
        assert_eq!((bmp.width(), bmp.height()), (3, 2));
        assert_eq!(bmp.pixel(2, 1), [255, 0, 0, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_dir_is_an_error() {
        let mut textures = TextureCache::new();
        assert!(load_dir(Path::new("/nonexistent/tableau-assets"), &mut textures).is_err());
    }
}
