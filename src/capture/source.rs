use super::ImageSource;
use crate::error::{Result, SkinToneError};
use image::{ImageError, ImageReader, RgbImage};
use std::path::{Path, PathBuf};

/// Encoded image on disk; the format is sniffed from the content
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ImageSource for FileSource {
    fn read_image(&self) -> Result<RgbImage> {
        let name = self.name();
        let reader = ImageReader::open(&self.path)
            .map_err(|e| SkinToneError::image_read(&name, ImageError::IoError(e)))?
            .with_guessed_format()
            .map_err(|e| SkinToneError::image_read(&name, ImageError::IoError(e)))?;

        let decoded = reader
            .decode()
            .map_err(|e| SkinToneError::image_read(&name, e))?;
        Ok(decoded.to_rgb8())
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Encoded image already in memory, e.g. a decoded upload
pub struct MemorySource<'a> {
    bytes: &'a [u8],
}

impl<'a> MemorySource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl ImageSource for MemorySource<'_> {
    fn read_image(&self) -> Result<RgbImage> {
        let decoded = image::load_from_memory(self.bytes)
            .map_err(|e| SkinToneError::image_read(self.name(), e))?;
        Ok(decoded.to_rgb8())
    }

    fn name(&self) -> String {
        format!("<{} bytes in memory>", self.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::load_canonical;
    use crate::segmentation::Dimensions;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(image: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_memory_source_resizes_to_canonical() {
        let bytes = png_bytes(&RgbImage::from_pixel(40, 30, Rgb([200, 150, 120])));
        let image = load_canonical(&MemorySource::new(&bytes), Dimensions::new(375, 500)).unwrap();

        assert_eq!(image.dimensions(), (375, 500));
        assert_eq!(image.get_pixel(100, 100), &Rgb([200, 150, 120]));
    }

    #[test]
    fn test_canonical_input_is_untouched() {
        let original = RgbImage::from_fn(6, 4, |x, y| Rgb([(x * 40) as u8, (y * 60) as u8, 7]));
        let bytes = png_bytes(&original);
        let image = load_canonical(&MemorySource::new(&bytes), Dimensions::new(6, 4)).unwrap();
        assert_eq!(image, original);
    }

    #[test]
    fn test_corrupt_bytes_are_image_read_errors() {
        let err = MemorySource::new(b"definitely not an image")
            .read_image()
            .unwrap_err();
        assert!(matches!(err, SkinToneError::ImageRead { .. }));
        assert!(err.is_bad_input());
    }

    #[test]
    fn test_missing_file_is_image_read_error() {
        let path = std::env::temp_dir().join("skintone-missing-input.png");
        let err = FileSource::new(&path).read_image().unwrap_err();
        assert!(matches!(err, SkinToneError::ImageRead { .. }));
    }

    #[test]
    fn test_file_source_sniffs_format() {
        let path = std::env::temp_dir().join("skintone-sniffed-input.bin");
        std::fs::write(&path, png_bytes(&RgbImage::from_pixel(3, 3, Rgb([1, 2, 3])))).unwrap();

        let image = FileSource::new(&path).read_image().unwrap();
        assert_eq!(image.get_pixel(2, 2), &Rgb([1, 2, 3]));
        std::fs::remove_file(&path).ok();
    }
}
