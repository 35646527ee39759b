//! Output encoding and file writing.

use image::RgbImage;
use std::io;
use std::path::Path;

/// Error type for output operations
#[derive(Debug)]
pub enum OutputError {
    /// IO error during file operations
    Io(io::Error),
    /// Image encoding error
    Image(image::ImageError),
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Io(e) => write!(f, "IO error: {}", e),
            OutputError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(e) => Some(e),
            OutputError::Image(e) => Some(e),
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        OutputError::Io(e)
    }
}

impl From<image::ImageError> for OutputError {
    fn from(e: image::ImageError) -> Self {
        OutputError::Image(e)
    }
}

/// Save the finished canvas, choosing the format from the file extension.
///
/// Missing parent directories are created first.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload_png() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.png");
        let image = RgbImage::from_pixel(3, 2, Rgb([12, 34, 56]));

        save_image(&image, &path).unwrap();
        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(reloaded.dimensions(), (3, 2));
        assert_eq!(reloaded.get_pixel(0, 0).0, [12, 34, 56]);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deep").join("nested").join("out.png");
        let image = RgbImage::from_pixel(1, 1, Rgb([0, 0, 0]));

        save_image(&image, &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_jpeg_by_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.jpeg");
        let image = RgbImage::from_pixel(8, 8, Rgb([128, 128, 128]));

        save_image(&image, &path).unwrap();
        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(reloaded.dimensions(), (8, 8));
    }
}
