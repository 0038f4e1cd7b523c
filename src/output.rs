use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use thiserror::Error;

use crate::pipeline::Buffer;
use crate::util::UnsignedColor;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("can't save {}: {source}", .path.display())]
    Save {
        path: std::path::PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{width}x{height} doesn't fit into an image")]
    TooLarge { width: usize, height: usize },
}

/// Converts a render target into an rgb8 image, row 0 of the buffer is the top row.
pub fn to_image(buffer: &Buffer<UnsignedColor>) -> Result<RgbImage, OutputError> {
    let too_large = || OutputError::TooLarge {
        width: buffer.width(),
        height: buffer.height(),
    };
    let width = u32::try_from(buffer.width()).map_err(|_| too_large())?;
    let height = u32::try_from(buffer.height()).map_err(|_| too_large())?;
    return Ok(ImageBuffer::from_fn(width, height, |x, y| {
        let color = buffer.get_at(x as usize, y as usize);
        Rgb([color.r, color.g, color.b])
    }));
}

/// Saves a render target, file format is picked by the path extension.
pub fn save_resource(buffer: &Buffer<UnsignedColor>, path: impl AsRef<Path>) -> Result<(), OutputError> {
    let path = path.as_ref();
    to_image(buffer)?.save(path).map_err(|source| OutputError::Save {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Saved {}x{} image to {}", buffer.width(), buffer.height(), path.display());
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_png_keeps_pixels() {
        let mut buffer = Buffer::filled(3, 2, UnsignedColor::new(111, 5, 243));
        *buffer.item_at(2, 1) = UnsignedColor::new(10, 20, 30);
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("result.png");
        save_resource(&buffer, &path).unwrap();

        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0), &Rgb([111, 5, 243]));
        assert_eq!(image.get_pixel(2, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let buffer = Buffer::filled(1, 1, UnsignedColor::default());
        let directory = tempfile::tempdir().unwrap();
        let result = save_resource(&buffer, directory.path().join("result.unknown"));
        assert!(matches!(result, Err(OutputError::Save { .. })));
    }
}
