//! CPU-side image decode (spec.md §6 "From Image decode"): turns PNG/JPEG
//! bytes into the `{rgba8, w, h}` buffer `create-texture-from-pixels`
//! consumes. Nothing here touches the GPU; decoding and texture creation are
//! two separate steps by design (spec.md §1 "feeds texture creation").

use std::path::Path;

use graphics_backend_traits::image_provider::DecodedImage;
use image::GenericImageView;

/// Decodes an in-memory image (any format the `image` crate recognizes from
/// its magic bytes) into RGBA8.
pub fn decode_bytes(bytes: &[u8]) -> anyhow::Result<DecodedImage> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba8: img.to_rgba8().into_raw(),
    })
}

/// Decodes a file from disk. Kept separate from [`decode_bytes`] so callers
/// that already have bytes in hand (e.g. loaded through `base-io`) don't pay
/// for a redundant read.
pub fn decode_file(path: impl AsRef<Path>) -> anyhow::Result<DecodedImage> {
    let path = path.as_ref();
    let img = image::open(path)
        .map_err(|err| anyhow::anyhow!("failed to decode {}: {err}", path.display()))?;
    let (width, height) = img.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba8: img.to_rgba8().into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_solid_png_to_expected_dimensions() {
        let mut buf = Vec::new();
        {
            let img = image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]));
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
                .unwrap();
        }

        let decoded = decode_bytes(&buf).unwrap();
        assert_eq!(decoded.width, 4);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.expected_len(), decoded.rgba8.len());
        assert_eq!(&decoded.rgba8[0..4], &[10, 20, 30, 255]);
    }
}
