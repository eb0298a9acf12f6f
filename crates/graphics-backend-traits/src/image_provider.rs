/// A decoded pixel buffer handed to `create-texture-from-pixels` (spec.md
/// §6 "From Image decode"). `image-utils` produces these from PNG/etc via
/// the `image` crate; the URC treats the bytes as opaque RGBA8 rows.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
}

impl DecodedImage {
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}
