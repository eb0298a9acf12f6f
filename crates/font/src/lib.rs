//! Font atlas baking (spec.md §6 "From Font atlas"): rasterizes a TTF/OTF
//! via `fontdue` into one packed RGBA8 texture plus a per-glyph
//! `(uv-rect, metrics)` table, handed to the URC exactly like any other
//! decoded image through `create-texture-from-pixels` (spec.md §4.F `draw-text`
//! consumes the resulting [`FontAtlas`] unmodified).

use fontdue::{Font, FontSettings};
use graphics_backend_traits::font_provider::{FontAtlas, FontGlyphMetrics};

/// Glyphs are packed into fixed-size cells on a row-major shelf; simple and
/// a little wasteful, but atlas sizes here are small (a few hundred glyphs
/// at UI text sizes) and it avoids pulling in a dedicated rect packer.
pub struct FontAtlasBuilder {
    px_size: f32,
}

impl FontAtlasBuilder {
    pub fn new(px_size: f32) -> Self {
        Self { px_size }
    }

    /// Bakes every char in `chars` from the font at `font_bytes` into one
    /// atlas. `chars` is typically an ASCII printable range plus whatever
    /// extra glyphs the application's UI needs.
    pub fn bake(&self, font_bytes: &[u8], chars: impl IntoIterator<Item = char>) -> anyhow::Result<FontAtlas> {
        let font = Font::from_bytes(font_bytes, FontSettings::default())
            .map_err(|err| anyhow::anyhow!("failed to parse font: {err}"))?;

        let rasterized: Vec<(char, fontdue::Metrics, Vec<u8>)> = chars
            .into_iter()
            .map(|c| {
                let (metrics, bitmap) = font.rasterize(c, self.px_size);
                (c, metrics, bitmap)
            })
            .collect();

        let cell = (self.px_size.ceil() as u32 + 2).max(1);
        let columns = 16u32;
        let rows = (rasterized.len() as u32).div_ceil(columns).max(1);
        let atlas_w = columns * cell;
        let atlas_h = rows * cell;
        let mut rgba8 = vec![0u8; (atlas_w * atlas_h * 4) as usize];

        let mut glyphs = Vec::with_capacity(rasterized.len());
        for (index, (c, metrics, bitmap)) in rasterized.iter().enumerate() {
            let col = index as u32 % columns;
            let row = index as u32 / columns;
            let origin_x = col * cell;
            let origin_y = row * cell;

            for y in 0..metrics.height {
                for x in 0..metrics.width {
                    let coverage = bitmap[y * metrics.width + x];
                    let px = origin_x as usize + x;
                    let py = origin_y as usize + y;
                    let offset = (py * atlas_w as usize + px) * 4;
                    rgba8[offset] = 255;
                    rgba8[offset + 1] = 255;
                    rgba8[offset + 2] = 255;
                    rgba8[offset + 3] = coverage;
                }
            }

            glyphs.push((
                *c,
                FontGlyphMetrics {
                    uv_x: origin_x,
                    uv_y: origin_y,
                    uv_w: metrics.width as u32,
                    uv_h: metrics.height as u32,
                    advance: metrics.advance_width,
                    bearing_x: metrics.xmin as f32,
                    bearing_y: metrics.ymin as f32,
                },
            ));
        }

        Ok(FontAtlas {
            width: atlas_w,
            height: atlas_h,
            rgba8,
            glyphs,
        })
    }

    /// Convenience over [`Self::bake`] for the common ASCII-printable set.
    pub fn bake_ascii(&self, font_bytes: &[u8]) -> anyhow::Result<FontAtlas> {
        self.bake(font_bytes, (0x20u8..=0x7eu8).map(|b| b as char))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bake_rejects_malformed_font_bytes() {
        let err = FontAtlasBuilder::new(16.0).bake(b"not a font", ['A']).unwrap_err();
        assert!(err.to_string().contains("failed to parse font"));
    }
}
