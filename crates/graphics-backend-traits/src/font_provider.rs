/// A single glyph's placement inside a font atlas texture: its uv rect in
/// atlas pixel space plus the metrics `draw-text` needs to lay out the next
/// glyph (advance, bearing).
#[derive(Debug, Clone, Copy)]
pub struct FontGlyphMetrics {
    pub uv_x: u32,
    pub uv_y: u32,
    pub uv_w: u32,
    pub uv_h: u32,
    pub advance: f32,
    pub bearing_x: f32,
    pub bearing_y: f32,
}

/// A pre-baked font atlas (spec.md §6 "From Font atlas"): one RGBA8 texture
/// plus a per-glyph metrics table, produced by `font` via `fontdue`. The URC
/// consumes the decoded pixels exactly like any other `DecodedImage` and
/// keeps the metrics table alongside the resulting texture handle to
/// service `draw-text` packets.
#[derive(Debug, Clone)]
pub struct FontAtlas {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
    pub glyphs: Vec<(char, FontGlyphMetrics)>,
}

impl FontAtlas {
    pub fn glyph(&self, c: char) -> Option<FontGlyphMetrics> {
        self.glyphs
            .iter()
            .find(|(glyph_char, _)| *glyph_char == c)
            .map(|(_, metrics)| *metrics)
    }
}
