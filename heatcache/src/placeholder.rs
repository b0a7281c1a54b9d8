//! Placeholder for tiles the provider has no data for.

/// Fully transparent 256×256 PNG (1-bit palette).
///
/// Cached in place of tiles the provider answers 404 for, so that they count
/// as present and are not requested again.
pub const EMPTY_TILE_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d,
    0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00,
    0x01, 0x03, 0x00, 0x00, 0x00, 0x66, 0xbc, 0x3a, 0x25, 0x00, 0x00, 0x00,
    0x03, 0x50, 0x4c, 0x54, 0x45, 0x00, 0x00, 0x00, 0xa7, 0x7a, 0x3d, 0xda,
    0x00, 0x00, 0x00, 0x01, 0x74, 0x52, 0x4e, 0x53, 0x00, 0x40, 0xe6, 0xd8,
    0x66, 0x00, 0x00, 0x00, 0x1f, 0x49, 0x44, 0x41, 0x54, 0x68, 0xde, 0xed,
    0xc1, 0x01, 0x0d, 0x00, 0x00, 0x00, 0xc2, 0x20, 0xfb, 0xa7, 0x36, 0xc7,
    0x37, 0x60, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x71, 0x07,
    0x21, 0x00, 0x00, 0x01, 0xa7, 0x57, 0x29, 0xd7, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_png() {
        assert_eq!(&EMPTY_TILE_PNG[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(&EMPTY_TILE_PNG[EMPTY_TILE_PNG.len() - 8..], b"IEND\xaeB`\x82");
    }

    #[test]
    fn test_placeholder_decodes_to_transparent_256() {
        let image = image::load_from_memory_with_format(EMPTY_TILE_PNG, image::ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(image.dimensions(), (256, 256));
        assert!(image.pixels().all(|p| p.0[3] == 0));
    }
}
