use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::{AtlasError, AtlasKind, AtlasPart, AtlasRegion, CapeLayout, SkinLayout, region_for};

/// Flat fill shown while a thumbnail has nothing real to draw.
pub const PLACEHOLDER_FILL: Rgba<u8> = Rgba([0x3c, 0x3c, 0x44, 0xff]);

/// Largest thumbnail edge. Bigger requests are clamped.
pub const MAX_THUMBNAIL_SIZE: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailPart {
    /// Head front with the hat layer composited on top.
    Head,
    /// Outer cape panel.
    CapeFront,
}

impl ThumbnailPart {
    /// Output size for a target edge of `size` pixels.
    ///
    /// Heads are square; capes keep their 10:16 panel aspect with `size` as the height.
    /// `size` is clamped to `1..=MAX_THUMBNAIL_SIZE`.
    pub fn output_dimensions(self, size: u32) -> [u32; 2] {
        let size = size.clamp(1, MAX_THUMBNAIL_SIZE);
        match self {
            Self::Head => [size, size],
            Self::CapeFront => [(size * 10 / 16).max(1), size],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailStatus {
    Loaded,
    NotLoaded,
}

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub image: RgbaImage,
    pub status: ThumbnailStatus,
}

impl Thumbnail {
    pub fn placeholder(part: ThumbnailPart, size: u32) -> Self {
        let [width, height] = part.output_dimensions(size);
        Self {
            image: RgbaImage::from_pixel(width, height, PLACEHOLDER_FILL),
            status: ThumbnailStatus::NotLoaded,
        }
    }

    /// Extracts `part`, falling back to the placeholder when the image is not a known atlas.
    pub fn from_source(source: &RgbaImage, part: ThumbnailPart, size: u32) -> Self {
        match extract_thumbnail(source, part, size) {
            Ok(image) => Self {
                image,
                status: ThumbnailStatus::Loaded,
            },
            Err(err) => {
                tracing::warn!("thumbnail extraction failed: {err}");
                Self::placeholder(part, size)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.status == ThumbnailStatus::Loaded
    }
}

/// Cuts a pixel-exact preview of `part` out of a decoded skin or cape.
///
/// Scaling is nearest-neighbour only. For heads the overlay layer (when the layout has one)
/// is alpha-composited over the base, so transparent hat pixels show the face beneath.
pub fn extract_thumbnail(
    source: &RgbaImage,
    part: ThumbnailPart,
    size: u32,
) -> Result<RgbaImage, AtlasError> {
    let (width, height) = source.dimensions();
    let [out_w, out_h] = part.output_dimensions(size);
    match part {
        ThumbnailPart::Head => {
            let layout = SkinLayout::detect(width, height)?;
            let kind = AtlasKind::Skin(layout);
            let mut out = scaled_region(source, region_for(AtlasPart::Head, kind)?, out_w, out_h);
            if layout.has_overlays() {
                let hat = scaled_region(
                    source,
                    region_for(AtlasPart::HeadOverlay, kind)?,
                    out_w,
                    out_h,
                );
                imageops::overlay(&mut out, &hat, 0, 0);
            }
            Ok(out)
        }
        ThumbnailPart::CapeFront => {
            let kind = AtlasKind::Cape(CapeLayout::detect(width, height)?);
            Ok(scaled_region(
                source,
                region_for(AtlasPart::Cape, kind)?,
                out_w,
                out_h,
            ))
        }
    }
}

fn scaled_region(source: &RgbaImage, region: AtlasRegion, width: u32, height: u32) -> RgbaImage {
    let cropped =
        imageops::crop_imm(source, region.x, region.y, region.width, region.height).to_image();
    imageops::resize(&cropped, width, height, FilterType::Nearest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACE: Rgba<u8> = Rgba([200, 150, 100, 255]);
    const HAT: Rgba<u8> = Rgba([10, 20, 30, 255]);

    fn modern_skin() -> RgbaImage {
        let mut img = RgbaImage::new(64, 64);
        for y in 8..16 {
            for x in 8..16 {
                img.put_pixel(x, y, FACE);
            }
        }
        // Hat covers only the top row of the face.
        for x in 40..48 {
            img.put_pixel(x, 8, HAT);
        }
        img
    }

    #[test]
    fn head_composites_hat_over_face() {
        let thumb = extract_thumbnail(&modern_skin(), ThumbnailPart::Head, 32).unwrap();
        assert_eq!(thumb.dimensions(), (32, 32));
        // One source pixel is a 4x4 block at this size.
        assert_eq!(*thumb.get_pixel(0, 0), HAT);
        assert_eq!(*thumb.get_pixel(31, 3), HAT);
        assert_eq!(*thumb.get_pixel(0, 4), FACE);
        assert_eq!(*thumb.get_pixel(31, 31), FACE);
    }

    #[test]
    fn extraction_is_repeatable() {
        let skin = modern_skin();
        let a = extract_thumbnail(&skin, ThumbnailPart::Head, 48).unwrap();
        let b = extract_thumbnail(&skin, ThumbnailPart::Head, 48).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn legacy_head_ignores_hat_area() {
        let mut skin = RgbaImage::new(64, 32);
        for y in 8..16 {
            for x in 8..16 {
                skin.put_pixel(x, y, FACE);
            }
        }
        skin.put_pixel(40, 8, HAT);
        let thumb = extract_thumbnail(&skin, ThumbnailPart::Head, 8).unwrap();
        assert!(thumb.pixels().all(|p| *p == FACE));
    }

    #[test]
    fn cape_front_skips_the_border() {
        let mut cape = RgbaImage::from_pixel(64, 32, Rgba([255, 0, 0, 255]));
        for y in 1..17 {
            for x in 1..11 {
                cape.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let thumb = extract_thumbnail(&cape, ThumbnailPart::CapeFront, 32).unwrap();
        assert_eq!(thumb.dimensions(), (20, 32));
        assert!(thumb.pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
    }

    #[test]
    fn huge_sizes_are_clamped() {
        assert_eq!(ThumbnailPart::CapeFront.output_dimensions(u32::MAX), [320, 512]);
        assert_eq!(ThumbnailPart::Head.output_dimensions(u32::MAX), [512, 512]);
        assert_eq!(ThumbnailPart::CapeFront.output_dimensions(0), [1, 1]);

        let thumb = Thumbnail::placeholder(ThumbnailPart::CapeFront, u32::MAX);
        assert_eq!(thumb.image.dimensions(), (320, 512));
    }

    #[test]
    fn unknown_image_falls_back_to_placeholder() {
        let odd = RgbaImage::new(30, 30);
        let thumb = Thumbnail::from_source(&odd, ThumbnailPart::Head, 16);
        assert_eq!(thumb.status, ThumbnailStatus::NotLoaded);
        assert!(thumb.image.pixels().all(|p| *p == PLACEHOLDER_FILL));
    }
}
