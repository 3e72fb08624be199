use crate::{AtlasError, AtlasKind, CapeLayout, SkinLayout};

/// A rectangle in source-texture pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRegion {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn fits_within(&self, [width, height]: [u32; 2]) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// Named parts of the skin and cape atlases.
///
/// `Cape` resolves to the whole cape box; its region is the front panel used for flat previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtlasPart {
    Head,
    HeadOverlay,
    Torso,
    TorsoOverlay,
    ArmRight,
    ArmRightOverlay,
    ArmLeft,
    ArmLeftOverlay,
    LegRight,
    LegRightOverlay,
    LegLeft,
    LegLeftOverlay,
    Cape,
}

impl AtlasPart {
    pub const fn is_overlay(self) -> bool {
        matches!(
            self,
            Self::HeadOverlay
                | Self::TorsoOverlay
                | Self::ArmRightOverlay
                | Self::ArmLeftOverlay
                | Self::LegRightOverlay
                | Self::LegLeftOverlay
        )
    }

    pub const fn is_arm(self) -> bool {
        matches!(
            self,
            Self::ArmRight | Self::ArmRightOverlay | Self::ArmLeft | Self::ArmLeftOverlay
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxFace {
    Top,
    Bottom,
    /// +X in model space.
    East,
    /// -X in model space.
    West,
    /// -Z in model space, the side the player faces.
    North,
    /// +Z in model space.
    South,
}

/// Vanilla `ModelBox` unwrap: a `width x height x depth` box laid out from `(u, v)`.
///
/// ```text
///        d     w     w
///     +-----+-----+-----+
///   d |     | top | bot |
///     +-----+-----+-----+-----+
///   h |  W  |  N  |  E  |  S  |
///     +-----+-----+-----+-----+
///        d     w     d     w
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartBox {
    pub u: u32,
    pub v: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl PartBox {
    pub const fn new(u: u32, v: u32, width: u32, height: u32, depth: u32) -> Self {
        Self {
            u,
            v,
            width,
            height,
            depth,
        }
    }

    /// Same box origin with a narrower (or wider) front face.
    pub const fn with_width(self, width: u32) -> Self {
        Self { width, ..self }
    }

    pub const fn face(&self, face: BoxFace) -> AtlasRegion {
        let Self {
            u,
            v,
            width: w,
            height: h,
            depth: d,
        } = *self;
        match face {
            BoxFace::Top => AtlasRegion::new(u + d, v, w, d),
            BoxFace::Bottom => AtlasRegion::new(u + d + w, v, w, d),
            BoxFace::West => AtlasRegion::new(u, v + d, d, h),
            BoxFace::North => AtlasRegion::new(u + d, v + d, w, h),
            BoxFace::East => AtlasRegion::new(u + d + w, v + d, d, h),
            BoxFace::South => AtlasRegion::new(u + d + w + d, v + d, w, h),
        }
    }

    pub const fn front(&self) -> AtlasRegion {
        self.face(BoxFace::North)
    }

    pub const fn back(&self) -> AtlasRegion {
        self.face(BoxFace::South)
    }

    /// Bounding rectangle of the whole unwrap.
    pub const fn footprint(&self) -> AtlasRegion {
        AtlasRegion::new(
            self.u,
            self.v,
            2 * (self.width + self.depth),
            self.depth + self.height,
        )
    }
}

/// A box after alias resolution. `mirrored` boxes are sampled right-to-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedBox {
    pub part_box: PartBox,
    pub mirrored: bool,
}

#[derive(Debug, Clone, Copy)]
enum BoxEntry {
    Box(PartBox),
    /// Borrow another part's pixels, flipped horizontally.
    Mirror(AtlasPart),
    Absent,
}

const fn b(u: u32, v: u32, w: u32, h: u32, d: u32) -> BoxEntry {
    BoxEntry::Box(PartBox::new(u, v, w, h, d))
}

type RegionTable = [(AtlasPart, BoxEntry)];

// Arm boxes are stored at the classic width; slim narrows them via `PartBox::with_width`.
static MODERN_SKIN: [(AtlasPart, BoxEntry); 12] = [
    (AtlasPart::Head, b(0, 0, 8, 8, 8)),
    (AtlasPart::HeadOverlay, b(32, 0, 8, 8, 8)),
    (AtlasPart::Torso, b(16, 16, 8, 12, 4)),
    (AtlasPart::TorsoOverlay, b(16, 32, 8, 12, 4)),
    (AtlasPart::ArmRight, b(40, 16, 4, 12, 4)),
    (AtlasPart::ArmRightOverlay, b(40, 32, 4, 12, 4)),
    (AtlasPart::ArmLeft, b(32, 48, 4, 12, 4)),
    (AtlasPart::ArmLeftOverlay, b(48, 48, 4, 12, 4)),
    (AtlasPart::LegRight, b(0, 16, 4, 12, 4)),
    (AtlasPart::LegRightOverlay, b(0, 32, 4, 12, 4)),
    (AtlasPart::LegLeft, b(16, 48, 4, 12, 4)),
    (AtlasPart::LegLeftOverlay, b(0, 48, 4, 12, 4)),
];

static LEGACY_SKIN: [(AtlasPart, BoxEntry); 12] = [
    (AtlasPart::Head, b(0, 0, 8, 8, 8)),
    (AtlasPart::HeadOverlay, BoxEntry::Absent),
    (AtlasPart::Torso, b(16, 16, 8, 12, 4)),
    (AtlasPart::TorsoOverlay, BoxEntry::Absent),
    (AtlasPart::ArmRight, b(40, 16, 4, 12, 4)),
    (AtlasPart::ArmRightOverlay, BoxEntry::Absent),
    (AtlasPart::ArmLeft, BoxEntry::Mirror(AtlasPart::ArmRight)),
    (AtlasPart::ArmLeftOverlay, BoxEntry::Absent),
    (AtlasPart::LegRight, b(0, 16, 4, 12, 4)),
    (AtlasPart::LegRightOverlay, BoxEntry::Absent),
    (AtlasPart::LegLeft, BoxEntry::Mirror(AtlasPart::LegRight)),
    (AtlasPart::LegLeftOverlay, BoxEntry::Absent),
];

// Both cape templates share offsets; the legacy image is just cropped to the box.
static CAPE: [(AtlasPart, BoxEntry); 1] = [(AtlasPart::Cape, b(0, 0, 10, 16, 1))];

fn table(kind: AtlasKind) -> &'static RegionTable {
    match kind {
        AtlasKind::Skin(SkinLayout::Modern) => &MODERN_SKIN,
        AtlasKind::Skin(SkinLayout::Legacy) => &LEGACY_SKIN,
        AtlasKind::Cape(CapeLayout::Modern | CapeLayout::Legacy) => &CAPE,
    }
}

fn lookup(part: AtlasPart, kind: AtlasKind) -> Result<BoxEntry, AtlasError> {
    table(kind)
        .iter()
        .find(|(p, _)| *p == part)
        .map(|(_, entry)| *entry)
        .ok_or(AtlasError::PartMismatch { part, kind })
}

/// Resolves the box unwrap for `part`, following mirror aliases.
pub fn resolve_box(part: AtlasPart, kind: AtlasKind) -> Result<ResolvedBox, AtlasError> {
    match lookup(part, kind)? {
        BoxEntry::Box(part_box) => Ok(ResolvedBox {
            part_box,
            mirrored: false,
        }),
        BoxEntry::Mirror(source) => match lookup(source, kind)? {
            BoxEntry::Box(part_box) => Ok(ResolvedBox {
                part_box,
                mirrored: true,
            }),
            // Aliases are one level deep.
            BoxEntry::Mirror(_) | BoxEntry::Absent => {
                Err(AtlasError::MissingRegion { part, kind })
            }
        },
        BoxEntry::Absent => Err(AtlasError::MissingRegion { part, kind }),
    }
}

/// Front-face region of `part`. Arms are reported at classic width.
pub fn region_for(part: AtlasPart, kind: AtlasKind) -> Result<AtlasRegion, AtlasError> {
    resolve_box(part, kind).map(|resolved| resolved.part_box.front())
}

/// Every part the given layout can resolve, in table order.
pub fn parts_for(kind: AtlasKind) -> impl Iterator<Item = AtlasPart> {
    table(kind)
        .iter()
        .filter(|(_, entry)| !matches!(entry, BoxEntry::Absent))
        .map(|(part, _)| *part)
}
