//! Dirty rectangles and the pixel regions handed to the flush bridge
//!
//! Coordinates are inclusive on both ends, so a single pixel at (3, 4) is
//! `Area::new(3, 4, 3, 4)`. Pixel data is RGB565, two bytes per pixel,
//! big-endian, row-major with no padding between rows.

use heapless::Vec;

/// Bytes per RGB565 pixel
pub const BYTES_PER_PIXEL: usize = 2;

/// Inclusive pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Area {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl Area {
    /// Create an area from two corners in any order
    pub const fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> Self {
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (y1, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self { x1, y1, x2, y2 }
    }

    /// The whole panel surface
    ///
    /// `width` and `height` must be non-zero.
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, 0, width.saturating_sub(1), height.saturating_sub(1))
    }

    /// Horizontal rows `y1..=y2` spanning the full panel width
    pub const fn rows(width: u16, y1: u16, y2: u16) -> Self {
        Self::new(0, y1, width.saturating_sub(1), y2)
    }

    pub const fn width(&self) -> u16 {
        self.x2 - self.x1 + 1
    }

    pub const fn height(&self) -> u16 {
        self.y2 - self.y1 + 1
    }

    /// Number of pixels covered
    pub const fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Size of the pixel buffer needed to cover this area
    pub const fn byte_len(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    /// Check if `other` lies entirely inside this area
    pub const fn contains(&self, other: &Area) -> bool {
        other.x1 >= self.x1 && other.x2 <= self.x2 && other.y1 >= self.y1 && other.y2 <= self.y2
    }

    /// Check if the two areas overlap or share an edge
    ///
    /// Touching areas are merged by the invalidation queue because their
    /// bounding box covers no extra pixels along the shared edge.
    pub fn touches(&self, other: &Area) -> bool {
        let x_gap = self.x1 > other.x2.saturating_add(1) || other.x1 > self.x2.saturating_add(1);
        let y_gap = self.y1 > other.y2.saturating_add(1) || other.y1 > self.y2.saturating_add(1);
        !x_gap && !y_gap
    }

    /// Smallest area covering both
    pub fn union(&self, other: &Area) -> Area {
        Area {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Clip to `bounds`, or `None` if nothing remains
    pub fn clip(&self, bounds: &Area) -> Option<Area> {
        let x1 = self.x1.max(bounds.x1);
        let y1 = self.y1.max(bounds.y1);
        let x2 = self.x2.min(bounds.x2);
        let y2 = self.y2.min(bounds.y2);
        if x1 > x2 || y1 > y2 {
            None
        } else {
            Some(Area { x1, y1, x2, y2 })
        }
    }
}

/// Reasons a region cannot be handed to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegionError {
    /// Area extends past the panel edge
    OutOfBounds,
    /// Pixel buffer does not match the area size
    BufferSize { expected: usize, actual: usize },
}

/// One dirty rectangle plus the pixels to put there
///
/// Consumed exactly once by the flush bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRegion<'a> {
    area: Area,
    pixels: &'a [u8],
}

impl<'a> DirtyRegion<'a> {
    /// Create a region, checking it against the panel bounds
    pub fn new(area: Area, pixels: &'a [u8], bounds: &Area) -> Result<Self, RegionError> {
        if !bounds.contains(&area) {
            return Err(RegionError::OutOfBounds);
        }
        if pixels.len() != area.byte_len() {
            return Err(RegionError::BufferSize {
                expected: area.byte_len(),
                actual: pixels.len(),
            });
        }
        Ok(Self { area, pixels })
    }

    pub fn area(&self) -> Area {
        self.area
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }
}

/// Pending invalidations waiting for the next render cycle
///
/// Overlapping or touching areas are merged on insert. When the queue is
/// full everything collapses into a single bounding box, so invalidation
/// never fails and never loses coverage. `N` must be at least 1.
#[derive(Debug, Clone, Default)]
pub struct DirtyAreas<const N: usize> {
    areas: Vec<Area, N>,
}

impl<const N: usize> DirtyAreas<N> {
    pub const fn new() -> Self {
        Self { areas: Vec::new() }
    }

    /// Record a dirty area, coalescing with what is already pending
    pub fn push(&mut self, area: Area) {
        let mut merged = area;

        // Merging can make the box touch areas it missed before, so repeat
        while let Some(i) = self.areas.iter().position(|a| a.touches(&merged)) {
            merged = merged.union(&self.areas.swap_remove(i));
        }

        if let Err(overflow) = self.areas.push(merged) {
            let bounding = self
                .areas
                .iter()
                .fold(overflow, |acc, a| acc.union(a));
            self.areas.clear();
            let _ = self.areas.push(bounding);
        }
    }

    /// Take the oldest pending area
    pub fn pop(&mut self) -> Option<Area> {
        if self.areas.is_empty() {
            None
        } else {
            Some(self.areas.remove(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter()
    }

    pub fn clear(&mut self) {
        self.areas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_normalizes_corners() {
        let area = Area::new(10, 20, 0, 5);
        assert_eq!(area, Area::new(0, 5, 10, 20));
        assert_eq!(area.width(), 11);
        assert_eq!(area.height(), 16);
        assert_eq!(area.pixel_count(), 176);
        assert_eq!(area.byte_len(), 352);
    }

    #[test]
    fn test_full_panel() {
        let full = Area::full(320, 480);
        assert_eq!(full, Area::new(0, 0, 319, 479));
        assert_eq!(full.pixel_count(), 320 * 480);
    }

    #[test]
    fn test_touches() {
        let a = Area::new(0, 0, 9, 9);
        assert!(a.touches(&Area::new(5, 5, 15, 15))); // overlap
        assert!(a.touches(&Area::new(10, 0, 20, 9))); // shared edge
        assert!(!a.touches(&Area::new(11, 0, 20, 9))); // one pixel gap
        assert!(!a.touches(&Area::new(0, 20, 9, 30)));
    }

    #[test]
    fn test_clip() {
        let bounds = Area::full(320, 480);
        assert_eq!(
            Area::new(300, 470, 400, 500).clip(&bounds),
            Some(Area::new(300, 470, 319, 479))
        );
        assert_eq!(Area::new(320, 0, 400, 10).clip(&bounds), None);
    }

    #[test]
    fn test_region_checks_bounds() {
        let bounds = Area::full(320, 480);
        let pixels = [0u8; 8];

        let ok = DirtyRegion::new(Area::new(0, 0, 1, 1), &pixels, &bounds);
        assert!(ok.is_ok());

        let outside = DirtyRegion::new(Area::new(319, 479, 320, 480), &pixels, &bounds);
        assert_eq!(outside, Err(RegionError::OutOfBounds));
    }

    #[test]
    fn test_region_checks_buffer_size() {
        let bounds = Area::full(320, 480);
        let pixels = [0u8; 6];
        let result = DirtyRegion::new(Area::new(0, 0, 1, 1), &pixels, &bounds);
        assert_eq!(
            result,
            Err(RegionError::BufferSize {
                expected: 8,
                actual: 6
            })
        );
    }

    #[test]
    fn test_dirty_areas_merge_overlapping() {
        let mut dirty: DirtyAreas<4> = DirtyAreas::new();
        dirty.push(Area::new(0, 0, 9, 9));
        dirty.push(Area::new(5, 5, 20, 20));
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty.pop(), Some(Area::new(0, 0, 20, 20)));
        assert!(dirty.is_empty());
    }

    #[test]
    fn test_dirty_areas_keep_disjoint() {
        let mut dirty: DirtyAreas<4> = DirtyAreas::new();
        dirty.push(Area::new(0, 0, 9, 9));
        dirty.push(Area::new(100, 100, 109, 109));
        assert_eq!(dirty.len(), 2);
        assert_eq!(dirty.pop(), Some(Area::new(0, 0, 9, 9)));
        assert_eq!(dirty.pop(), Some(Area::new(100, 100, 109, 109)));
        assert_eq!(dirty.pop(), None);
    }

    #[test]
    fn test_dirty_areas_chain_merge() {
        // The third area bridges the first two
        let mut dirty: DirtyAreas<4> = DirtyAreas::new();
        dirty.push(Area::new(0, 0, 9, 9));
        dirty.push(Area::new(20, 0, 29, 9));
        dirty.push(Area::new(8, 0, 21, 9));
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty.pop(), Some(Area::new(0, 0, 29, 9)));
    }

    #[test]
    fn test_dirty_areas_collapse_when_full() {
        let mut dirty: DirtyAreas<2> = DirtyAreas::new();
        dirty.push(Area::new(0, 0, 1, 1));
        dirty.push(Area::new(10, 10, 11, 11));
        dirty.push(Area::new(20, 20, 21, 21));
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty.pop(), Some(Area::new(0, 0, 21, 21)));
    }
}
