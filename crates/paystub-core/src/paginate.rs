//! Split one tall bitmap into page-sized horizontal slices
//!
//! The source is always scaled so its width fills the page; the same scale
//! applies to every page. Each page then shows as many whole source rows as
//! fit in the page height, top to bottom.

use crate::types::*;

/// Split a `source_width`×`source_height` pixel bitmap across pages of
/// `page_width`×`page_height` points.
///
/// Descriptors come back in page order, which is also strictly increasing
/// source order, and their slices cover every source row exactly once.
pub fn paginate(
    source_width: u32,
    source_height: u32,
    page_width: f32,
    page_height: f32,
) -> Result<Vec<PageDescriptor>> {
    let plan = SlicePlan::new(source_width, source_height, page_width, page_height)?;
    Ok(plan.pages().collect())
}

/// Describe the split `paginate` would produce without building the pages
pub fn pagination_statistics(
    source_width: u32,
    source_height: u32,
    page_width: f32,
    page_height: f32,
) -> Result<PaginationStatistics> {
    let plan = SlicePlan::new(source_width, source_height, page_width, page_height)?;
    let page_count = plan.page_count();
    let last_slice_height = plan.source_height - (page_count as u32 - 1) * plan.slice_height_px;

    Ok(PaginationStatistics {
        scale: plan.scale,
        slice_height_px: plan.slice_height_px,
        page_count,
        last_slice_height,
        single_page: page_count == 1,
    })
}

#[derive(Debug, Clone, Copy)]
struct SlicePlan {
    source_height: u32,
    page_width: f32,
    scale: f64,
    /// Always at least 1, which guarantees the walk terminates
    slice_height_px: u32,
}

impl SlicePlan {
    fn new(source_width: u32, source_height: u32, page_width: f32, page_height: f32) -> Result<Self> {
        let page_ok = |v: f32| v.is_finite() && v > 0.0;
        if source_width == 0 || source_height == 0 || !page_ok(page_width) || !page_ok(page_height)
        {
            return Err(StubError::InvalidDimensions {
                source_width,
                source_height,
                page_width,
                page_height,
            });
        }

        let scale = f64::from(page_width) / f64::from(source_width);
        let scaled_height = f64::from(source_height) * f64::from(page_width) / f64::from(source_width);

        let slice_height_px = if scaled_height <= f64::from(page_height) {
            source_height
        } else {
            let rows = (f64::from(page_height) / scale).floor();
            if rows < 1.0 {
                // A single source row is taller than the page; emit one oversized page
                log::warn!(
                    "page height {page_height}pt holds no whole source row at scale {scale}, using one page"
                );
                source_height
            } else {
                (rows as u32).min(source_height)
            }
        };

        Ok(Self {
            source_height,
            page_width,
            scale,
            slice_height_px,
        })
    }

    fn page_count(&self) -> usize {
        self.source_height.div_ceil(self.slice_height_px) as usize
    }

    fn pages(self) -> Pages {
        Pages {
            plan: self,
            next_offset: 0,
            page_index: 0,
        }
    }
}

struct Pages {
    plan: SlicePlan,
    next_offset: u32,
    page_index: usize,
}

impl Iterator for Pages {
    type Item = PageDescriptor;

    fn next(&mut self) -> Option<PageDescriptor> {
        if self.next_offset >= self.plan.source_height {
            return None;
        }

        let remaining = self.plan.source_height - self.next_offset;
        let slice_height = self.plan.slice_height_px.min(remaining);
        let descriptor = PageDescriptor {
            page_index: self.page_index,
            source_offset: self.next_offset,
            slice_height,
            target_width: self.plan.page_width,
            target_height: (f64::from(slice_height) * self.plan.scale) as f32,
        };

        self.next_offset += slice_height;
        self.page_index += 1;
        Some(descriptor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.plan.page_count()).saturating_sub(self.page_index);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_source_is_one_page_at_the_top() {
        let pages = paginate(1000, 600, 600.0, 800.0).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].source_offset, 0);
        assert_eq!(pages[0].slice_height, 600);
        assert!((pages[0].target_height - 360.0).abs() < 1e-3);
    }

    #[test]
    fn test_exact_fit_stays_on_one_page() {
        // 1000 × 0.6 = 600 scaled rows on a 600pt page
        let pages = paginate(1000, 1000, 600.0, 600.0).unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_taller_source_splits_with_short_tail() {
        let pages = paginate(1000, 1400, 600.0, 800.0).unwrap();
        // floor(800 / 0.6) = 1333 rows per page
        assert_eq!(pages.len(), 2);
        assert_eq!((pages[0].source_offset, pages[0].slice_height), (0, 1333));
        assert_eq!((pages[1].source_offset, pages[1].slice_height), (1333, 67));
        assert!((pages[1].target_height - 40.2).abs() < 1e-3);
    }

    #[test]
    fn test_statistics_match_pages() {
        let stats = pagination_statistics(1000, 1400, 600.0, 800.0).unwrap();
        assert_eq!(stats.slice_height_px, 1333);
        assert_eq!(stats.page_count, 2);
        assert_eq!(stats.last_slice_height, 67);
        assert!(!stats.single_page);
        assert!((stats.scale - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_size_hint_is_exact() {
        let plan = SlicePlan::new(800, 5000, 595.28, 841.89).unwrap();
        let pages = plan.pages();
        let (lower, upper) = pages.size_hint();
        assert_eq!(Some(lower), upper);
        assert_eq!(lower, pages.count());
    }
}
