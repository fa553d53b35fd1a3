use core::cmp;

use crate::fenwick::Fenwick;
use crate::{Align, ViewportOptions, VisibleRange};

/// Scroll offset, extents and visible range arithmetic.
///
/// All offsets are in rows. An item occupies `height.max(1) * item_height` rows.
#[derive(Clone, Debug)]
pub(crate) struct ScrollController {
    offset: u64,
    viewport: u64,
    unit: u32,
    overscan: usize,
    virtual_scrolling: bool,
    sums: Fenwick,
    range: VisibleRange,
}

impl ScrollController {
    pub(crate) fn new(options: &ViewportOptions) -> Self {
        Self {
            offset: 0,
            viewport: options.height as u64,
            unit: options.item_height.max(1),
            overscan: options.overscan_count,
            virtual_scrolling: options.virtual_scrolling,
            sums: Fenwick::default(),
            range: VisibleRange::EMPTY,
        }
    }

    /// Rebuilds extents from per-item heights (in logical rows) and recomputes the range.
    pub(crate) fn rebuild(&mut self, heights: impl IntoIterator<Item = u32>) {
        let unit = self.unit as u64;
        self.sums = Fenwick::from_extents(heights.into_iter().map(|h| h.max(1) as u64 * unit));
        self.range = self.compute_range(self.offset);
    }

    pub(crate) fn count(&self) -> usize {
        self.sums.len()
    }

    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    pub(crate) fn viewport_extent(&self) -> u64 {
        self.viewport
    }

    pub(crate) fn range(&self) -> VisibleRange {
        self.range
    }

    pub(crate) fn total_extent(&self) -> u64 {
        self.sums.total()
    }

    pub(crate) fn max_offset(&self) -> u64 {
        self.total_extent().saturating_sub(self.viewport)
    }

    pub(crate) fn clamp(&self, offset: u64) -> u64 {
        offset.min(self.max_offset())
    }

    /// Clamps and applies `target`. Returns the new offset if it changed.
    ///
    /// The visible range is recomputed on every call, so callers can rely on it being fresh
    /// even when the offset is unchanged.
    pub(crate) fn scroll_to(&mut self, target: u64) -> Option<u64> {
        let clamped = self.clamp(target);
        let changed = clamped != self.offset;
        self.offset = clamped;
        self.range = self.compute_range(clamped);
        changed.then_some(clamped)
    }

    /// Re-applies the current offset after extents or the viewport changed.
    pub(crate) fn reclamp(&mut self) -> Option<u64> {
        self.scroll_to(self.offset)
    }

    pub(crate) fn set_viewport(&mut self, extent: u64) {
        self.viewport = extent;
    }

    pub(crate) fn set_overscan(&mut self, overscan: usize) {
        self.overscan = overscan;
        self.range = self.compute_range(self.offset);
    }

    /// Offset reached by moving `lines` lines (each `unit` rows) from the current offset.
    pub(crate) fn offset_by_lines(&self, lines: i64) -> u64 {
        let rows = lines.unsigned_abs().saturating_mul(self.unit as u64);
        if lines >= 0 {
            self.offset.saturating_add(rows)
        } else {
            self.offset.saturating_sub(rows)
        }
    }

    pub(crate) fn page_lines(&self) -> u64 {
        self.viewport / self.unit as u64
    }

    pub(crate) fn item_start(&self, index: usize) -> Option<u64> {
        (index < self.count()).then(|| self.sums.prefix_sum(index))
    }

    pub(crate) fn item_extent(&self, index: usize) -> Option<u64> {
        let start = self.item_start(index)?;
        Some(self.sums.prefix_sum(index + 1) - start)
    }

    /// Row index covering `offset`, clamped to the last item.
    pub(crate) fn index_at_offset(&self, offset: u64) -> Option<usize> {
        let count = self.count();
        if count == 0 {
            return None;
        }
        Some(self.sums.lower_bound(offset).min(count - 1))
    }

    /// The (clamped) offset that brings `index` into view with `align`.
    pub(crate) fn offset_for_index(&self, index: usize, align: Align) -> Option<u64> {
        let start = self.item_start(index)?;
        let end = start.saturating_add(self.item_extent(index)?);
        let view = self.viewport;
        let target = match align {
            Align::Start => start,
            Align::End => end.saturating_sub(view),
            Align::Center => {
                let center = start.saturating_add((end - start) / 2);
                center.saturating_sub(view / 2)
            }
            Align::Auto => {
                let cur = self.offset;
                let cur_end = cur.saturating_add(view);
                if start >= cur && end <= cur_end {
                    cur
                } else if start < cur || end - start > view {
                    start
                } else {
                    end.saturating_sub(view)
                }
            }
        };
        Some(self.clamp(target))
    }

    /// Rows strictly required to cover `[offset, offset + viewport)`, without overscan.
    pub(crate) fn rows_in_view(&self, offset: u64) -> VisibleRange {
        let count = self.count();
        if count == 0 || self.viewport == 0 {
            return VisibleRange::EMPTY;
        }
        let offset = self.clamp(offset);
        let last = offset.saturating_add(self.viewport - 1);
        let start = self.sums.lower_bound(offset).min(count - 1);
        let end = (self.sums.lower_bound(last) + 1).min(count);
        VisibleRange::new(start, end)
    }

    fn compute_range(&self, offset: u64) -> VisibleRange {
        let count = self.count();
        if !self.virtual_scrolling {
            return VisibleRange::new(0, count);
        }
        let rows = self.rows_in_view(offset);
        if rows.is_empty() {
            return rows;
        }
        VisibleRange::new(
            rows.start.saturating_sub(self.overscan),
            cmp::min(count, rows.end.saturating_add(self.overscan)),
        )
    }
}
