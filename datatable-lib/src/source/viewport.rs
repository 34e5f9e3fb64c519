//! Viewport without rendering

use std::ops::Range;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use super::ScrollAlign;
use super::Viewport;

/// A [`Viewport`] that tracks a scroll offset and a height in rows.
///
/// Stands in for the virtualized list when the table runs without a UI
/// (tests, the CLI driver). The height can change at any time, as a
/// container resize would.
///
/// # Example
///
/// ```
/// use datatable_lib::source::{HeadlessViewport, ScrollAlign, Viewport};
///
/// let viewport = HeadlessViewport::new(20);
/// viewport.scroll_to_index(25, ScrollAlign::Auto);
/// assert_eq!(viewport.visible_range(), 6..26);
/// ```
#[derive(Debug, Default)]
pub struct HeadlessViewport {
    offset: AtomicUsize,
    height: AtomicUsize,
}

impl HeadlessViewport {
    /// Creates a viewport showing `height` rows from the top.
    pub fn new(height: usize) -> Self {
        Self {
            offset: AtomicUsize::new(0),
            height: AtomicUsize::new(height),
        }
    }

    /// Returns the index of the first visible row.
    pub fn offset(&self) -> usize {
        self.offset.load(Ordering::SeqCst)
    }

    /// Scrolls to an absolute offset, as a scrollbar drag would.
    pub fn set_offset(&self, offset: usize) {
        self.offset.store(offset, Ordering::SeqCst);
    }

    /// Returns the height in rows.
    pub fn height(&self) -> usize {
        self.height.load(Ordering::SeqCst)
    }

    /// Changes the height in rows.
    pub fn set_height(&self, height: usize) {
        self.height.store(height, Ordering::SeqCst);
    }
}

impl Viewport for HeadlessViewport {
    fn visible_range(&self) -> Range<usize> {
        let offset = self.offset();
        offset..offset + self.height()
    }

    fn scroll_to_index(&self, index: usize, align: ScrollAlign) {
        let height = self.height().max(1);
        let offset = self.offset();

        let new_offset = match align {
            ScrollAlign::Start => index,
            ScrollAlign::Center => index.saturating_sub(height / 2),
            ScrollAlign::End => (index + 1).saturating_sub(height),
            ScrollAlign::Auto => {
                if index < offset {
                    index
                } else if index >= offset + height {
                    (index + 1).saturating_sub(height)
                } else {
                    offset
                }
            }
        };

        self.set_offset(new_offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_scroll_moves_minimum_distance() {
        let viewport = HeadlessViewport::new(10);

        viewport.scroll_to_index(5, ScrollAlign::Auto);
        assert_eq!(viewport.offset(), 0);

        viewport.scroll_to_index(10, ScrollAlign::Auto);
        assert_eq!(viewport.visible_range(), 1..11);

        viewport.scroll_to_index(0, ScrollAlign::Auto);
        assert_eq!(viewport.offset(), 0);
    }

    #[test]
    fn test_aligned_scroll() {
        let viewport = HeadlessViewport::new(10);

        viewport.scroll_to_index(50, ScrollAlign::Start);
        assert_eq!(viewport.offset(), 50);

        viewport.scroll_to_index(50, ScrollAlign::Center);
        assert_eq!(viewport.offset(), 45);

        viewport.scroll_to_index(50, ScrollAlign::End);
        assert_eq!(viewport.offset(), 41);
    }

    #[test]
    fn test_resize_changes_page_size() {
        let viewport = HeadlessViewport::new(10);
        viewport.set_height(25);
        assert_eq!(viewport.visible_row_count(), 25);
    }
}
