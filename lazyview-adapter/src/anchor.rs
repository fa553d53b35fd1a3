use lazyview::{Item, Viewport, ViewportError, ViewportKey};

/// Pins the viewport to an item identity across content replacement.
///
/// Typical use: a timeline prepends older entries above the fold and the rows the user is
/// looking at must not move.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollAnchor<K> {
    pub identity: K,
    /// Distance from the anchor item's start to the scroll offset, in rows.
    pub offset_in_item: u64,
}

impl<K: ViewportKey> ScrollAnchor<K> {
    /// Anchors the first row in view. `None` for an empty viewport.
    pub fn capture(viewport: &Viewport<K>) -> Option<Self> {
        let rows = viewport.visible_rows();
        if rows.is_empty() {
            return None;
        }
        let start = viewport.item_offset(rows.start)?;
        let identity = viewport.item_at(rows.start)?.identity.clone();
        Some(Self {
            identity,
            offset_in_item: viewport.scroll_offset().saturating_sub(start),
        })
    }

    /// Scrolls so the anchor item sits where it was captured (clamped).
    ///
    /// Returns `false` if the identity is gone.
    pub fn apply(&self, viewport: &mut Viewport<K>) -> bool {
        let Some(index) = viewport.index_of(&self.identity) else {
            return false;
        };
        let Some(start) = viewport.item_offset(index) else {
            return false;
        };
        viewport.scroll_to(start.saturating_add(self.offset_in_item));
        true
    }
}

/// [`Viewport::set_items`] that keeps the first visible item in place.
///
/// Returns whether an anchor was captured and re-applied.
pub fn set_items_anchored<K: ViewportKey>(
    viewport: &mut Viewport<K>,
    items: impl IntoIterator<Item = Item<K>>,
) -> Result<bool, ViewportError> {
    let anchor = ScrollAnchor::capture(viewport);
    viewport.set_items(items)?;
    Ok(anchor.is_some_and(|a| a.apply(viewport)))
}
