use lazyview::{Item, Viewport, ViewportOptions};
use lazyview_adapter::{Controller, ScrollAnchor};

fn main() {
    // Example: keep the same message on screen while older history is prepended
    // (chat/timeline "load more" above the fold).
    //
    // 1) capture an anchor (identity + offset inside the item) before the data changes
    // 2) replace the items
    // 3) re-apply the anchor so the identity sits at the same place again
    let messages = (0..100u64).map(|i| Item::new(1000 + i, format!("message {i}")));
    let v = Viewport::new(ViewportOptions::new(80, 10), messages).expect("valid viewport");
    let mut c = Controller::new(v);
    c.viewport_mut().scroll_to(50);

    let anchor = c.capture_anchor().expect("visible range must not be empty");
    println!(
        "before prepend: off={} anchor={anchor:?}",
        c.viewport().scroll_offset()
    );

    let older = (0..10u64).map(|i| Item::new(2000 + i, format!("older {i}")));
    let current: Vec<Item> = c.viewport().items().cloned().collect();
    let applied = c
        .set_items_anchored(older.chain(current))
        .expect("identities stay unique");

    println!(
        "after prepend: applied={applied} off={} first_visible={:?}",
        c.viewport().scroll_offset(),
        ScrollAnchor::capture(c.viewport()).map(|a| a.identity)
    );
}
