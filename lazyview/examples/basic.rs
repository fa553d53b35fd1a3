// Example: a million-row viewport, scrolling and rendering the visible window.
use lazyview::{Align, Item, Viewport, ViewportOptions};

fn main() {
    let items = (0..1_000_000u64).map(|i| Item::new(i, format!("row {i}")));
    let mut v = Viewport::new(ViewportOptions::new(80, 10).with_overscan(2), items)
        .expect("valid options and unique identities");

    println!("total_extent={}", v.total_extent());
    println!("visible_range={:?}", v.visible_range());

    let rows = v.render();
    println!("rendered={} first={:?}", rows.len(), rows.first().map(|r| r.content.text()));

    v.scroll_to_index(999_999, Align::End);
    println!(
        "after scroll_to_index: offset={} max={}",
        v.scroll_offset(),
        v.max_scroll_offset()
    );

    v.handle_wheel(-3.0);
    v.page_up();
    println!("after wheel + page_up: offset={}", v.scroll_offset());

    for event in v.drain_events() {
        println!("event: {event:?}");
    }

    let stats = v.cache_stats();
    println!(
        "cache: size={} capacity={} hit_rate={:.2}",
        stats.size,
        stats.capacity,
        stats.hit_rate()
    );
}
