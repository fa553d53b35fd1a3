use lazyview::{Align, Item, ScrollMode, Viewport, ViewportOptions};
use lazyview_adapter::{Controller, Easing};

fn main() {
    // Example: smooth scrolling driven by a host frame clock.
    //
    // The viewport's offset jumps immediately (ranges, loads and events follow the target);
    // the controller only animates the offset the host paints with.
    let items = (0..10_000u64).map(|i| Item::new(i, format!("row {i}")));
    let opts = ViewportOptions::new(80, 20).with_scroll_mode(ScrollMode::Smooth);
    let v = Viewport::new(opts, items).expect("valid viewport");
    let mut c = Controller::new(v).with_animation(120, Easing::EaseInOutCubic);

    let mut now_ms = 0u64;
    c.scroll_to_index(2_000, Align::Start, now_ms);
    println!(
        "target offset={} display={}",
        c.viewport().scroll_offset(),
        c.display_offset()
    );

    while c.is_animating() {
        now_ms += 16;
        if let Some(display) = c.tick(now_ms) {
            println!("t={now_ms}ms display_offset={display}");
        }
        // Retarget halfway through; the animation continues from where it is.
        if now_ms == 48 {
            c.scroll_to_index(2_500, Align::Center, now_ms);
            println!("retarget -> {}", c.viewport().scroll_offset());
        }
    }

    println!(
        "done: offset={} display={}",
        c.viewport().scroll_offset(),
        c.display_offset()
    );
}
