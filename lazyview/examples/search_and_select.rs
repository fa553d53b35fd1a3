// Example: keyboard navigation, multi-selection and search over a log view.
use lazyview::{
    Item, Key, KeyPress, SearchMatcher, SelectionMode, Viewport, ViewportEvent, ViewportOptions,
};

fn main() {
    let lines = (0..200u64).map(|i| {
        let level = if i % 17 == 0 { "ERROR" } else { "INFO" };
        Item::new(i, format!("{level} request {i} served"))
    });
    let opts = ViewportOptions::new(80, 12).with_selection_mode(SelectionMode::Multiple);
    let mut v = Viewport::new(opts, lines).expect("valid viewport");

    v.handle_key(Key::Down);
    v.handle_key(Key::Down);
    v.handle_key(Key::Space);
    v.handle_key(KeyPress::new(Key::Down).with_shift());
    v.handle_key(KeyPress::new(Key::Down).with_shift());
    println!("selected={:?} anchor={:?}", v.selected(), v.selection_anchor());

    let hits = v.search("error");
    println!("substring hits={hits} current={:?}", v.current_match());
    v.handle_key(Key::Char('n'));
    v.handle_key(Key::Char('n'));
    println!("after n n: current={:?} offset={}", v.current_match(), v.scroll_offset());

    v.set_matcher(SearchMatcher::Token);
    let hits = v.search("request served");
    println!("token hits={hits}");

    for row in v.render().iter().filter(|r| r.search_match || r.selected) {
        println!(
            "{:>3} sel={} match={} {}",
            row.index,
            row.selected,
            row.search_match,
            row.content.text()
        );
    }

    v.handle_key(Key::Escape);
    v.handle_key(Key::Escape);
    for event in v.drain_events() {
        if let ViewportEvent::SelectionChanged { selected } = event {
            println!("selection -> {selected:?}");
        }
    }
}
