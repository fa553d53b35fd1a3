use lazyview::{Item, Key, LoadError, SelectionMode, Viewport, ViewportOptions};
use lazyview_adapter::{Dispatcher, install_search};

fn main() {
    // Example: a host that prefers callbacks over draining events.
    let placeholders = (0..1_000u64).map(|i| Item::new(i, ""));
    let opts = ViewportOptions::new(80, 10)
        .with_lazy_loading(true)
        .with_selection_mode(SelectionMode::Multiple);
    let mut v = Viewport::new(opts, placeholders).expect("valid viewport");

    let mut dispatcher = Dispatcher::<u64>::new()
        .with_on_lazy_load(|req| {
            if req.start > 900 {
                return Err(LoadError::new("page out of range"));
            }
            Ok(req
                .identities
                .iter()
                .map(|&id| Item::new(id, format!("entry {id}")))
                .collect())
        })
        .with_on_scroll(|s, _| println!("scrolled to {}/{}", s.offset, s.max_offset))
        .with_on_selection_change(|sel, _| println!("selection: {sel:?}"))
        .with_on_item_activate(|id, item, _| println!("activated {id}: {}", item.content))
        .with_on_load_error(|ids, reason, _| println!("{} items failed: {reason}", ids.len()));

    install_search(&mut v, |query, items| {
        items
            .iter()
            .enumerate()
            .filter(|(_, it)| it.content.ends_with(query))
            .map(|(i, _)| i)
            .collect()
    });

    let report = dispatcher.pump(&mut v);
    println!("initial pump: {report:?}");

    v.handle_key(Key::Down);
    v.handle_key(Key::Space);
    v.handle_key(Key::Enter);
    v.handle_key(Key::PageDown);
    dispatcher.pump(&mut v);

    v.scroll_to_bottom();
    let report = dispatcher.pump(&mut v);
    println!("after jump to bottom: {report:?}");

    let hits = v.search("7");
    println!("custom search hits={hits}");
    dispatcher.pump(&mut v);
}
