use crate::*;

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use lazyview::{
    Align, Item, ItemKey, ItemRuntimeState, Key, LoadError, ScrollMode, SelectionMode, Viewport,
    ViewportOptions,
};

fn items(range: core::ops::Range<u64>) -> Vec<Item> {
    range.map(|i| Item::new(i, format!("item {i}"))).collect()
}

fn viewport(count: u64, mode: ScrollMode) -> Viewport {
    let opts = ViewportOptions::new(80, 10).with_scroll_mode(mode);
    Viewport::new(opts, items(0..count)).unwrap()
}

#[test]
fn anchor_preserves_scroll_across_prepend() {
    let mut v = Viewport::new(ViewportOptions::new(80, 10), items(1000..1100)).unwrap();
    v.scroll_to(50);

    let anchor = ScrollAnchor::capture(&v).unwrap();
    assert_eq!(anchor.identity, 1050);
    assert_eq!(anchor.offset_in_item, 0);

    // Prepend 10 items: old items shift by +10 indexes.
    let prepended: Vec<Item> = items(2000..2010).into_iter().chain(items(1000..1100)).collect();
    assert!(set_items_anchored(&mut v, prepended).unwrap());
    assert_eq!(v.scroll_offset(), 60);
    assert_eq!(v.item_at(v.visible_rows().start).map(|it| it.identity), Some(1050));
}

#[test]
fn anchor_keeps_intra_item_offset() {
    let tall = (0..20u64).map(|i| Item::new(i, "tall").with_height(4));
    let mut v = Viewport::new(ViewportOptions::new(80, 10), tall).unwrap();
    v.scroll_to(22);

    let anchor = ScrollAnchor::capture(&v).unwrap();
    assert_eq!(anchor.identity, 5);
    assert_eq!(anchor.offset_in_item, 2);

    v.add_item(Item::new(99, "new").with_height(3), Some(0)).unwrap();
    assert!(anchor.apply(&mut v));
    assert_eq!(v.scroll_offset(), 25);
}

#[test]
fn anchor_fails_when_identity_is_gone() {
    let mut v = Viewport::new(ViewportOptions::new(80, 10), items(0..50)).unwrap();
    v.scroll_to(20);
    assert!(!set_items_anchored(&mut v, items(100..150)).unwrap());

    let empty: Viewport = Viewport::new(ViewportOptions::new(80, 10), Vec::new()).unwrap();
    assert!(ScrollAnchor::capture(&empty).is_none());
}

#[test]
fn tween_reaches_target_monotonically() {
    let t = Tween::new(0, 500, 0, 100, Easing::SmoothStep);
    let mut last = 0u64;
    for now_ms in [0u64, 10, 20, 40, 80, 100, 120] {
        let off = t.sample(now_ms);
        assert!(off >= last);
        last = off;
    }
    assert_eq!(t.sample(100), 500);
    assert!(t.is_done(100));

    let down = Tween::new(500, 100, 0, 50, Easing::Linear);
    assert_eq!(down.sample(25), 300);
    assert_eq!(down.sample(1_000), 100);
}

#[test]
fn tween_retarget_starts_from_current_sample() {
    let mut t = Tween::new(0, 100, 0, 100, Easing::Linear);
    t.retarget(50, 200, 100);
    assert_eq!(t.from, 50);
    assert_eq!(t.to, 200);
    assert_eq!(t.start_ms, 50);
    assert_eq!(Tween::new(0, 1, 0, 0, Easing::Linear).duration_ms, 1);
}

#[test]
fn easing_curves_hit_endpoints() {
    for easing in [
        Easing::Linear,
        Easing::SmoothStep,
        Easing::EaseOutQuad,
        Easing::EaseInOutCubic,
    ] {
        assert_eq!(easing.apply(0.0), 0.0);
        assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
        assert!((easing.apply(0.5) - 0.5).abs() < 0.3);
    }
}

#[test]
fn instant_mode_snaps() {
    let mut c = Controller::new(viewport(1000, ScrollMode::Instant));
    assert!(c.scroll_to_index(500, Align::Start, 0));
    assert!(!c.is_animating());
    assert_eq!(c.display_offset(), 500);
    assert_eq!(c.tick(16), None);
}

#[test]
fn smooth_mode_tweens_every_change() {
    let mut c = Controller::new(viewport(1000, ScrollMode::Smooth)).with_animation(100, Easing::Linear);
    assert!(c.handle_wheel(1.0, 0));
    assert!(c.is_animating());
    // The engine already moved; only the display lags.
    assert_eq!(c.viewport().scroll_offset(), 1);

    let mut last = 0u64;
    for now_ms in [0u64, 20, 40, 80, 100, 120] {
        if let Some(off) = c.tick(now_ms) {
            assert!(off >= last);
            last = off;
        }
    }
    assert!(!c.is_animating());
    assert_eq!(c.display_offset(), 1);
}

#[test]
fn auto_mode_tweens_only_page_jumps() {
    let mut c = Controller::new(viewport(1000, ScrollMode::Auto));
    assert!(c.handle_key(Key::Down, 0));
    assert!(c.handle_wheel(3.0, 0));
    assert!(!c.is_animating());
    assert_eq!(c.display_offset(), 3);

    assert!(c.page_down(0));
    assert!(c.is_animating());
    assert_eq!(c.display_offset(), 3);
    assert_eq!(c.tick(1_000), Some(13));
    assert_eq!(c.tick(1_016), None);
    assert_eq!(c.display_offset(), 13);
}

#[test]
fn retarget_mid_animation_continues_from_display() {
    let mut c = Controller::new(viewport(1000, ScrollMode::Smooth)).with_animation(100, Easing::Linear);
    c.scroll_to(100, 0);
    assert_eq!(c.tick(50), Some(50));

    c.scroll_to(300, 50);
    assert_eq!(c.tick(50), Some(50));
    assert_eq!(c.tick(100), Some(175));
    assert_eq!(c.tick(150), Some(300));
    assert!(!c.is_animating());
}

#[test]
fn controller_anchored_replace_cancels_animation() {
    let mut c = Controller::new(viewport(100, ScrollMode::Smooth));
    c.scroll_to(50, 0);
    assert!(c.is_animating());

    let prepended: Vec<Item> = items(500..505).into_iter().chain(items(0..100)).collect();
    assert!(c.set_items_anchored(prepended).unwrap());
    assert!(!c.is_animating());
    assert_eq!(c.display_offset(), 55);
    assert_eq!(c.capture_anchor().map(|a| a.identity), Some(50));
}

#[test]
fn dispatcher_routes_events_to_callbacks() {
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let opts = ViewportOptions::new(80, 10).with_selection_mode(SelectionMode::Multiple);
    let mut v = Viewport::new(opts, items(0..100)).unwrap();

    let mut d = Dispatcher::new()
        .with_on_scroll({
            let log = Rc::clone(&log);
            move |s, _| log.borrow_mut().push(format!("scroll {}", s.offset))
        })
        .with_on_selection_change({
            let log = Rc::clone(&log);
            move |sel: &[ItemKey], _| log.borrow_mut().push(format!("select {sel:?}"))
        })
        .with_on_item_activate({
            let log = Rc::clone(&log);
            move |id, item, _| log.borrow_mut().push(format!("activate {id} {}", item.content))
        })
        .with_on_resize({
            let log = Rc::clone(&log);
            move |w, h, _| log.borrow_mut().push(format!("resize {w}x{h}"))
        });

    v.scroll_to(5);
    v.select_item(&7);
    v.select_item(&8);
    v.activate_item(&7);
    v.resize(100, 20);

    let report = d.pump(&mut v);
    assert_eq!(report.events, 5);
    assert_eq!(
        *log.borrow(),
        vec![
            "scroll 5",
            "select [7]",
            "select [7, 8]",
            "activate 7 item 7",
            "resize 100x20",
        ]
    );

    assert_eq!(d.pump(&mut v).events, 0);
}

#[test]
fn dispatcher_services_lazy_loads_and_reports_failures() {
    let failures: Rc<RefCell<Vec<(Vec<ItemKey>, String)>>> = Rc::new(RefCell::new(Vec::new()));
    let opts = ViewportOptions::new(80, 5).with_lazy_loading(true);
    let placeholders = (0..50u64).map(|i| Item::new(i, ""));
    let mut v = Viewport::new(opts, placeholders).unwrap();

    let mut d = Dispatcher::new()
        .with_on_lazy_load(|req| {
            if req.start >= 20 {
                return Err(LoadError::new("out of range"));
            }
            Ok(req.identities.iter().map(|&id| Item::new(id, format!("row {id}"))).collect())
        })
        .with_on_load_error({
            let failures = Rc::clone(&failures);
            move |ids, reason, _| failures.borrow_mut().push((ids.to_vec(), String::from(reason)))
        });

    let report = d.pump(&mut v);
    assert_eq!(report.loads.applied, 8);
    assert_eq!(v.lazy_state(&0), Some(&ItemRuntimeState::Loaded));
    assert!(failures.borrow().is_empty());

    v.scroll_to(30);
    let report = d.pump(&mut v);
    assert_eq!(report.loads.failed, 11);
    let failures = failures.borrow();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, (27..38).collect::<Vec<_>>());
    assert_eq!(failures[0].1, "out of range");
}

#[test]
fn dispatcher_without_loader_leaves_requests_queued() {
    let opts = ViewportOptions::new(80, 5).with_lazy_loading(true);
    let mut v = Viewport::new(opts, items(0..20)).unwrap();
    let mut d: Dispatcher = Dispatcher::new();
    d.pump(&mut v);
    assert_eq!(v.take_load_requests().len(), 1);
}

#[test]
fn installed_search_callback_drives_matches() {
    let mut v = Viewport::new(ViewportOptions::new(80, 10), items(0..30)).unwrap();
    install_search(&mut v, |query, items| {
        items
            .iter()
            .enumerate()
            .filter(|(_, it)| it.content.ends_with(query))
            .map(|(i, _)| i)
            .collect()
    });
    assert_eq!(v.search("7"), 3);
    assert_eq!(v.search_matches(), &[7, 17, 27]);
}
