//! Property-based invariant tests for the viewport engine.
//!
//! These hold for any item list, viewport geometry and sequence of operations:
//!
//! 1. The scroll offset stays within `[0, max_scroll_offset]`.
//! 2. With uniform heights the visible range follows the closed-form window.
//! 3. Scrolling to the current offset is a no-op without notifications.
//! 4. The cache never holds more than its capacity.
//! 5. Selection respects its mode and only holds existing, selectable items.
//! 6. Search matches are ascending, in bounds and equal a naive scan.
//! 7. A successful loader leaves every observed item `Loaded`.

use lazyview::{
    Item, ItemRuntimeState, Key, LoadError, LoadRequest, SelectionMode, Viewport, ViewportEvent,
    ViewportOptions, VisibleRange,
};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Op {
    ScrollTo(u64),
    Lines(i64),
    PageDown,
    PageUp,
    Wheel(i8),
    Resize(u32),
    Select(usize),
    Toggle(usize),
    SelectAll,
    ClearSelection,
    Remove(usize),
    Insert(Option<usize>, u32),
    Search(&'static str),
    Key(Key),
    Render,
}

fn mode_strategy() -> impl Strategy<Value = SelectionMode> {
    prop_oneof![
        Just(SelectionMode::None),
        Just(SelectionMode::Single),
        Just(SelectionMode::Multiple),
    ]
}

fn key_strategy() -> impl Strategy<Value = Key> {
    prop_oneof![
        Just(Key::Up),
        Just(Key::Down),
        Just(Key::PageUp),
        Just(Key::PageDown),
        Just(Key::Home),
        Just(Key::End),
        Just(Key::Enter),
        Just(Key::Space),
        Just(Key::Escape),
        Just(Key::Char('n')),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..400).prop_map(Op::ScrollTo),
        (-20i64..20).prop_map(Op::Lines),
        Just(Op::PageDown),
        Just(Op::PageUp),
        any::<i8>().prop_map(Op::Wheel),
        (0u32..40).prop_map(Op::Resize),
        (0usize..80).prop_map(Op::Select),
        (0usize..80).prop_map(Op::Toggle),
        Just(Op::SelectAll),
        Just(Op::ClearSelection),
        (0usize..80).prop_map(Op::Remove),
        (proptest::option::of(0usize..90), 0u32..4).prop_map(|(at, h)| Op::Insert(at, h)),
        prop_oneof![Just("item 1"), Just("ITEM"), Just("zzz"), Just("")].prop_map(Op::Search),
        key_strategy().prop_map(Op::Key),
        Just(Op::Render),
    ]
}

fn build_items(heights: &[u32], unselectable_every: usize) -> Vec<Item> {
    heights
        .iter()
        .enumerate()
        .map(|(i, &h)| {
            Item::new(i as u64, format!("item {i}"))
                .with_height(h)
                .with_selectable(i % unselectable_every != 0)
        })
        .collect()
}

fn apply(v: &mut Viewport, op: &Op, next_id: &mut u64) {
    let identity_at = |v: &Viewport, i: usize| v.item_at(i).map(|it| it.identity);
    match *op {
        Op::ScrollTo(offset) => {
            v.scroll_to(offset);
        }
        Op::Lines(n) => {
            v.scroll_by_lines(n);
        }
        Op::PageDown => {
            v.page_down();
        }
        Op::PageUp => {
            v.page_up();
        }
        Op::Wheel(d) => {
            v.handle_wheel(d as f32 / 4.0);
        }
        Op::Resize(h) => {
            v.resize(80, h);
        }
        Op::Select(i) => {
            if let Some(id) = identity_at(v, i) {
                v.select_item(&id);
            }
        }
        Op::Toggle(i) => {
            if let Some(id) = identity_at(v, i) {
                v.toggle_selection(&id);
            }
        }
        Op::SelectAll => {
            v.select_all();
        }
        Op::ClearSelection => {
            v.clear_selection();
        }
        Op::Remove(i) => {
            if let Some(id) = identity_at(v, i) {
                v.remove_item(&id);
            }
        }
        Op::Insert(at, h) => {
            let item = Item::new(*next_id, format!("item {next_id}")).with_height(h);
            *next_id += 1;
            v.add_item(item, at).expect("fresh identity");
        }
        Op::Search(q) => {
            v.search(q);
        }
        Op::Key(key) => {
            v.handle_key(key);
        }
        Op::Render => {
            v.render();
        }
    }
}

fn naive_matches(v: &Viewport, query: &str) -> Vec<usize> {
    let needle = query.to_lowercase();
    v.items()
        .enumerate()
        .filter(|(_, it)| it.content.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1-6. Structural invariants under arbitrary operation sequences
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn invariants_hold_under_random_operations(
        heights in proptest::collection::vec(0u32..4, 0..60),
        viewport_height in 0u32..30,
        item_height in 1u32..3,
        overscan in 0usize..5,
        capacity in 1usize..40,
        mode in mode_strategy(),
        unselectable_every in 2usize..7,
        ops in proptest::collection::vec(op_strategy(), 1..60),
    ) {
        let opts = ViewportOptions::new(80, viewport_height)
            .with_item_height(item_height)
            .with_overscan(overscan)
            .with_cache_capacity(capacity)
            .with_selection_mode(mode);
        let mut v = Viewport::new(opts, build_items(&heights, unselectable_every)).unwrap();
        let mut next_id = 10_000u64;

        for op in &ops {
            apply(&mut v, op, &mut next_id);

            prop_assert!(v.scroll_offset() <= v.max_scroll_offset(), "op={:?}", op);
            prop_assert_eq!(
                v.max_scroll_offset(),
                v.total_extent().saturating_sub(v.viewport_extent())
            );
            let range = v.visible_range();
            prop_assert!(range.start <= range.end && range.end <= v.item_count());

            let stats = v.cache_stats();
            prop_assert!(stats.size <= stats.capacity, "cache overflow: {:?}", stats);

            match mode {
                SelectionMode::None => prop_assert!(v.selected().is_empty()),
                SelectionMode::Single => prop_assert!(v.selected().len() <= 1),
                SelectionMode::Multiple => {}
            }
            for id in v.selected() {
                prop_assert!(v.get_item(id).is_some_and(|it| it.selectable));
            }

            let matches = v.search_matches().to_vec();
            prop_assert!(matches.windows(2).all(|w| w[0] < w[1]));
            if !v.search_query().is_empty() {
                prop_assert_eq!(matches, naive_matches(&v, v.search_query()));
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Uniform heights: closed-form visible window
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn uniform_window_matches_closed_form(
        count in 1usize..500,
        viewport_height in 1u32..50,
        item_height in 1u32..4,
        overscan in 0usize..6,
        target in 0u64..3_000,
    ) {
        let opts = ViewportOptions::new(80, viewport_height)
            .with_item_height(item_height)
            .with_overscan(overscan);
        let list = (0..count as u64).map(|i| Item::new(i, "x"));
        let mut v = Viewport::new(opts, list).unwrap();
        v.scroll_to(target);

        let h = item_height as u64;
        let view = viewport_height as u64;
        let offset = v.scroll_offset();
        let start = ((offset / h) as usize).saturating_sub(overscan);
        let end = (offset + view).div_ceil(h) as usize;
        let expected = VisibleRange::new(start, (end + overscan).min(count));
        prop_assert_eq!(v.visible_range(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. scroll_to is idempotent
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn scroll_to_twice_is_a_no_op(
        count in 0u64..200,
        viewport_height in 0u32..40,
        target in any::<u64>(),
    ) {
        let list = (0..count).map(|i| Item::new(i, "x"));
        let mut v = Viewport::new(ViewportOptions::new(80, viewport_height), list).unwrap();

        v.scroll_to(target);
        let offset = v.scroll_offset();
        let range = v.visible_range();
        v.drain_events();

        prop_assert!(!v.scroll_to(target));
        prop_assert_eq!(v.scroll_offset(), offset);
        prop_assert_eq!(v.visible_range(), range);
        prop_assert!(v.drain_events().is_empty());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 7. Lazy loading converges
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn successful_loads_resolve_every_observed_item(
        count in 1u64..300,
        viewport_height in 1u32..30,
        stops in proptest::collection::vec(0u64..400, 1..8),
    ) {
        let opts = ViewportOptions::new(80, viewport_height).with_lazy_loading(true);
        let list = (0..count).map(|i| Item::new(i, ""));
        let mut v = Viewport::new(opts, list).unwrap();

        let mut load = |req: &LoadRequest<u64>| -> Result<Vec<Item>, LoadError> {
            Ok(req.identities.iter().map(|&id| Item::new(id, format!("row {id}"))).collect())
        };
        for stop in stops {
            v.scroll_to(stop);
            v.drive_loads(&mut load);
        }

        prop_assert_eq!(v.pending_loads(), 0);
        for (identity, state) in v.state().lazy {
            prop_assert_eq!(state, ItemRuntimeState::Loaded, "identity={}", identity);
        }
        let failures = v
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, ViewportEvent::LoadFailed { .. }))
            .count();
        prop_assert_eq!(failures, 0);
        for row in v.render() {
            prop_assert!(!row.content.is_placeholder());
        }
    }
}
