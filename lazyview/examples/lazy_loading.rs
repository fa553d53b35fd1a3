// Example: placeholders resolved by a host loader, including a failed page.
use lazyview::{Item, ItemRuntimeState, LoadError, LoadRequest, Viewport, ViewportOptions};

fn fetch(request: &LoadRequest<u64>) -> Result<Vec<Item>, LoadError> {
    if request.start >= 400 {
        return Err(LoadError::new("backend unavailable"));
    }
    Ok(request
        .identities
        .iter()
        .map(|&id| Item::new(id, format!("message #{id}")))
        .collect())
}

fn main() {
    let placeholders = (0..500u64).map(|i| Item::new(i, ""));
    let opts = ViewportOptions::new(80, 8)
        .with_lazy_loading(true)
        .with_overscan(4);
    let mut v = Viewport::new(opts, placeholders).expect("valid viewport");

    // The first range is observed on construction; its request is already queued.
    for row in v.render() {
        println!("{:>3} {}", row.index, row.content.text());
    }

    let outcome = v.drive_loads(&mut fetch);
    println!("loaded: {outcome:?}");
    for row in v.render().iter().take(3) {
        println!("{:>3} {}", row.index, row.content.text());
    }

    // Hand requests to the host manually this time, and finish them out of order.
    v.scroll_to(200);
    v.scroll_to(420);
    let mut requests = v.take_load_requests();
    requests.reverse();
    for request in requests {
        let ticket = request.ticket;
        let outcome = v.complete_load(ticket, fetch(&request));
        println!("ticket {ticket}: {outcome:?}");
    }

    println!("state(200)={:?}", v.lazy_state(&200));
    if let Some(ItemRuntimeState::Error(reason)) = v.lazy_state(&420) {
        println!("state(420)=error: {reason}");
    }
    for event in v.drain_events() {
        println!("event: {event:?}");
    }
}
