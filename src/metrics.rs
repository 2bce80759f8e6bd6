use tracing::trace;

// Request and upstream counters emitted as trace events; a subscriber
// filtering on `items.metrics` can aggregate them.

pub fn inc_requests(route: &'static str) {
    trace!(target = "items.metrics", route = route, "requests_total_inc");
}

pub fn upstream_elapsed(resource: &'static str, elapsed_ms: u128) {
    trace!(
        target = "items.metrics",
        resource = resource,
        elapsed_ms = elapsed_ms as u64,
        "upstream_elapsed"
    );
}
