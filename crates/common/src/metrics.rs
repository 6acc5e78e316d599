//! Process-wide prometheus registry and the counters recorded by the HTTP layer.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("restaurant_operations_total", "Restaurant service operations by outcome"),
        &["operation", "outcome"],
    )
    .expect("valid metric definition");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric registered once");
    counter
});

/// Count one finished operation; `outcome` is `ok` or an error kind.
pub fn record_operation(operation: &str, outcome: &str) {
    OPERATIONS.with_label_values(&[operation, outcome]).inc();
}

/// Render every registered metric in the prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_operations_show_up_in_render() {
        record_operation("add_score", "ok");
        record_operation("add_score", "SCORE_OUT_OF_BOUNDS");
        let text = render().unwrap();
        assert!(text.contains("restaurant_operations_total"));
        assert!(text.contains("SCORE_OUT_OF_BOUNDS"));
    }
}
