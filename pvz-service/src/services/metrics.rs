//! Prometheus metrics for pvz-service.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter,
    register_int_counter_vec, Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("pvz_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

pub static PVZ_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("pvz_created_total", "Pickup points created by city"),
        &["city"]
    )
    .expect("Failed to register PVZ_CREATED_TOTAL")
});

pub static RECEPTIONS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!("receptions_created_total", "Receptions opened"))
        .expect("Failed to register RECEPTIONS_CREATED_TOTAL")
});

pub static PRODUCTS_ADDED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("products_added_total", "Products added to receptions by type"),
        &["category"]
    )
    .expect("Failed to register PRODUCTS_ADDED_TOTAL")
});

/// gRPC request counter
pub static GRPC_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("pvz_grpc_requests_total", "Total gRPC requests"),
        &["method", "status"]
    )
    .expect("Failed to register GRPC_REQUESTS_TOTAL")
});

/// Register every metric so `/metrics` lists them before first use.
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&PVZ_CREATED_TOTAL);
    Lazy::force(&RECEPTIONS_CREATED_TOTAL);
    Lazy::force(&PRODUCTS_ADDED_TOTAL);
    Lazy::force(&GRPC_REQUESTS_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_pickup_point_created(city: &str) {
    PVZ_CREATED_TOTAL.with_label_values(&[city]).inc();
}

pub fn record_reception_created() {
    RECEPTIONS_CREATED_TOTAL.inc();
}

pub fn record_item_added(category: &str) {
    PRODUCTS_ADDED_TOTAL.with_label_values(&[category]).inc();
}

pub fn record_grpc_request(method: &str, status: &str) {
    GRPC_REQUESTS_TOTAL.with_label_values(&[method, status]).inc();
}
