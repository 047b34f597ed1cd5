mod concurrency;
mod properties;
mod scenarios;

use gateway_core::Gateway;
use gateway_core::config::GatewayConfig;
use gateway_core::engine::loopback::LoopbackBackend;

use std::sync::Arc;

pub(crate) fn loopback_gateway() -> (Arc<LoopbackBackend>, Gateway) {
    let config = GatewayConfig::default();
    let backend = Arc::new(LoopbackBackend::new(config.loopback.clone()));
    let gateway = Gateway::new(backend.clone(), config);
    (backend, gateway)
}
