//! [libs/shared/mimosa-telemetry/src/lib.rs]
//! =================================================================
//! APARATO: TELEMETRY INITIALIZATION (OBSERVABILITY STRATUM)
//! CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4/L6)
//! RESPONSABILIDAD: GESTIÓN DE TRAZADO ESTRUCTURADO Y CAPTURA DE PÁNICOS
//!
//! Development builds print compact, colorized, human-readable lines.
//! Production builds emit flat JSON events suitable for ingestion by a
//! log aggregator. Either way a global panic hook forwards the panic
//! location and message through `tracing` before the process dies.
//! =================================================================

use std::panic;
use tracing::{error, info, instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Initializes the global `tracing` subscriber for `service_name`.
///
/// # Panics
/// Panics if a global subscriber has already been installed in this
/// process (mirrors `tracing_subscriber`'s own behavior).
#[instrument(skip_all)]
pub fn init_tracing(service_name: &str) {
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}={level},tower_http=warn,hyper=warn,libsql=error",
            service_name,
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    let is_production = !cfg!(debug_assertions);

    if is_production {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    }

    let service_id = service_name.to_string();
    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");

        error!(
            target: "panic_monitor",
            service = %service_id,
            location = %location,
            "thread panicked: {}",
            payload
        );
    }));

    info!("telemetry initialized for [{}]", service_name);
}
