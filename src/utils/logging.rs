use std::env;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::Context;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const LOG_FILE: &str = "particle-scene.log";

/// Initialize console + file logging and the panic hook.
///
/// `RUST_LOG` overrides the default filter. `WGPU_LOG=1` turns on the graphics
/// stack's debug output, which is off by default because it is very chatty.
pub fn init_logging(log_file: &Path) -> anyhow::Result<()> {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let enable_wgpu_logging = env::var("WGPU_LOG").map(|v| v == "1").unwrap_or(false);
    let enable_backtrace = env::var("RUST_BACKTRACE").map(|v| v == "1").unwrap_or(false);

    // Session-based log: start clean every run
    if let Err(e) = fs::remove_file(log_file) {
        if e.kind() != io::ErrorKind::NotFound {
            eprintln!("Warning: Failed to remove existing {}: {}", log_file.display(), e);
        }
    }
    let file = fs::File::create(log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => default_filter(&log_level, enable_wgpu_logging)?,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("Panic occurred: {}", panic_info);

        if let Some(location) = panic_info.location() {
            tracing::error!(
                "Panic location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }

        if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            tracing::error!("Panic payload: {}", s);
        }

        if enable_backtrace {
            tracing::error!("Backtrace:\n{:?}", std::backtrace::Backtrace::capture());
        }
    }));

    tracing::info!("Logging initialized with level: {}", log_level);
    tracing::info!("File logging enabled: {} (cleaned on startup)", log_file.display());
    tracing::info!("WGPU logging enabled: {}", enable_wgpu_logging);
    Ok(())
}

fn default_filter(log_level: &str, wgpu_debug: bool) -> anyhow::Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("Invalid log level '{}'", log_level))?
        .add_directive("particle_scene=debug".parse()?);

    if wgpu_debug {
        for target in ["wgpu", "wgpu_core", "wgpu_hal", "naga"] {
            filter = filter.add_directive(format!("{}=debug", target).parse()?);
        }
    } else {
        for target in ["wgpu_core", "wgpu_hal", "naga"] {
            filter = filter.add_directive(format!("{}=warn", target).parse()?);
        }
    }
    Ok(filter)
}

/// Log system information for debugging
pub fn log_system_info() {
    tracing::info!("=== System Information ===");
    tracing::info!("OS: {}", std::env::consts::OS);
    tracing::info!("Architecture: {}", std::env::consts::ARCH);
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if let Ok(backend) = env::var("WGPU_BACKEND") {
        tracing::info!("WGPU Backend: {}", backend);
    }

    if let Ok(adapter) = env::var("WGPU_ADAPTER_NAME") {
        tracing::info!("WGPU Adapter: {}", adapter);
    }

    tracing::info!("========================");
}

/// Log the outcome of a wgpu operation and pass the result through.
pub fn handle_wgpu_result<T, E: std::fmt::Display>(result: Result<T, E>, operation: &str) -> Result<T, E> {
    match &result {
        Ok(_) => {
            tracing::debug!("WGPU operation '{}' completed successfully", operation);
        }
        Err(e) => {
            tracing::error!("WGPU operation '{}' failed: {}", operation, e);
        }
    }
    result
}

/// Log wgpu adapter information
pub fn log_adapter_info(adapter: &wgpu::Adapter) {
    let info = adapter.get_info();
    tracing::info!("=== WGPU Adapter Information ===");
    tracing::info!("Name: {}", info.name);
    tracing::info!("Backend: {:?}", info.backend);
    tracing::info!("Device Type: {:?}", info.device_type);
    tracing::info!("Driver: {} ({})", info.driver, info.driver_info);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_accepts_plain_levels() {
        assert!(default_filter("info", false).is_ok());
        assert!(default_filter("debug", true).is_ok());
    }

    #[test]
    fn handle_wgpu_result_passes_value_through() {
        let ok: Result<u32, String> = Ok(3);
        assert_eq!(handle_wgpu_result(ok, "noop"), Ok(3));
        let err: Result<u32, String> = Err("boom".into());
        assert!(handle_wgpu_result(err, "noop").is_err());
    }
}
