// # ddnsd - DNSPod DDNS Daemon
//
// The ddnsd daemon is a thin integration layer. It is responsible for:
// 1. Reading the JSON configuration file and environment overrides
// 2. Initializing logging and the runtime
// 3. Building the DNSPod provider, HTTP IP source and optional webhook notifier
// 4. Running the supervisor until SIGTERM/SIGINT
//
// All reconciliation logic lives in ddns-core.
//
// ## Example
//
// ```bash
// cat > /etc/ddnsd/config.json <<'JSON'
// {
//   "domains": [{ "domain_name": "example.com", "sub_domains": ["home"] }]
// }
// JSON
// export DDNS_LOGIN_TOKEN=12345,your_token
//
// ddnsd
// ```

mod notify;
mod settings;

use anyhow::Result;
use ddns_core::{Components, EventSink, Supervisor};
use ddns_ip_http::HttpIpSource;
use ddns_provider_dnspod::DnspodProvider;
use notify::WebhookNotifier;
use settings::Settings;
use std::backtrace::Backtrace;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    install_panic_hook();

    info!("Starting ddnsd daemon");
    info!(
        path = %settings.config_path.display(),
        "Configuration loaded: {} domain(s)",
        settings.config.domains.len()
    );
    debug!(config = ?settings.config, "Effective configuration");

    let components = match build_components(&settings) {
        Ok(components) => components,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(settings, components).await {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Log panics (with a backtrace) through tracing instead of stderr
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = Backtrace::force_capture();
        error!(panic = %info, "Panic recovered, stack trace:\n{}", backtrace);
    }));
}

/// Build the provider, IP source and notifier from the configuration
fn build_components(settings: &Settings) -> Result<Components> {
    let config = &settings.config;

    let provider = DnspodProvider::new(config.credentials()?, config.socks5_proxy.as_deref())?;
    let ip_source = HttpIpSource::new(config.ip_url.clone())?;

    let mut components = Components::new(Arc::new(provider), Arc::new(ip_source));

    if let Some(notifier) = WebhookNotifier::from_config(&config.notify)? {
        info!("Update notifications enabled");
        components = components.with_notifier(Arc::new(notifier));
    }

    Ok(components)
}

/// Run the daemon
async fn run_daemon(settings: Settings, components: Components) -> Result<()> {
    let config = settings.config;

    for domain in &config.domains {
        info!(
            domain = %domain.domain_name,
            "Managing subdomains: {}",
            domain.sub_domains.join(", ")
        );
    }

    let (events, mut event_rx) = EventSink::channel(config.engine.event_channel_capacity);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "Engine event");
        }
    });

    let supervisor =
        Supervisor::new(config.domains, components, config.engine).with_events(events);

    supervisor.run_until(wait_for_shutdown()).await?;

    info!("Daemon stopped");
    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to set up signal handlers, falling back to CTRL-C: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to wait for CTRL-C: {}", e);
            }
            return;
        }
    };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", name);
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {}", e);
        return;
    }
    info!("Received shutdown signal: SIGINT");
}
