use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use strata::config::{ensure_default_config, StrataConfig};
use strata::{
    ControllerChange, DesktopPlatform, HapticIntensity, HapticsRequest, PlatformAdapter, Strata,
    UiExecutor,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    // Starts from RUST_LOG or info; the config level applies once it is read
    let logging = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .with_filter_reloading();
    let log_filter = logging.reload_handle();
    logging.init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(StrataConfig::default_path);
    ensure_default_config(&config_path).await?;
    let config = StrataConfig::load_or_default(&config_path).await?;
    let directive = config.logging.filter_directive(std::env::var("RUST_LOG").ok());
    log_filter.reload(EnvFilter::new(directive))?;
    info!("Using config {}", config_path.display());

    let ui = UiExecutor::spawn("strata-ui")?;
    let (platform, mut changes) =
        DesktopPlatform::start(&config.display, config.pump.collector_settings())?;
    let strata = Arc::new(Strata::new(Arc::new(platform), ui));

    if !config.input.mapping.is_empty() {
        info!("Applying input mapping from config");
        strata.set_input_mapping(config.input.mapping.clone());
    }

    let profile = strata.get_device_profile()?;
    info!(
        "Device: {:?} on {:?}, input mode {:?}, {}x{}",
        profile.device_type, profile.platform, profile.input_mode, profile.screen_width, profile.screen_height
    );
    let hints = strata.get_control_hints()?;
    info!("Hints: {} / {} / {}", hints.movement, hints.action, hints.camera);

    let controllers = strata.get_connected_controllers()?;
    for controller in &controllers.controllers {
        info!(
            "  [{}] {}{}",
            controller.index,
            controller.id,
            if controller.is_selected { " (selected)" } else { "" }
        );
    }

    let _listeners = [
        strata
            .events()
            .on_device_change(|p| info!("Device changed: input mode {:?}, gamepad {}", p.input_mode, p.has_gamepad)),
        strata
            .events()
            .on_gamepad_connected(|g| info!("Gamepad connected: [{}] {}", g.index, g.id)),
        strata
            .events()
            .on_gamepad_disconnected(|g| warn!("Gamepad disconnected from slot {}", g.index)),
        strata.events().on_input_change(|s| {
            if s.buttons.values().any(|pressed| *pressed) {
                debug!("Buttons: {:?}", s.buttons);
            }
        }),
    ];

    let change_core = strata.clone();
    let change_task = tokio::spawn(async move {
        while let Some(change) = changes.recv().await {
            let connected = matches!(change, ControllerChange::Connected(_));
            if let Err(e) = change_core.handle_controller_change(change) {
                error!("Failed to handle controller change: {}", e);
                continue;
            }
            if connected {
                let greeting = HapticsRequest::preset(HapticIntensity::Light);
                if let Err(e) = change_core.trigger_haptics(&greeting) {
                    warn!("Greeting rumble failed: {}", e);
                }
            }
        }
        debug!("Controller change channel closed");
    });

    let mut ticker = tokio::time::interval(config.input.poll_interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = strata.publish_input() {
                    warn!("Failed to publish input snapshot: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    strata.remove_all_listeners();
    change_task.abort();
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(())
}
