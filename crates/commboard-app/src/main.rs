//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() {
    env_logger::init();
    log::info!("Starting Communication Board");

    let config = commboard_app::AppConfig::from_env();
    pollster::block_on(commboard_app::App::run(config));
}

#[cfg(not(feature = "native"))]
fn main() {
    eprintln!("Native feature not enabled. Use `cargo run --features native`");
}
