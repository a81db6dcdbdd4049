use tracing_subscriber::EnvFilter;
use vxml_console::app::VxmlConsole;
use vxml_console::config::AppConfig;

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 720.0])
            .with_min_inner_size([720.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "VXML Console",
        options,
        Box::new(move |cc| Box::new(VxmlConsole::new(cc, config))),
    )
}
