use anyhow::{Context, Result};

use tunnel_engine::logging::{init_logging, LoggingConfig};
use tunnel_sketch::{BackgroundVariant, Sketch};

const FONT_PATHS: [&str; 5] = [
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let background = match std::env::var("TUNNEL_BACKGROUND") {
        Ok(v) => v
            .parse::<BackgroundVariant>()
            .context("TUNNEL_BACKGROUND")?,
        Err(_) => BackgroundVariant::default(),
    };

    let mut sketch = Sketch::new()
        .title("Cube Tunnel")
        .size(1280.0, 720.0)
        .background(background);

    match load_font() {
        Some(bytes) => sketch = sketch.font(bytes),
        None => log::warn!("no system font found in {FONT_PATHS:?}"),
    }

    sketch.run()
}

fn load_font() -> Option<Vec<u8>> {
    FONT_PATHS.iter().find_map(|p| {
        let bytes = std::fs::read(p).ok()?;
        log::info!("using font {p}");
        Some(bytes)
    })
}
