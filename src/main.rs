use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use depth_keyer::{
    KeyerConfig,
    pipeline::{FpsCounter, FramePump, SyntheticRig, start_tick_source},
};

const DEFAULT_TICKS: u64 = 60;
const TICK_INTERVAL: Duration = Duration::from_millis(33);
const OUTPUT_PATH: &str = "keyed.png";

fn main() -> Result<()> {
    env_logger::init();

    let ticks = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("invalid tick count: {arg}"))?,
        None => DEFAULT_TICKS,
    };

    let config = KeyerConfig {
        draw_bones: true,
        ..KeyerConfig::default()
    };
    let mut pump = FramePump::new(SyntheticRig::default(), config)?;

    let (frame_tx, frame_rx) = bounded(1);
    let source = start_tick_source(TICK_INTERVAL, Some(ticks), frame_tx);

    pump.set_observer(Box::new(FpsCounter::new()));
    pump.run(&frame_rx)?;
    source.stop();

    let image = match pump.raster().to_image() {
        Some(mut image) => {
            pump.overlay().rasterize_over(&mut image);
            image
        }
        None => anyhow::bail!("output buffer does not match its resolution"),
    };
    save(&image, Path::new(OUTPUT_PATH))?;
    log::info!(
        "wrote {OUTPUT_PATH} after {} sensor frames",
        pump.sensor().frames_delivered()
    );

    pump.close();
    Ok(())
}

fn save(image: &image::RgbaImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
