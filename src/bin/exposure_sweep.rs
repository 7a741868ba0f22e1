// Copyright (c) 2023 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use canonical_error::{CanonicalError, not_found_error};
use clap::Parser;
use env_logger;
use log::info;

use isi_sensor::chip::ChipId;
use isi_sensor::chips;
use isi_sensor::hdr_distributor::RatioPolicy;
use isi_sensor::simulated_port::SimulatedPort;
use isi_sensor::streaming::SensorSession;

/// Utility program for running a series of AE requests over a range of gain
/// values and integration times against a simulated sensor, showing what the
/// exposure engine applies and how many register writes each request costs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Sensor chip, e.g. "os08a20".
    #[arg(short, long)]
    chip: String,

    /// Mode index within the chip's catalog.
    #[arg(short, long, default_value_t = 0)]
    mode: usize,

    /// HDR ratio between consecutive channels; repeat for each ratio slot.
    #[arg(short, long)]
    ratio: Vec<f32>,

    /// Fail on missing or non-positive HDR ratios instead of substituting
    /// the default.
    #[arg(long, default_value_t = false)]
    strict: bool,
}

fn main() -> Result<(), CanonicalError> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let id: ChipId = args.chip.parse().map_err(|e: String| not_found_error(&e))?;
    let policy = if args.strict { RatioPolicy::Reject } else { RatioPolicy::default() };
    let mut sensor = SensorSession::with_ratio_policy(
        chips::descriptor(id), SimulatedPort::new(), policy);
    let mode = sensor.set_mode(args.mode)?;
    info!("sensor: {}", sensor.chip().model);
    info!("{}", mode);
    sensor.set_streaming(true)?;

    let mut requests = 0;
    for gain in [1.0, 2.0, 4.0, 8.0, 16.0] {
        for exp_ms in [1, 2, 5, 10, 20, 40] {
            let time = exp_ms as f32 / 1000.0;
            sensor.port_mut().clear_log();
            let result = sensor.exposure_control(gain, time, &args.ratio)?;
            requests += 1;
            info!("request g{} e{}ms -> gain {:.3} time {:.6}s skip {} writes {}",
                  gain, exp_ms, result.gain, result.integration_time,
                  result.frames_to_skip, sensor.port().write_count());
        }
    }
    let base_info = sensor.ae_base_info()?;
    info!("ae base info: {:?}", base_info);
    info!("hdr ratios: {:?}", sensor.cur_hdr_ratio()?);
    println!("{} requests on {} mode {}", requests, id, mode.index);
    sensor.release()?;
    Ok(())
}
