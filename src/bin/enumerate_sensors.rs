// Copyright (c) 2023 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use clap::Parser;
use env_logger;
use serde::Serialize;

use isi_sensor::chip::ChipDescriptor;
use isi_sensor::chips;
use isi_sensor::mode::SensorMode;

/// Lists the supported sensor chips and their mode catalogs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Only list this chip (e.g. "ov2775").
    #[arg(short, long)]
    chip: Option<String>,

    /// Print the catalogs as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct ChipCatalog {
    chip: String,
    model: &'static str,
    exposure_latency: u8,
    modes: Vec<&'static SensorMode>,
}

fn catalog(chip: &ChipDescriptor) -> ChipCatalog {
    ChipCatalog{chip: chip.id.to_string(),
                model: chip.model,
                exposure_latency: chip.exposure_latency,
                modes: chip.modes.iter().collect()}
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let selected: Vec<&ChipDescriptor> = match &args.chip {
        None => chips::all().collect(),
        Some(name) => match name.parse() {
            Ok(id) => vec![chips::descriptor(id)],
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            },
        },
    };

    if args.json {
        let catalogs: Vec<ChipCatalog> = selected.iter().map(|c| catalog(c)).collect();
        match serde_json::to_string_pretty(&catalogs) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Could not serialize catalogs: {}", e);
                std::process::exit(1);
            },
        }
        return;
    }

    println!("Found {} sensor types: ", selected.len());
    for chip in selected {
        println!("{} ({}), {} modes:", chip.id, chip.model, chip.modes.len());
        for mode in chip.modes.iter() {
            let channels: Vec<String> =
                mode.channels.iter().map(|c| c.channel.to_string()).collect();
            println!("  {} [{}]", mode, channels.join(", "));
        }
    }
}
