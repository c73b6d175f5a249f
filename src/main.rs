use alpha_estimator::aggregate::render_report;
use alpha_estimator::image::io::write_json_file;
use alpha_estimator::{load_config, Pipeline};
use std::env;
use std::io::Write;
use std::path::Path;

fn main() {
    init_logger();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;
    let json_out = config.output.json_out.clone();

    let pipeline = Pipeline::new(config).map_err(|e| e.to_string())?;
    let report = pipeline.run().map_err(|e| e.to_string())?;

    for line in render_report(&report) {
        println!("{line}");
    }
    if let Some(path) = json_out {
        write_json_file(&path, &report).map_err(|e| e.to_string())?;
        println!("Saved run report to {}", path.display());
    }
    Ok(())
}

fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder
        .target(env_logger::Target::Stderr)
        .filter_level(log::LevelFilter::Info)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        });
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}

fn usage() -> String {
    "Usage: alpha_estimator <config.json>".to_string()
}
