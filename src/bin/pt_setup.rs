//! pt_setup — открыть точечный файл (truncate), создать точки, отсоединить их и закрыть.
//! Затем файл открывается read-only и печатается его каталог.
//!
//! Пример: RUST_LOG=debug pt_setup --path Point.he5 --json

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env};
use log::{error, info};
use serde::Serialize;
use std::path::PathBuf;

use pointfile::metrics::{self, MetricsSnapshot};
use pointfile::{AccessMode, PointLib};

#[derive(Parser, Debug)]
#[command(name = "pt_setup", version, about = "Create point objects in a point file")]
struct Args {
    /// Point file to create (existing content is discarded)
    #[arg(long, default_value = "Point.he5")]
    path: PathBuf,
    /// Point names to create (repeatable)
    #[arg(
        long = "point",
        default_values = ["Simple Point", "FixedBuoy Point", "FloatBuoy Point"]
    )]
    points: Vec<String>,
    /// Print a JSON report instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    path: PathBuf,
    points: Vec<String>,
    metrics: MetricsSnapshot,
}

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт — info.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run(Args::parse()) {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let lib = PointLib::new();

    let fid = lib
        .open(&args.path, AccessMode::CreateTruncate)
        .with_context(|| format!("open {}", args.path.display()))?;

    let mut ids = Vec::with_capacity(args.points.len());
    for name in &args.points {
        let id = lib
            .create(fid, name)
            .with_context(|| format!("create point '{}'", name))?;
        ids.push(id);
    }

    for id in ids {
        lib.detach(id).with_context(|| format!("detach {}", id))?;
    }
    lib.close(fid)
        .with_context(|| format!("close {}", args.path.display()))?;

    // Проверка: перечитать каталог read-only
    let fid = lib.open(&args.path, AccessMode::ReadOnly)?;
    let points = lib.inq_points(fid)?;
    lib.close(fid)?;
    info!("{}: {} point(s) written", args.path.display(), points.len());

    if args.json {
        let report = Report {
            path: args.path,
            points,
            metrics: metrics::snapshot(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", args.path.display());
        for p in &points {
            println!("  {}", p);
        }
    }
    Ok(())
}
