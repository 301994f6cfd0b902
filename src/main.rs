// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::Args;
use clap::Parser as _;
use edgefirst_laserproj::{ChannelOptions, LaserProjector, LaserScan, concatenate};
use edgefirst_schemas::{sensor_msgs::PointCloud2, serde_cdr};
use kanal::{Receiver, Sender};
use std::{
    fs::File,
    io::{self, BufRead as _, BufReader, BufWriter, Write},
    path::PathBuf,
    thread::{self, JoinHandle},
};
use tracing::{debug, error, info, info_span, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.rust_log)
        .with_writer(io::stderr)
        .init();

    let channels = args.channel_options();
    info!(
        scan = %args.scan.display(),
        channels = channels.bits(),
        range_cutoff = args.range_cutoff,
        "starting laser projection"
    );

    let (tx, rx) = kanal::bounded(args.queue_depth);
    let first = spawn_projector("scan", args.scan.clone(), args.range_cutoff, channels, tx)?;

    let second = match &args.scan2 {
        Some(path) => {
            let (tx, rx) = kanal::bounded(args.queue_depth);
            let handle = spawn_projector("scan2", path.clone(), args.range_cutoff, channels, tx)?;
            Some((handle, rx))
        }
        None => None,
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let written = write_loop(&mut out, &rx, second.as_ref().map(|(_, rx)| rx), &args);
    // Closing the receivers stops the workers if the writer failed early.
    drop(rx);
    let second = second.map(|(handle, rx)| {
        drop(rx);
        handle
    });

    let mut result = written.map(|n| info!(clouds = n, "projection complete"));
    for handle in std::iter::once(first).chain(second) {
        match handle.join() {
            Ok(Ok(n)) => debug!(scans = n, "projector finished"),
            Ok(Err(e)) => {
                error!("projector failed: {}", e);
                result = result.and(Err(e));
            }
            Err(_) => {
                error!("projector thread panicked");
                result = result.and(Err("projector thread panicked".into()));
            }
        }
    }

    result
}

/// Receive projected clouds, merge pairs and write them out.
fn write_loop(
    out: &mut dyn Write,
    first: &Receiver<PointCloud2>,
    second: Option<&Receiver<PointCloud2>>,
    args: &Args,
) -> Result<usize, BoxError> {
    let mut n_clouds = 0;

    while let Ok(cloud) = first.recv() {
        let mut cloud = match second {
            Some(rx) => match rx.recv() {
                Ok(other) => concatenate(cloud, &other)?,
                Err(_) => {
                    warn!("second scan stream ended before the first");
                    break;
                }
            },
            None => cloud,
        };

        if let Some(frame_id) = &args.frame_id {
            cloud.header.frame_id = frame_id.clone();
        }

        write_record(out, &cloud)?;
        n_clouds += 1;
    }

    if let Some(rx) = second {
        if let Ok(Some(_)) = rx.try_recv() {
            warn!("first scan stream ended before the second");
        }
    }

    out.flush()?;
    Ok(n_clouds)
}

/// Write a cloud as a little-endian u32 length followed by its CDR encoding.
fn write_record(out: &mut dyn Write, cloud: &PointCloud2) -> Result<(), BoxError> {
    let encoded =
        serde_cdr::serialize(cloud).map_err(|e| format!("could not encode cloud: {:?}", e))?;
    out.write_all(&(encoded.len() as u32).to_le_bytes())?;
    out.write_all(&encoded)?;
    Ok(())
}

/// Spawn a worker that projects every scan record of `path` with its own
/// projector and forwards the clouds to `tx`.
fn spawn_projector(
    name: &str,
    path: PathBuf,
    range_cutoff: f64,
    channels: ChannelOptions,
    tx: Sender<PointCloud2>,
) -> Result<JoinHandle<Result<usize, BoxError>>, BoxError> {
    let reader = BufReader::new(File::open(&path)?);
    let span = info_span!("projector", stream = name);

    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let _guard = span.enter();
            let mut projector = LaserProjector::new();
            let mut n_scans = 0;

            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }

                let scan: LaserScan = serde_json::from_str(&line)
                    .map_err(|e| format!("{}:{}: {}", path.display(), line_no + 1, e))?;
                let cloud = projector.project_laser(&scan, range_cutoff, channels)?;
                n_scans += 1;

                if tx.send(cloud).is_err() {
                    debug!("receiver closed, stopping");
                    break;
                }
            }

            Ok(n_scans)
        })?;

    Ok(handle)
}
