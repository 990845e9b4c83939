//! anvil-chunkd: load every stored chunk of a world's region files concurrently
//! and report how the chunk caches behaved.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use anvil_chunkd::region::index_to_local;
use anvil_chunkd::{Chunk, RegionFile, RegionPos, World};

#[derive(Parser)]
#[command(name = "anvil-chunkd", about = "Concurrent chunk loader for Minecraft Anvil region files")]
pub struct Args {
    /// Directory holding r.X.Z.mca files
    #[arg(short, long, env = "WORLD_DIR", default_value = "world/region")]
    pub world: PathBuf,

    /// Only load these regions, given as "X,Z" (repeatable)
    #[arg(short, long, value_parser = parse_pair, allow_hyphen_values = true)]
    pub region: Vec<(i32, i32)>,

    /// Decode a single chunk, given as "X,Z", and print a summary
    #[arg(short, long, value_parser = parse_pair, allow_hyphen_values = true)]
    pub chunk: Option<(i32, i32)>,

    /// Maximum number of open region files kept (0 = unbounded)
    #[arg(long, env = "REGION_CACHE_SIZE", default_value = "64")]
    pub region_cache: usize,

    /// Maximum number of decoded chunks kept per region (0 = unbounded)
    #[arg(long, env = "CHUNK_CACHE_SIZE", default_value = "1024")]
    pub chunk_cache: usize,

    /// Maximum number of chunk loads awaited at once
    #[arg(long, env = "LOAD_CONCURRENCY", default_value = "16")]
    pub concurrency: usize,
}

fn parse_pair(s: &str) -> Result<(i32, i32), String> {
    let (x, z) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"X,Z\", got {:?}", s))?;
    let x = x.trim().parse().map_err(|e| format!("bad X in {:?}: {}", s, e))?;
    let z = z.trim().parse().map_err(|e| format!("bad Z in {:?}: {}", s, e))?;
    Ok((x, z))
}

fn summarize(chunk: &Chunk) -> String {
    format!(
        "Chunk ({}, {})\n  DataVersion: {}\n  Status: {}\n  Sections: {}\n  Block states in palettes: {}\n  Block entities: {}\n  InhabitedTime: {}",
        chunk.x_pos,
        chunk.z_pos,
        chunk.data_version,
        chunk.status,
        chunk.sections.len(),
        chunk.palette_len(),
        chunk.block_entities.len(),
        chunk.inhabited_time,
    )
}

/// What a full load pass did.
#[derive(Default)]
struct LoadSummary {
    opened: Vec<(RegionPos, Arc<RegionFile<File>>)>,
    loaded: usize,
    failed: usize,
    bad_regions: usize,
}

/// Load every stored chunk of the given regions. A region that cannot be
/// opened is logged and skipped; only a failed task join aborts the pass.
async fn load_regions(
    world: &World,
    positions: Vec<RegionPos>,
    concurrency: usize,
) -> anyhow::Result<LoadSummary> {
    let limiter = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut summary = LoadSummary::default();

    for pos in positions {
        let region = match world.region(pos).await {
            Ok(Some(region)) => region,
            Ok(None) => {
                log::warn!("Region file {} not found, skipping", pos.filename());
                continue;
            }
            Err(e) => {
                summary.bad_regions += 1;
                log::warn!("Region file {} unreadable, skipping: {}", pos.filename(), e);
                continue;
            }
        };
        log::info!(
            "Region {}: {} stored chunks",
            pos.filename(),
            region.locations().len_present()
        );

        for (index, _) in region.locations().present() {
            let (local_x, local_z) = index_to_local(index);
            let chunk_pos = pos.local_to_world(local_x, local_z);
            let region = region.clone();
            let limiter = limiter.clone();
            tasks.spawn(async move {
                let _permit = limiter.acquire().await;
                let result = region.get_chunk(chunk_pos.x, chunk_pos.z).await;
                (chunk_pos, result)
            });
        }
        summary.opened.push((pos, region));
    }

    while let Some(joined) = tasks.join_next().await {
        let (chunk_pos, result) = joined?;
        match result {
            Ok(_) => summary.loaded += 1,
            Err(e) => {
                summary.failed += 1;
                log::warn!("Chunk ({}, {}) failed to load: {}", chunk_pos.x, chunk_pos.z, e);
            }
        }
    }

    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let world = World::with_capacity(&args.world, args.region_cache, args.chunk_cache);
    log::info!("Using world directory {}", world.dir().display());

    if let Some((x, z)) = args.chunk {
        let chunk = world
            .get_chunk(x, z)
            .await
            .with_context(|| format!("loading chunk ({}, {})", x, z))?;
        println!("{}", summarize(&chunk));
        return Ok(());
    }

    let positions: Vec<RegionPos> = if args.region.is_empty() {
        world
            .region_positions()
            .with_context(|| format!("listing {}", world.dir().display()))?
    } else {
        args.region.iter().map(|&(x, z)| RegionPos::new(x, z)).collect()
    };

    let summary = load_regions(&world, positions, args.concurrency).await?;

    log::info!(
        "Loaded {} chunks, {} failed, {} regions unreadable",
        summary.loaded,
        summary.failed,
        summary.bad_regions
    );
    for (pos, region) in &summary.opened {
        println!("{}\n{}", pos.filename(), region.cache().stats().generate_report());
    }

    Ok(())
}
