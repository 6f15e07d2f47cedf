//! matchsim - Simulation harness for the identity resolution engine.
//!
//! Enrolls a synthetic population, then replays genuine and impostor
//! resolution queries against it and reports accuracy and latency. Faces
//! are simulated as seeded unit vectors with per-capture noise, carried
//! inside the capture's first 16 luma bytes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use rollcall_embed::{EmbedError, FaceEmbedder, FaceImage};
use rollcall_engine::{Decision, Engine, EngineConfig, Marked, Resolved, Review};
use rollcall_identity::{CandidateInfo, CheckType, IdentityId, MemoryIdentityStore};

/// Simulation harness for the identity resolution engine.
#[derive(Parser, Debug)]
#[command(name = "matchsim")]
#[command(about = "Simulation harness for the identity resolution engine")]
struct Args {
    /// Number of identities to enroll
    #[arg(long, default_value_t = 50)]
    identities: usize,

    /// Enrollment captures per identity
    #[arg(long, default_value_t = 4)]
    samples: usize,

    /// Resolution queries to run, alternating genuine and impostor
    #[arg(long, default_value_t = 200)]
    queries: usize,

    /// Embedding dimension
    #[arg(long, default_value_t = 512)]
    dim: usize,

    /// Noise scale applied to each simulated capture
    #[arg(long, default_value_t = 0.08)]
    noise: f32,

    /// Simulation seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Override the match threshold
    #[arg(long)]
    threshold: Option<f32>,

    /// Save the index to this path after enrollment
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;

fn lcg_next(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state >> 33
}

fn random_unit_vec(seed: u64, dim: usize) -> Vec<f32> {
    let mut state = seed.wrapping_add(GOLDEN);
    let mut v: Vec<f32> = (0..dim)
        .map(|_| (lcg_next(&mut state) as f32 / (1u64 << 31) as f32) - 0.5)
        .collect();
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

fn person_seed(seed: u64, person: u64) -> u64 {
    seed ^ person.wrapping_mul(GOLDEN).rotate_left(17)
}

fn enroll_jitter(person: u64, sample: u64) -> u64 {
    person ^ (sample + 1).wrapping_mul(0xff51_afd7_ed55_8ccd)
}

fn query_jitter(seed: u64, query: u64) -> u64 {
    seed.wrapping_mul(0xc4ce_b9fe_1a85_ec53) ^ (query + 1).wrapping_mul(GOLDEN)
}

/// Embedder that decodes a person seed and a jitter seed from the first
/// 16 luma bytes and returns the person's unit vector plus scaled noise.
struct SimEmbedder {
    dim: usize,
    noise: f32,
}

impl FaceEmbedder for SimEmbedder {
    fn embed(&self, image: &FaceImage) -> Result<Vec<f32>, EmbedError> {
        let luma = image.luma();
        if luma.len() < 16 {
            return Err(EmbedError::InvalidImage("missing simulation header".into()));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&luma[..8]);
        let person = u64::from_le_bytes(bytes);
        bytes.copy_from_slice(&luma[8..16]);
        let jitter_seed = u64::from_le_bytes(bytes);

        let mut vector = random_unit_vec(person, self.dim);
        if self.noise > 0.0 {
            let jitter = random_unit_vec(jitter_seed, self.dim);
            for (v, j) in vector.iter_mut().zip(&jitter) {
                *v += self.noise * j;
            }
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for v in &mut vector {
                    *v /= norm;
                }
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

/// Checkerboard capture that clears the quality gate, with the two
/// simulation seeds packed into the first 16 pixels.
fn sim_image(person: u64, jitter_seed: u64) -> Result<FaceImage> {
    let mut luma: Vec<u8> = (0..16 * 16)
        .map(|i| {
            let (x, y) = (i % 16, i / 16);
            if (x + y) % 2 == 0 { 0 } else { 255 }
        })
        .collect();
    luma[..8].copy_from_slice(&person.to_le_bytes());
    luma[8..16].copy_from_slice(&jitter_seed.to_le_bytes());
    Ok(FaceImage::from_luma(16, 16, luma)?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    let mut cfg = EngineConfig {
        dim: args.dim,
        ..EngineConfig::default()
    };
    if let Some(threshold) = args.threshold {
        cfg.match_threshold = threshold;
    }
    if args.samples < cfg.min_images || args.samples > cfg.max_images {
        anyhow::bail!(
            "samples must be between {} and {}",
            cfg.min_images,
            cfg.max_images
        );
    }
    if args.identities == 0 {
        anyhow::bail!("need at least one identity");
    }

    let store = Arc::new(MemoryIdentityStore::new());
    let embedder = Arc::new(SimEmbedder {
        dim: args.dim,
        noise: args.noise,
    });
    let engine = Engine::new(cfg, store, embedder);

    // Enrollment
    println!(
        "=== Enrolling {} identities x {} captures (dim {}) ===",
        args.identities, args.samples, args.dim
    );
    let start = Instant::now();
    let mut roster: Vec<(IdentityId, u64)> = Vec::with_capacity(args.identities);
    for p in 0..args.identities {
        let person = person_seed(args.seed, p as u64);
        let images: Vec<FaceImage> = (0..args.samples)
            .map(|s| sim_image(person, enroll_jitter(person, s as u64)))
            .collect::<Result<_>>()?;
        let receipt = engine.submit_enrollment(
            CandidateInfo {
                full_name: format!("person-{p:04}"),
                external_id: Some(format!("badge-{p:04}")),
            },
            &images,
        )?;
        match engine.review_enrollment(receipt.request_id, Decision::Approve)? {
            Review::Approved(identity) => roster.push((identity.id, person)),
            Review::Rejected(_) => anyhow::bail!("unexpected rejection for person-{p:04}"),
        }
    }
    println!(
        "  approved {} requests in {:?}",
        roster.len(),
        start.elapsed()
    );

    let report = engine.rebuild_index()?;
    println!(
        "  index rebuilt: {} templates / {} identities in {:?}",
        report.entries, report.identities, report.duration
    );

    // Resolution
    println!();
    println!(
        "=== Resolving {} queries (noise {}) ===",
        args.queries, args.noise
    );
    let mut genuine = 0usize;
    let mut impostors = 0usize;
    let mut matched = 0usize;
    let mut missed = 0usize;
    let mut confused = 0usize;
    let mut false_accepts = 0usize;
    let mut spent = Duration::ZERO;
    for q in 0..args.queries {
        let (image, expected) = if q % 2 == 0 {
            let (id, person) = roster[(q / 2) % roster.len()];
            genuine += 1;
            (sim_image(person, query_jitter(args.seed, q as u64))?, Some(id))
        } else {
            let stranger = person_seed(args.seed, (args.identities + q) as u64);
            impostors += 1;
            (sim_image(stranger, query_jitter(args.seed, q as u64))?, None)
        };

        let start = Instant::now();
        let resolved = engine.resolve_face(&image)?;
        spent += start.elapsed();

        match (resolved, expected) {
            (Resolved::Match { identity_id, .. }, Some(want)) if identity_id == want => {
                matched += 1;
            }
            (Resolved::Match { .. }, Some(_)) => confused += 1,
            (Resolved::NoMatch { .. }, Some(_)) => missed += 1,
            (Resolved::Match { .. }, None) => false_accepts += 1,
            (Resolved::NoMatch { .. }, None) => {}
            (Resolved::EmbeddingFailed(err), _) => {
                anyhow::bail!("simulated embedding failed: {err}")
            }
        }
    }
    println!("  genuine:  {genuine} queries, {matched} matched, {missed} missed, {confused} misidentified");
    println!("  impostor: {impostors} queries, {false_accepts} false accepts");
    if args.queries > 0 {
        println!("  mean latency: {:?}", spent / args.queries as u32);
    }

    // Attendance
    println!();
    let day_sample = roster.len().min(10);
    println!("=== Marking attendance for {day_sample} identities, two rounds ===");
    let mut recorded = 0usize;
    let mut duplicates = 0usize;
    let mut unrecognized = 0usize;
    for round in 0..2u64 {
        for (i, (_, person)) in roster.iter().take(day_sample).enumerate() {
            let jitter = query_jitter(args.seed, 1_000_000 + round * day_sample as u64 + i as u64);
            let image = sim_image(*person, jitter)?;
            match engine.mark_attendance(&image, CheckType::In)? {
                Marked::Recorded(_) => recorded += 1,
                Marked::Duplicate(_) => duplicates += 1,
                Marked::NotRecognized { .. } => unrecognized += 1,
                Marked::EmbeddingFailed(err) => {
                    anyhow::bail!("simulated embedding failed: {err}")
                }
            }
        }
    }
    println!("  recorded {recorded} check-ins, {duplicates} deduplicated, {unrecognized} unrecognized");

    if let Some(path) = &args.output {
        let saved = engine.save_index(path)?;
        println!();
        println!("=== Saved {saved} templates to {} ===", path.display());
    }

    Ok(())
}
