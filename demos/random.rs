use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use fqc::{FastqRecord, FastqWriter};
use rand::{rngs::SmallRng, Rng, SeedableRng};

#[derive(Parser)]
struct Args {
    /// Output FASTQ path (stdout if omitted)
    path: Option<String>,
    /// Number of records to generate (in thousands)
    #[clap(long, default_value_t = 100.0)]
    records: f64,
    #[clap(long, default_value_t = 50)]
    min_len: usize,
    #[clap(long, default_value_t = 150)]
    max_len: usize,
    /// Probability of an N at any position
    #[clap(long, default_value_t = 0.01)]
    n_rate: f64,
    #[clap(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    anyhow::ensure!(
        args.min_len <= args.max_len,
        "--min-len must not exceed --max-len"
    );

    let mut writer = FastqWriter::from_optional_path(args.path.as_ref())?;
    let mut rng = if let Some(seed) = args.seed {
        SmallRng::seed_from_u64(seed)
    } else {
        SmallRng::from_os_rng()
    };

    let start = Instant::now();
    let num_records = (args.records * 1_000.0) as usize;
    let mut total_bases = 0;
    for i in 0..num_records {
        let len = rng.random_range(args.min_len..=args.max_len);
        let seq = (0..len)
            .map(|_| {
                if rng.random_bool(args.n_rate) {
                    b'N'
                } else {
                    b"ACGT"[rng.random_range(0..4)]
                }
            })
            .collect::<Vec<_>>();
        let qual = seq
            .iter()
            .map(|&base| if base == b'N' { b'#' } else { rng.random_range(b'+'..=b'J') })
            .collect::<Vec<_>>();
        total_bases += len;
        writer.write_record(&FastqRecord::new(
            format!("@sim.{} {}:N:0", i + 1, i % 2 + 1),
            seq,
            qual,
        ))?;
    }
    writer.finish()?;

    eprintln!("Finished generating {} records", num_records);
    eprintln!("Total bases: {}", total_bases);
    eprintln!("Elapsed time: {:?}", start.elapsed());

    Ok(())
}
