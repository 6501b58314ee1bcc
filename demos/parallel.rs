use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use fqc::{
    chunked, columnize, encode_chunks_parallel, resolve_threads, Chunk, EncodedChunk, FastqReader,
    SelectionStrategy, Writer,
};

#[derive(Parser)]
struct Args {
    /// Input FASTQ path (stdin if omitted)
    input: Option<String>,
    /// Records per chunk
    #[clap(short, long, default_value_t = fqc::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
    /// Thread counts to compare (0 = all cores)
    #[clap(short = 'T', long, value_delimiter = ',', default_values_t = [1, 2, 4, 0])]
    threads: Vec<usize>,
}

fn frame(encoded: &[EncodedChunk]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new())?;
    for chunk in encoded {
        writer.write_encoded(chunk)?;
    }
    writer.finish()?;
    Ok(writer.into_inner())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let reader = FastqReader::from_optional_path(args.input.as_ref())?;
    let chunks = chunked(reader, args.chunk_size)
        .map(|batch| batch.map(columnize))
        .collect::<fqc::Result<Vec<Chunk>>>()?;
    let num_records = chunks.iter().map(Chunk::num_rows).sum::<usize>();

    println!("Parallel Compression Test");
    println!("=========================");
    println!("Records: {}", num_records);
    println!("Chunks: {}\n", chunks.len());

    let mut reference: Option<Vec<u8>> = None;
    for &threads in &args.threads {
        let start = Instant::now();
        let encoded = encode_chunks_parallel(&chunks, None, SelectionStrategy::Smallest, threads)?;
        let elapsed = start.elapsed();
        let container = frame(&encoded)?;

        println!(
            "  {:>3} threads: {:>10.2?} ({:.2} M records/s, {} bytes)",
            resolve_threads(threads),
            elapsed,
            num_records as f64 / elapsed.as_secs_f64() / 1_000_000.0,
            container.len()
        );

        match &reference {
            Some(expected) => anyhow::ensure!(
                expected == &container,
                "output with {threads} threads differs from the first run"
            ),
            None => reference = Some(container),
        }
    }
    println!("\n✓ All thread counts produced identical output");

    Ok(())
}
