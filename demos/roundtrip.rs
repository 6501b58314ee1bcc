use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    time::Instant,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fqc::{
    compress_fastq, decompress_fastq, Algorithm, CompressOptions, FastqReader, Reader,
    SelectionStrategy,
};
use tracing::info;

#[derive(Parser)]
#[command(about = "Compress FASTQ files into FQC containers and back")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// FASTQ (optionally gzip/zstd/xz compressed) to FQC
    Compress {
        input: String,
        output: String,
        /// Records per chunk
        #[clap(short, long, default_value_t = fqc::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// Fixed algorithms for name, sequence and quality (selected per chunk if omitted)
        #[clap(short, long, value_enum, num_args = 3)]
        algorithms: Option<Vec<AlgorithmArg>>,
        /// Report the last measured algorithm instead of the smallest
        #[clap(long)]
        legacy_selection: bool,
        /// Worker threads (0 = all cores)
        #[clap(short = 'T', long, default_value_t = 1)]
        threads: usize,
    },
    /// FQC to FASTQ
    Decompress { input: String, output: String },
    /// Print the algorithms and sizes of every column
    Inspect { input: String },
    /// Compress, decompress and compare against the original records
    Verify {
        input: String,
        #[clap(short, long, default_value_t = fqc::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum AlgorithmArg {
    Gzip,
    Lzma,
    Zstd,
}
impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Gzip => Algorithm::Gzip,
            AlgorithmArg::Lzma => Algorithm::Lzma,
            AlgorithmArg::Zstd => Algorithm::Zstd,
        }
    }
}

fn compress(
    input: &str,
    output: &str,
    chunk_size: usize,
    algorithms: Option<Vec<AlgorithmArg>>,
    legacy_selection: bool,
    threads: usize,
) -> Result<()> {
    let mut builder = CompressOptions::builder()
        .chunk_size(chunk_size)
        .threads(threads);
    if let Some(algorithms) = algorithms {
        builder = builder.fixed_algorithms(algorithms.into_iter().map(Algorithm::from));
    }
    if legacy_selection {
        builder = builder.selection(SelectionStrategy::LastEvaluated);
    }
    let options = builder.build()?;

    let source = BufReader::new(File::open(input).with_context(|| format!("opening {input}"))?);
    let sink = BufWriter::new(File::create(output).with_context(|| format!("creating {output}"))?);

    let start = Instant::now();
    let stats = compress_fastq(source, sink, &options)?;
    info!(
        records = stats.records,
        chunks = stats.chunks,
        elapsed = ?start.elapsed(),
        "wrote {output}"
    );
    Ok(())
}

fn decompress(input: &str, output: &str) -> Result<()> {
    let source = BufReader::new(File::open(input).with_context(|| format!("opening {input}"))?);
    let sink = BufWriter::new(File::create(output).with_context(|| format!("creating {output}"))?);

    let start = Instant::now();
    let stats = decompress_fastq(source, sink)?;
    info!(
        records = stats.records,
        chunks = stats.chunks,
        elapsed = ?start.elapsed(),
        "wrote {output}"
    );
    Ok(())
}

fn inspect(input: &str) -> Result<()> {
    let mut reader = Reader::from_path(input)?;
    let mut usage: BTreeMap<(usize, Algorithm), (u64, usize)> = BTreeMap::new();
    while let Some(chunk) = reader.read_raw_chunk()? {
        for (column, (algorithm, blob)) in chunk.algorithms().iter().zip(chunk.blobs()).enumerate() {
            let entry = usage.entry((column, *algorithm)).or_default();
            entry.0 += 1;
            entry.1 += blob.len();
        }
    }

    println!("chunks\t{}", reader.chunks_read());
    println!("bytes\t{}", reader.bytes_read());
    println!("column\talgorithm\tchunks\tbytes");
    for ((column, algorithm), (chunks, bytes)) in usage {
        println!("{column}\t{algorithm}\t{chunks}\t{bytes}");
    }
    Ok(())
}

fn verify(input: &str, chunk_size: usize) -> Result<()> {
    let records = FastqReader::from_path(input)?.collect::<fqc::Result<Vec<_>>>()?;
    let mut original = Vec::new();
    let mut writer = fqc::FastqWriter::new(&mut original);
    writer.write_batch(&records)?;

    let options = CompressOptions::builder().chunk_size(chunk_size).build()?;
    let mut container = Vec::new();
    let start = Instant::now();
    compress_fastq(&original[..], &mut container, &options)?;
    let compress_time = start.elapsed();

    let mut restored = Vec::new();
    let start = Instant::now();
    decompress_fastq(&container[..], &mut restored)?;
    let decompress_time = start.elapsed();

    anyhow::ensure!(restored == original, "restored FASTQ differs from the input");

    println!("Records: {}", records.len());
    println!("FASTQ size: {} bytes", original.len());
    println!("FQC size: {} bytes", container.len());
    println!(
        "Ratio: {:.2}x",
        original.len() as f64 / container.len().max(1) as f64
    );
    println!("Compress: {:?}", compress_time);
    println!("Decompress: {:?}", decompress_time);
    println!("✓ Round trip verified");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Compress {
            input,
            output,
            chunk_size,
            algorithms,
            legacy_selection,
            threads,
        } => compress(&input, &output, chunk_size, algorithms, legacy_selection, threads),
        Command::Decompress { input, output } => decompress(&input, &output),
        Command::Inspect { input } => inspect(&input),
        Command::Verify { input, chunk_size } => verify(&input, chunk_size),
    }
}
