// src/main.rs
mod files;
mod logger;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;
use zipit::{ContainerInfo, Method};

#[derive(Parser)]
#[command(name = "zipit", version = "0.1.0")]
#[command(about = "Compress files with Huffman coding or deflate.", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum MethodArg {
    /// Frequency-based prefix coding.
    Huffman,
    /// zlib/deflate, usually smaller (Default).
    Deflate,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Huffman => Method::Huffman,
            MethodArg::Deflate => Method::Deflate,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file (writes <INPUT>.huff by default)
    Compress {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = MethodArg::Deflate)]
        method: MethodArg,
        /// Compression level, 0-9
        #[arg(short, long, default_value_t = 9, value_parser = clap::value_parser!(u32).range(0..=9))]
        level: u32,
        /// Overwrite the output if it exists
        #[arg(short, long)]
        force: bool,
    },
    /// Decompress a file produced by `compress`
    Decompress {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        force: bool,
    },
    /// Show the container header of a compressed file
    Inspect {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(logger::level_for(cli.verbose, cli.quiet))?;

    let span = tracing::info_span!("command_execution", command = ?std::env::args().collect::<Vec<_>>());
    let _enter = span.enter();

    match cli.command {
        Commands::Compress {
            input,
            output,
            method,
            level,
            force,
        } => compress_file(&input, output, method.into(), level, force),
        Commands::Decompress {
            input,
            output,
            force,
        } => decompress_file(&input, output, force),
        Commands::Inspect { input, json } => inspect_file(&input, json),
    }
}

fn compress_file(
    input: &Path,
    output: Option<PathBuf>,
    method: Method,
    level: u32,
    force: bool,
) -> anyhow::Result<()> {
    let data = files::read_file(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let container = zipit::compress(&data, method, level)
        .with_context(|| format!("failed to compress {}", input.display()))?;

    let output = output.unwrap_or_else(|| files::compressed_path(input));
    files::write_atomic(&output, &container, force)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        %method,
        level,
        "file compressed"
    );
    println!(
        "{} -> {} ({} -> {}, {})",
        input.display(),
        output.display(),
        files::format_bytes(data.len()),
        files::format_bytes(container.len()),
        ratio(container.len(), data.len()),
    );
    Ok(())
}

fn decompress_file(input: &Path, output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let container = files::read_file(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let data = zipit::decompress(&container)
        .with_context(|| format!("failed to decompress {}", input.display()))?;

    let output = output.unwrap_or_else(|| files::decompressed_path(input));
    files::write_atomic(&output, &data, force)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(input = %input.display(), output = %output.display(), "file decompressed");
    println!(
        "{} -> {} ({})",
        input.display(),
        output.display(),
        files::format_bytes(data.len()),
    );
    Ok(())
}

fn inspect_file(input: &Path, json: bool) -> anyhow::Result<()> {
    let container = files::read_file(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let info = zipit::inspect(&container)
        .with_context(|| format!("{} is not a valid container", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", render_info(&info));
    }
    Ok(())
}

fn render_info(info: &ContainerInfo) -> String {
    let mut out = format!(
        "method:         {}\ncontainer:      {}\npayload:        {}\n",
        info.method,
        files::format_bytes(info.container_len),
        files::format_bytes(info.payload_len),
    );
    if let Some(h) = &info.huffman {
        out.push_str(&format!(
            "symbols:        {}\noriginal:       {} bytes\ntable:          {}\ncode bits:      {}\npadding bits:   {}\nmax code len:   {}\n",
            h.symbols,
            h.original_len,
            files::format_bytes(h.table_len),
            h.code_bits,
            h.padding_bits,
            h.max_code_len,
        ));
    }
    out
}

fn ratio(compressed: usize, original: usize) -> String {
    if original == 0 {
        return "n/a".to_string();
    }
    format!("{:.1}%", compressed as f64 * 100.0 / original as f64)
}
