//! huffpack command line tool
//!
//! ## Usage
//!
//! ```bash
//! # Encode a text file into a readable container
//! huffpack encode notes.txt notes.huf
//!
//! # Encode raw 8-bit pixels, recording their geometry
//! huffpack encode --mode image --width 640 --height 480 --bpp 8 frame.raw frame.huf
//!
//! # Restore the original bytes
//! huffpack decode notes.huf notes.txt
//!
//! # Show frequencies, codes and the tree without writing anything
//! huffpack stats --tree notes.txt
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use huffpack::runtime::{EncodeContent, EncodeRequest, spawn_encode};
use huffpack::{
    BitstreamFormat, CodeTable, EncodedPayload, EngineConfig, HuffmanError, HuffmanTree, ImageMeta,
    Mode, decompress,
};

#[derive(Parser, Debug)]
#[command(name = "huffpack")]
#[command(version)]
#[command(about = "Huffman coding for text and raw image bytes", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a file into a container
    Encode(EncodeArgs),
    /// Decode a container back into the original bytes
    Decode {
        input: PathBuf,
        output: PathBuf,
    },
    /// Print frequencies and codes for a file
    Stats {
        #[arg(short, long, default_value = "text")]
        mode: Mode,

        /// Also print the tree
        #[arg(long)]
        tree: bool,

        input: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct EncodeArgs {
    /// Alphabet to encode over (text or image)
    #[arg(short, long, default_value = "text")]
    mode: Mode,

    /// Bitstream storage (readable or packed); defaults to the configured one for the mode
    #[arg(short, long)]
    format: Option<BitstreamFormat>,

    /// Decode the result and compare before writing
    #[arg(long)]
    verify: bool,

    /// Image width in pixels
    #[arg(long, requires_all = ["height", "bpp"])]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(long, requires_all = ["width", "bpp"])]
    height: Option<u32>,

    /// Bits per pixel
    #[arg(long, requires_all = ["width", "height"])]
    bpp: Option<u16>,

    input: PathBuf,
    output: PathBuf,
}

impl EncodeArgs {
    fn image_meta(&self) -> Option<ImageMeta> {
        match (self.width, self.height, self.bpp) {
            (Some(width), Some(height), Some(bits_per_pixel)) => Some(ImageMeta {
                width,
                height,
                bits_per_pixel,
            }),
            _ => None,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            EngineConfig::from_json_file(path)?
        }
        None => EngineConfig::default(),
    };

    match args.command {
        Command::Encode(encode) => run_encode(encode, config)?,
        Command::Decode { input, output } => run_decode(&input, &output)?,
        Command::Stats { mode, tree, input } => run_stats(mode, tree, &input)?,
    }
    Ok(())
}

fn run_encode(
    args: EncodeArgs,
    mut config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let meta = args.image_meta();
    if meta.is_some() && args.mode != Mode::Image {
        return Err("--width/--height/--bpp only apply to --mode image".into());
    }
    if let Some(format) = args.format {
        match args.mode {
            Mode::Text => config.text_format = format,
            Mode::Image => config.image_format = format,
        }
    }
    config.verify_after_encode |= args.verify;

    let content = match args.mode {
        Mode::Text => EncodeContent::Text(read_text(&args.input)?),
        Mode::Image => EncodeContent::Image {
            pixels: std::fs::read(&args.input)?,
            meta,
        },
    };
    let request = EncodeRequest {
        id: 0,
        content,
        config,
    };

    info!(input = %args.input.display(), mode = %args.mode, "encoding");
    let payload = spawn_encode(request)?.wait_blocking().result?;

    let mut writer = BufWriter::new(File::create(&args.output)?);
    payload.write_to(&mut writer)?;
    writer.flush()?;

    info!(
        output = %args.output.display(),
        symbols = payload.symbol_count,
        bits = payload.bit_count(),
        format = %payload.stream.format(),
        "encoded"
    );
    Ok(())
}

/// Text mode only accepts valid UTF-8; nothing is replaced or dropped.
fn read_text(path: &Path) -> huffpack::Result<String> {
    let data = std::fs::read(path)?;
    Ok(text_from_bytes(&data)?.to_owned())
}

fn text_from_bytes(data: &[u8]) -> huffpack::Result<&str> {
    std::str::from_utf8(data).map_err(|err| {
        HuffmanError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

fn run_decode(input: &Path, output: &Path) -> huffpack::Result<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let payload = EncodedPayload::read_from(&mut reader)?;
    if let Some(image) = payload.image {
        info!(
            width = image.width,
            height = image.height,
            bpp = image.bits_per_pixel,
            "image geometry"
        );
    }

    let decoded = decompress(&payload)?;
    std::fs::write(output, decoded.into_bytes())?;
    info!(output = %output.display(), symbols = payload.symbol_count, "decoded");
    Ok(())
}

fn run_stats(mode: Mode, show_tree: bool, input: &Path) -> huffpack::Result<()> {
    let data = std::fs::read(input)?;
    let tree = match mode {
        Mode::Text => HuffmanTree::from_text(text_from_bytes(&data)?)?,
        Mode::Image => HuffmanTree::from_bytes(&data)?,
    };
    let table = CodeTable::generate(&tree);
    let frequencies = tree.frequencies();

    let symbols = tree.weight();
    let bits = table
        .encoded_bit_len(&frequencies)
        .ok_or_else(|| HuffmanError::invalid_frequencies("encoded length overflows u64"))?;
    println!("mode:          {mode}");
    println!("symbols:       {symbols}");
    println!("distinct:      {}", table.len());
    println!("tree depth:    {}", tree.depth());
    println!("encoded bits:  {bits}");
    println!("average bits:  {:.3}", bits as f64 / symbols as f64);
    println!("raw bytes:     {}", data.len());
    println!(
        "packed ratio:  {:.1}%",
        bits.div_ceil(8) as f64 / data.len().max(1) as f64 * 100.0
    );
    println!();

    for entry in frequencies.iter().rev() {
        if let Some(code) = table.code(entry.symbol) {
            println!("{:>16}  {:>10}  {code}", entry.symbol.to_string(), entry.count);
        }
    }

    if show_tree {
        println!();
        print!("{tree}");
    }
    Ok(())
}
