//! eris: encode files into an ERIS block store and read them back
//!
//! Commands:
//!   put <file>   - encode a file (or stdin with "-"), print its URN
//!   get <urn>    - decode a URN to stdout or a file
//!   info <urn>   - show the fields of a capability URN

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use eris::{decode, BlockSize, ErisCap, Ingest, Secret};
use eris_store::OpendalStore;

#[derive(Parser, Debug)]
#[command(
    name = "eris",
    version,
    about = "ERIS content encoder",
    long_about = "Encode byte streams into convergent encrypted block trees and back"
)]
struct Cli {
    /// Block store directory
    #[arg(long, short = 's', env = "ERIS_STORE", default_value = ".eris-store")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a file (or stdin with "-") and print its URN
    Put {
        /// Input path, or "-" for stdin
        file: PathBuf,
        /// Block size; defaults to 1k for content up to 16 KiB, else 32k
        #[arg(long)]
        block_size: Option<BlockSizeArg>,
        /// Convergence secret, 52 base32 characters (default: public mode)
        #[arg(long, env = "ERIS_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Decode a URN from the store
    Get {
        /// Capability URN (urn:erisx3:...)
        urn: String,
        /// Output path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show the fields of a capability URN
    Info {
        /// Capability URN (urn:erisx3:...)
        urn: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BlockSizeArg {
    #[value(name = "1k")]
    Kib1,
    #[value(name = "32k")]
    Kib32,
}

impl From<BlockSizeArg> for BlockSize {
    fn from(arg: BlockSizeArg) -> Self {
        match arg {
            BlockSizeArg::Kib1 => BlockSize::Kib1,
            BlockSizeArg::Kib32 => BlockSize::Kib32,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Put {
            file,
            block_size,
            secret,
        } => put(&cli.store, &file, block_size, secret.as_deref()).await,
        Commands::Get { urn, output } => get(&cli.store, &urn, output.as_deref()).await,
        Commands::Info { urn } => info(&urn),
    }
}

fn open_store(path: &Path) -> Result<OpendalStore> {
    OpendalStore::open_fs(path.to_str().context("store path is not valid UTF-8")?)
}

async fn put(
    store_dir: &Path,
    file: &Path,
    block_size: Option<BlockSizeArg>,
    secret: Option<&str>,
) -> Result<()> {
    let content = if file == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        std::fs::read(file).with_context(|| format!("reading {}", file.display()))?
    };

    let block_size = block_size
        .map(BlockSize::from)
        .unwrap_or_else(|| BlockSize::recommended_for(content.len() as u64));
    let secret = match secret {
        Some(s) => parse_secret(s)?,
        None => Secret::zero(),
    };

    let store = open_store(store_dir)?;
    let progress = ProgressBar::new(content.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec})",
    )?);

    let mut ingest = Ingest::new(&store, block_size, secret);
    for chunk in content.chunks(64 * 1024) {
        ingest.append(chunk).await?;
        progress.inc(chunk.len() as u64);
    }
    let cap = ingest.cap().await?;
    progress.finish_and_clear();

    println!("{cap}");
    Ok(())
}

async fn get(store_dir: &Path, urn: &str, output: Option<&Path>) -> Result<()> {
    let cap: ErisCap = urn.parse().context("parsing capability URN")?;
    let store = open_store(store_dir)?;
    let content = decode(&store, &cap)
        .await
        .context("decoding content from store")?;

    match output {
        Some(path) => std::fs::write(path, &content)
            .with_context(|| format!("writing {}", path.display()))?,
        None => std::io::stdout()
            .write_all(&content)
            .context("writing stdout")?,
    }
    Ok(())
}

fn info(urn: &str) -> Result<()> {
    let cap: ErisCap = urn.parse().context("parsing capability URN")?;
    let alphabet = base32::Alphabet::RFC4648 { padding: false };
    println!("block size: {}", cap.block_size);
    println!("level:      {}", cap.level);
    println!("reference:  {}", cap.root.reference());
    println!(
        "key:        {}",
        base32::encode(alphabet, cap.root.key().as_bytes())
    );
    Ok(())
}

fn parse_secret(input: &str) -> Result<Secret> {
    let alphabet = base32::Alphabet::RFC4648 { padding: false };
    let decoded =
        base32::decode(alphabet, input).context("secret is not valid base32")?;
    let bytes: [u8; 32] = match decoded.try_into() {
        Ok(bytes) => bytes,
        Err(other) => bail!("secret must decode to 32 bytes, got {}", other.len()),
    };
    Ok(Secret::from_bytes(bytes))
}
