use std::path::{Path, PathBuf};

use aes128_core::io;
use aes128_core::prelude::*;
use aes128_core::session::PowerPreference;
use anyhow::{bail, Context};
use structopt::StructOpt;
use tracing::info;

pub use anyhow::Error;

pub type Result<T = (), E = Error> = core::result::Result<T, E>;

#[derive(Debug, StructOpt)]
#[structopt(name = "aes128", about = "Encrypt or decrypt a file with AES-128")]
struct Args {
    /// File to encrypt or decrypt
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// encrypt | decrypt
    #[structopt(short = "o", long = "operation")]
    operation: Direction,

    /// SEQ | CPU | GPU
    #[structopt(short = "m", long = "mode", default_value = "SEQ")]
    mode: Backend,

    /// Raw 16-byte key file. Required to decrypt; a fresh key is generated
    /// for encryption when omitted.
    #[structopt(short = "k", long = "key", parse(from_os_str))]
    key: Option<PathBuf>,

    /// Key as 32 hex digits, instead of a key file
    #[structopt(long = "hex-key", conflicts_with = "key")]
    hex_key: Option<String>,

    /// Worker threads for CPU mode (default: one per processor)
    #[structopt(short = "t", long = "threads")]
    threads: Option<usize>,

    /// Prefer an integrated adapter in GPU mode
    #[structopt(long = "low-power")]
    low_power: bool,

    /// Print the run telemetry as JSON on stdout
    #[structopt(long)]
    telemetry: bool,
}

impl Args {
    fn config(&self) -> SessionConfig {
        let power = if self.low_power {
            PowerPreference::LowPower
        } else {
            PowerPreference::HighPerformance
        };
        SessionConfig::new(self.threads, power)
    }

    /// Key supplied on the command line, if any.
    fn supplied_key(&self) -> Result<Option<Key>> {
        if let Some(path) = &self.key {
            let key = io::load_key(path)
                .with_context(|| format!("reading key file {}", path.display()))?;
            return Ok(Some(key));
        }
        if let Some(hex_key) = &self.hex_key {
            return parse_hex_key(hex_key).map(Some);
        }
        Ok(None)
    }

    fn run(self) -> Result {
        let input = io::read_input(&self.input)
            .with_context(|| format!("reading {}", self.input.display()))?;

        let (key, generated) = match (self.operation, self.supplied_key()?) {
            (_, Some(key)) => (key, false),
            (Direction::Encrypt, None) => (io::generate_key(), true),
            (Direction::Decrypt, None) => bail!("decryption requires --key or --hex-key"),
        };

        let mut session = CipherSession::new(input, &key).with_config(self.config());
        let output = session
            .run(self.operation, self.mode)
            .map_err(|e| run_failure(e, self.operation, self.mode))?;

        let out_path = io::output_path(&self.input, self.operation, self.mode);
        io::write_result(&out_path, &output)
            .with_context(|| format!("writing {}", out_path.display()))?;
        info!(path = %out_path.display(), "result written");

        if self.operation == Direction::Encrypt {
            write_key(&self.input, self.mode, &key, generated)?;
        }

        if self.telemetry {
            if let Some(snapshot) = session.telemetry() {
                println!("{}", snapshot.to_json()?);
            }
        }

        Ok(())
    }
}

fn run_failure(err: CipherError, operation: Direction, mode: Backend) -> Error {
    let context = format!("{operation} with {mode} backend");
    if err.is_device_error() {
        Error::new(err).context(format!("{context}; rerun with -m CPU or -m SEQ"))
    } else {
        Error::new(err).context(context)
    }
}

fn write_key(input: &Path, mode: Backend, key: &Key, generated: bool) -> Result {
    let path = io::key_path(input, mode);
    io::save_key(&path, key).with_context(|| format!("writing {}", path.display()))?;
    if generated {
        info!(path = %path.display(), "generated key saved");
    }
    Ok(())
}

fn parse_hex_key(text: &str) -> Result<Key> {
    let bytes = hex::decode(text.trim()).context("key is not valid hex")?;
    Ok(Key::from_slice(&bytes)?)
}

fn main() -> Result {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .event_format(format)
        .init();

    Args::from_args().run()
}
