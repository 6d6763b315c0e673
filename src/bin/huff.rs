/// huff – Huffman compression tool.
///
/// Works similar to gzip:
///   huff file.txt          → compress to file.txt.hf (removes original)
///   huff -d file.txt.hf    → decompress to file.txt (removes original)
///   huff -c file.txt       → compress to stdout
///   huff -k file.txt       → keep original after compress
///   huff -l file.txt.hf    → list info about compressed file
///   cat file | huff -c     → compress stdin to stdout
///   cat file | huff -dc    → decompress stdin to stdout
use std::env;
use std::fs;
use std::io::{self, BufReader, BufWriter, Cursor, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{self, ExitCode};

use huff::{CodecOptions, DebugLevel, HuffCodec};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const SUFFIX: &str = "hf";

fn usage() {
    eprintln!("huff - lossless Huffman compression tool");
    eprintln!();
    eprintln!("Usage: huff [OPTIONS] [FILE]...");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -d, --decompress   Decompress mode");
    eprintln!("  -c, --stdout       Write to stdout (don't remove original)");
    eprintln!("  -k, --keep         Keep original file");
    eprintln!("  -f, --force        Overwrite existing output files");
    eprintln!("  -l, --list         List info about compressed file");
    eprintln!("  -q, --quiet        Suppress warnings");
    eprintln!("  -v, --verbose      Verbose output (-vv debug, -vvv trace)");
    eprintln!("  -h, --help         Show this help");
    eprintln!();
    eprintln!("If no FILE is given, reads from stdin and writes to stdout.");
    eprintln!("Compressed files use the .{SUFFIX} extension.");
    eprintln!("RUST_LOG, when set, replaces the filter chosen by -v.");
}

#[derive(Debug, Default)]
struct Opts {
    decompress: bool,
    to_stdout: bool,
    keep: bool,
    force: bool,
    list: bool,
    verbose: u8,
    quiet: bool,
    files: Vec<String>,
}

fn parse_args() -> Opts {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut opts = Opts::default();

    for arg in &args {
        match arg.as_str() {
            "-d" | "--decompress" => opts.decompress = true,
            "-c" | "--stdout" | "--to-stdout" => opts.to_stdout = true,
            "-k" | "--keep" => opts.keep = true,
            "-f" | "--force" => opts.force = true,
            "-l" | "--list" => opts.list = true,
            "-v" | "--verbose" => opts.verbose = opts.verbose.saturating_add(1),
            "-q" | "--quiet" => opts.quiet = true,
            "-h" | "--help" => {
                usage();
                process::exit(0);
            }
            // Handle combined short flags like -dc, -kv, etc.
            s if s.starts_with('-') && !s.starts_with("--") && s.len() > 2 => {
                for ch in s[1..].chars() {
                    match ch {
                        'd' => opts.decompress = true,
                        'c' => opts.to_stdout = true,
                        'k' => opts.keep = true,
                        'f' => opts.force = true,
                        'l' => opts.list = true,
                        'v' => opts.verbose = opts.verbose.saturating_add(1),
                        'q' => opts.quiet = true,
                        _ => {
                            eprintln!("huff: unknown flag '-{ch}'");
                            process::exit(1);
                        }
                    }
                }
            }
            s if s.starts_with("--") => {
                eprintln!("huff: unknown option '{s}'");
                process::exit(1);
            }
            _ => opts.files.push(arg.clone()),
        }
    }

    opts
}

/// Why a file was left unprocessed.
#[derive(Debug)]
enum Failure {
    /// Printed unless -q. The input is left untouched.
    Warning(String),
    Error(String),
}

impl From<String> for Failure {
    fn from(msg: String) -> Self {
        Failure::Error(msg)
    }
}

fn verbose_level(opts: &Opts) -> DebugLevel {
    match opts.verbose {
        0 | 1 => DebugLevel::Off,
        2 => DebugLevel::Low,
        _ => DebugLevel::High,
    }
}

/// Install the stderr subscriber and return the codec level it can show.
///
/// Without RUST_LOG the filter follows -v. With RUST_LOG the filter is
/// taken from it, and the codec reports whatever that filter lets through.
fn init_tracing(opts: &Opts) -> DebugLevel {
    let default = match verbose_level(opts) {
        DebugLevel::Off => LevelFilter::WARN,
        DebugLevel::Low => LevelFilter::DEBUG,
        DebugLevel::High => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();

    let current = LevelFilter::current();
    if current == LevelFilter::TRACE {
        DebugLevel::High
    } else if current == LevelFilter::DEBUG {
        DebugLevel::Low
    } else {
        DebugLevel::Off
    }
}

/// Determine the output filename for compression.
fn compress_output_path(input: &str) -> PathBuf {
    PathBuf::from(format!("{input}.{SUFFIX}"))
}

/// Determine the output filename for decompression.
fn decompress_output_path(input: &str) -> Option<PathBuf> {
    let path = Path::new(input);
    match path.extension().and_then(|e| e.to_str()) {
        Some(SUFFIX) => Some(path.with_extension("")),
        _ => None,
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

fn create_output(opts: &Opts, out_path: &Path) -> Result<BufWriter<fs::File>, Failure> {
    let out_str = out_path.display();
    if out_path.exists() && !opts.force {
        return Err(Failure::Warning(format!(
            "{out_str} already exists; use -f to overwrite"
        )));
    }
    let file = fs::File::create(out_path).map_err(|e| format!("{out_str}: {e}"))?;
    Ok(BufWriter::new(file))
}

fn process_compress(opts: &Opts, path: &str, codec: &HuffCodec) -> Result<(), Failure> {
    let file = fs::File::open(path).map_err(|e| format!("{path}: {e}"))?;
    let input = BufReader::new(file);

    if opts.to_stdout {
        let output = BufWriter::new(io::stdout().lock());
        codec
            .compress(input, output)
            .map_err(|e| format!("{path}: {e}"))?;
        return Ok(());
    }

    let out_path = compress_output_path(path);
    let output = create_output(opts, &out_path)?;
    let stats = match codec.compress(input, output) {
        Ok(stats) => stats,
        Err(e) => {
            let _ = fs::remove_file(&out_path);
            return Err(Failure::Error(format!("{path}: {e}")));
        }
    };

    if opts.verbose > 0 {
        let out_size = stats.output_bits.div_ceil(8);
        eprintln!(
            "{path}: {:.1}% ({} → {out_size} bytes, header {} bits)",
            ratio(out_size, stats.input_bytes),
            stats.input_bytes,
            stats.header_bits,
        );
    }

    if !opts.keep {
        fs::remove_file(path).map_err(|e| format!("{path}: cannot remove: {e}"))?;
    }
    Ok(())
}

fn process_decompress(opts: &Opts, path: &str, codec: &HuffCodec) -> Result<(), Failure> {
    let file = fs::File::open(path).map_err(|e| format!("{path}: {e}"))?;
    let input = BufReader::new(file);

    if opts.to_stdout {
        let output = BufWriter::new(io::stdout().lock());
        let stats = codec
            .decompress(input, output)
            .map_err(|e| format!("{path}: {e}"))?;
        warn_tail(opts, path, stats.tail_bytes);
        return Ok(());
    }

    let out_path = decompress_output_path(path)
        .ok_or_else(|| Failure::Warning(format!("{path}: unknown suffix -- ignored")))?;
    let output = create_output(opts, &out_path)?;
    let stats = match codec.decompress(input, output) {
        Ok(stats) => stats,
        Err(e) => {
            // Partial output of a failed decode is never kept.
            let _ = fs::remove_file(&out_path);
            return Err(Failure::Error(format!("{path}: {e}")));
        }
    };

    if opts.verbose > 0 {
        let in_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        eprintln!("{path}: {in_size} → {} bytes", stats.output_bytes);
    }
    warn_tail(opts, path, stats.tail_bytes);

    if !opts.keep {
        fs::remove_file(path).map_err(|e| format!("{path}: cannot remove: {e}"))?;
    }
    Ok(())
}

fn warn_tail(opts: &Opts, path: &str, tail_bytes: u64) {
    if tail_bytes > 0 && !opts.quiet {
        eprintln!("huff: {path}: warning: {tail_bytes} trailing bytes copied");
    }
}

fn list_file(path: &str, codec: &HuffCodec) -> Result<(), String> {
    let data = fs::read(path).map_err(|e| format!("{path}: {e}"))?;
    let stats = codec
        .decompress(data.as_slice(), io::sink())
        .map_err(|e| format!("{path}: {e}"))?;
    println!(
        "{:>12} {:>12} {:5.1}% {:>6} {}",
        stats.output_bytes,
        data.len(),
        ratio(data.len() as u64, stats.output_bytes),
        stats.tail_bytes,
        path,
    );
    Ok(())
}

fn process_stdin_stdout(opts: &Opts, codec: &HuffCodec) -> Result<(), String> {
    let stdout = io::stdout();
    let output = BufWriter::new(stdout.lock());

    if opts.decompress {
        let input = BufReader::new(io::stdin().lock());
        codec
            .decompress(input, output)
            .map_err(|e| format!("stdin: {e}"))?;
    } else {
        // The counting pass needs a rewind, so stdin is buffered whole.
        let mut data = Vec::new();
        io::stdin()
            .read_to_end(&mut data)
            .map_err(|e| format!("stdin: {e}"))?;
        codec
            .compress(Cursor::new(data), output)
            .map_err(|e| format!("stdin: {e}"))?;
    }
    io::stdout().flush().map_err(|e| format!("stdout: {e}"))?;
    Ok(())
}

fn run() -> Result<(), ()> {
    let opts = parse_args();
    let debug_level = init_tracing(&opts);
    let codec = HuffCodec::new(CodecOptions { debug_level });
    let mut had_error = false;

    if opts.files.is_empty() {
        if opts.list {
            eprintln!("huff: -l requires a file argument");
            return Err(());
        }
        if let Err(e) = process_stdin_stdout(&opts, &codec) {
            eprintln!("huff: {e}");
            return Err(());
        }
        return Ok(());
    }

    if opts.list {
        println!(
            "{:>12} {:>12} {:>6} {:>6} name",
            "original", "compressed", "ratio", "tail"
        );
        for path in &opts.files {
            if let Err(e) = list_file(path, &codec) {
                eprintln!("huff: {e}");
                had_error = true;
            }
        }
        return if had_error { Err(()) } else { Ok(()) };
    }

    for path in &opts.files {
        let result = if path == "-" {
            process_stdin_stdout(&opts, &codec).map_err(Failure::Error)
        } else if opts.decompress {
            process_decompress(&opts, path, &codec)
        } else {
            process_compress(&opts, path, &codec)
        };

        match result {
            Ok(()) => {}
            Err(Failure::Warning(msg)) => {
                if !opts.quiet {
                    eprintln!("huff: {msg}");
                }
                had_error = true;
            }
            Err(Failure::Error(msg)) => {
                eprintln!("huff: {msg}");
                had_error = true;
            }
        }
    }

    if had_error {
        Err(())
    } else {
        Ok(())
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}
