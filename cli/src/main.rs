//! pdfsuite CLI - PDF transform and batch-processing tool

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfsuite::compress::{BatchPhase, BatchProgress};
use pdfsuite::render::ThumbnailImage;
use pdfsuite::{
    output_name, ArchiveBundler, ArchiveEntry, BatchInput, CensorOptions, CensorRegion, Color,
    CompressOptions, CompressionLevel, EngineConfig, EngineKind, Fallback, Operation, PageFormat,
    PageSelection, PdfDocument, Permissions, ProtectionOptions, RecentFiles, RetryPolicy,
    Rotation, Toolkit, UniqueNames, WatermarkOptions,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pdfsuite")]
#[command(version)]
#[command(about = "Compress, rotate, reorder, resize, watermark and protect PDF files", long_about = None)]
struct Cli {
    /// Rendering engine used for rasterizing pages
    #[arg(long, global = true, env = "PDFSUITE_ENGINE", default_value = "hayro")]
    engine: EngineKind,

    /// Record processed files in this history file
    #[arg(long, global = true, env = "PDFSUITE_HISTORY", value_name = "FILE")]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress PDF files by rasterizing their pages
    Compress {
        /// Input PDF files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (defaults to each input's directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Compression level
        #[arg(short, long, value_enum, default_value = "medium")]
        level: Level,

        /// Password for encrypted inputs
        #[arg(long)]
        password: Option<String>,

        /// Attempts per file before falling back
        #[arg(long, default_value = "3")]
        attempts: u32,

        /// Stop the whole batch when a file cannot be compressed
        #[arg(long)]
        abort_on_error: bool,

        /// Image re-compression service
        #[arg(long, env = "PDFSUITE_OPTIMIZER_URL", value_name = "URL")]
        optimizer_url: Option<String>,

        /// Also bundle all outputs into this ZIP archive
        #[arg(long, value_name = "FILE")]
        zip: Option<PathBuf>,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rotate pages
    Rotate {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Angle in degrees, rounded to the nearest quarter turn
        #[arg(short, long, default_value = "90", allow_hyphen_values = true)]
        angle: i64,

        /// Page range (e.g., "1-10", "1,3,5"); all pages by default
        #[arg(long)]
        pages: Option<String>,

        /// Password for an encrypted input (the output is written unencrypted)
        #[arg(long)]
        password: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Put pages in a new order
    Reorder {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// New order as a comma-separated list of page numbers (e.g., "3,1,2")
        #[arg(long, value_delimiter = ',', required = true)]
        order: Vec<u32>,

        /// Password for an encrypted input (the output is written unencrypted)
        #[arg(long)]
        password: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Fit every page onto a standard paper format
    Resize {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Paper format (A3, A4, A5, Letter, Legal)
        #[arg(short, long, default_value = "A4")]
        format: PageFormat,

        /// Password for an encrypted input (the output is written unencrypted)
        #[arg(long)]
        password: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Black out regions of pages
    Censor {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Region as PAGE,X,Y,WIDTH,HEIGHT in points from the top-left corner
        #[arg(long = "region", value_name = "REGION", required = true)]
        regions: Vec<String>,

        /// Fill colour
        #[arg(long, default_value = "black")]
        color: Color,

        /// Password for an encrypted input (the output is written unencrypted)
        #[arg(long)]
        password: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Draw a text watermark on every page
    Watermark {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Watermark text
        #[arg(short, long)]
        text: String,

        /// Text colour (name, #rgb or #rrggbb)
        #[arg(long, default_value = "gray")]
        color: Color,

        /// Opacity between 0 and 1
        #[arg(long, default_value = "0.3")]
        opacity: f32,

        /// Font size in points
        #[arg(long, default_value = "48")]
        font_size: f32,

        /// Counter-clockwise angle in degrees
        #[arg(long, default_value = "45", allow_hyphen_values = true)]
        rotation: f32,

        /// Password for an encrypted input (the output is written unencrypted)
        #[arg(long)]
        password: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Encrypt a PDF with a password
    Protect {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Password required to open the document
        #[arg(long)]
        user_password: Option<String>,

        /// Password granting full access (defaults to the user password)
        #[arg(long)]
        owner_password: Option<String>,

        /// Disallow printing
        #[arg(long)]
        no_print: bool,

        /// Disallow copying text and images
        #[arg(long)]
        no_copy: bool,

        /// Disallow modifying the document
        #[arg(long)]
        no_modify: bool,

        /// Password of the input, if it is already encrypted
        #[arg(long)]
        password: Option<String>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Remove password protection
    Unlock {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// User or owner password
        #[arg(short, long)]
        password: String,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render page thumbnails as JPEG files
    Thumbnails {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Pixels per point
        #[arg(long, default_value = "0.2")]
        scale: f32,

        /// Password for an encrypted input
        #[arg(long)]
        password: Option<String>,
    },

    /// Bundle files into a ZIP archive
    Bundle {
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Archive to write
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Deflate level (0-9)
        #[arg(long, default_value = "6")]
        level: i32,
    },

    /// Show document information
    Info {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Password for encrypted documents
        #[arg(long)]
        password: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recently processed files
    History,

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Level {
    /// Best quality (JPEG 95, 2x)
    Low,
    /// Balanced (JPEG 70, 1.5x)
    Medium,
    /// Smallest files (JPEG 40, 1x)
    High,
}

impl From<Level> for CompressionLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => CompressionLevel::Low,
            Level::Medium => CompressionLevel::Medium,
            Level::High => CompressionLevel::High,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let mut history = History::open(cli.history.clone());

    let result = match cli.command {
        Commands::Compress {
            inputs,
            output,
            level,
            password,
            attempts,
            abort_on_error,
            optimizer_url,
            zip,
            json,
        } => {
            let retry = RetryPolicy::new()
                .with_max_attempts(attempts)
                .with_fallback(if abort_on_error {
                    Fallback::Abort
                } else {
                    Fallback::CopyOriginal
                });
            let options = CompressOptions::new()
                .with_level(level.into())
                .with_retry(retry);
            toolkit(cli.engine, optimizer_url.as_deref(), options).and_then(|toolkit| {
                cmd_compress(
                    &toolkit,
                    &inputs,
                    output.as_deref(),
                    password.as_deref(),
                    zip.as_deref(),
                    json,
                    &mut history,
                )
            })
        }
        Commands::Rotate {
            input,
            angle,
            pages,
            password,
            output,
        } => toolkit(cli.engine, None, CompressOptions::new()).and_then(|toolkit| {
            let doc = open_input(&input, password.as_deref())?;
            cmd_rotate(
                &toolkit,
                &doc,
                angle,
                pages.as_deref(),
                &input,
                output.as_deref(),
                &mut history,
            )
        }),
        Commands::Reorder {
            input,
            order,
            password,
            output,
        } => toolkit(cli.engine, None, CompressOptions::new()).and_then(|toolkit| {
            let doc = open_input(&input, password.as_deref())?;
            let result = toolkit.reorder(&doc, &order)?;
            write_output(&input, output.as_deref(), Operation::Edit, &result, &mut history)
        }),
        Commands::Resize {
            input,
            format,
            password,
            output,
        } => toolkit(cli.engine, None, CompressOptions::new()).and_then(|toolkit| {
            let doc = open_input(&input, password.as_deref())?;
            let result = toolkit.resize(&doc, format)?;
            write_output(
                &input,
                output.as_deref(),
                Operation::Resize(format),
                &result,
                &mut history,
            )
        }),
        Commands::Censor {
            input,
            regions,
            color,
            password,
            output,
        } => toolkit(cli.engine, None, CompressOptions::new()).and_then(|toolkit| {
            let regions = regions
                .iter()
                .map(|r| parse_region(r))
                .collect::<Result<Vec<_>, _>>()?;
            let doc = open_input(&input, password.as_deref())?;
            let options = CensorOptions::new().with_color(color);
            let result = toolkit.censor(&doc, &regions, &options)?;
            write_output(&input, output.as_deref(), Operation::Edit, &result, &mut history)
        }),
        Commands::Watermark {
            input,
            text,
            color,
            opacity,
            font_size,
            rotation,
            password,
            output,
        } => {
            let options = WatermarkOptions::new(text)
                .with_color(color)
                .with_opacity(opacity)
                .with_font_size(font_size)
                .with_rotation(rotation);
            open_input(&input, password.as_deref()).and_then(|doc| {
                cmd_watermark(&doc, &options, &input, output.as_deref(), &mut history)
            })
        }
        Commands::Protect {
            input,
            user_password,
            owner_password,
            no_print,
            no_copy,
            no_modify,
            password,
            output,
        } => {
            let permissions = Permissions::all()
                .with_print(!no_print)
                .with_copy(!no_copy)
                .with_modify(!no_modify);
            let mut options = ProtectionOptions::default().with_permissions(permissions);
            if let Some(user) = user_password {
                options = options.with_user_password(user);
            }
            if let Some(owner) = owner_password {
                options = options.with_owner_password(owner);
            }
            open_input(&input, password.as_deref()).and_then(|doc| {
                cmd_protect(&doc, &options, &input, output.as_deref(), &mut history)
            })
        }
        Commands::Unlock {
            input,
            password,
            output,
        } => cmd_unlock(&input, &password, output.as_deref(), &mut history),
        Commands::Thumbnails {
            input,
            output,
            scale,
            password,
        } => toolkit(cli.engine, None, CompressOptions::new()).and_then(|toolkit| {
            let doc = open_input(&input, password.as_deref())?;
            cmd_thumbnails(&toolkit, &doc, &input, output.as_deref(), scale)
        }),
        Commands::Bundle {
            inputs,
            output,
            level,
        } => cmd_bundle(&inputs, &output, level),
        Commands::Info {
            input,
            password,
            json,
        } => cmd_info(&input, password.as_deref(), json),
        Commands::History => {
            cmd_history(&history);
            Ok(())
        }
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    history.save();

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Recently processed files, persisted only when a history file is configured.
struct History {
    path: Option<PathBuf>,
    files: RecentFiles,
}

impl History {
    fn open(path: Option<PathBuf>) -> Self {
        let files = match &path {
            Some(path) => RecentFiles::load(path).unwrap_or_else(|e| {
                log::warn!("ignoring unreadable history {}: {}", path.display(), e);
                RecentFiles::default()
            }),
            None => RecentFiles::default(),
        };
        Self { path, files }
    }

    fn record(&mut self, input: &Path, operation: &str) {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());
        self.files.add(name, Some(operation));
    }

    fn save(&self) {
        if let Some(path) = &self.path {
            if let Err(e) = self.files.save(path) {
                log::warn!("could not save history to {}: {}", path.display(), e);
            }
        }
    }
}

fn toolkit(
    engine: EngineKind,
    optimizer_url: Option<&str>,
    options: CompressOptions,
) -> Result<Toolkit, Box<dyn std::error::Error>> {
    let toolkit = Toolkit::with_engine_config(EngineConfig::new().with_kind(engine))?
        .with_compression(options);
    match optimizer_url {
        #[cfg(feature = "remote-optimize")]
        Some(url) => Ok(toolkit.with_optimizer_config(pdfsuite::OptimizerConfig::new(url))?),
        #[cfg(not(feature = "remote-optimize"))]
        Some(_) => Err("this build does not include the image optimizer client".into()),
        None => Ok(toolkit),
    }
}

/// Open `input`, decrypting it when a password is given.
fn open_input(
    input: &Path,
    password: Option<&str>,
) -> Result<PdfDocument, Box<dyn std::error::Error>> {
    let doc = match password {
        Some(password) => pdfsuite::open_with_password(input, password)?,
        None => pdfsuite::open(input)?,
    };
    Ok(doc)
}

/// Output paths for a batch: `dir` if given, else next to each input.
///
/// Outputs landing in the same directory under the same name get a ` (n)`
/// suffix instead of overwriting each other.
fn batch_output_paths<'a>(
    outputs: impl IntoIterator<Item = (&'a Path, &'a str)>,
    dir: Option<&Path>,
) -> Vec<PathBuf> {
    let mut claimed: HashMap<PathBuf, UniqueNames> = HashMap::new();
    outputs
        .into_iter()
        .map(|(input, name)| {
            let parent = match dir {
                Some(dir) => dir.to_path_buf(),
                None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
            };
            let name = claimed.entry(parent.clone()).or_default().claim(name);
            parent.join(name)
        })
        .collect()
}

/// Where the output for `input` goes: `output` if given, else next to the input.
fn output_path(input: &Path, output: Option<&Path>, op: Operation) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => {
            let name = output_name(&input.to_string_lossy(), op);
            input.with_file_name(name)
        }
    }
}

fn write_output(
    input: &Path,
    output: Option<&Path>,
    op: Operation,
    doc: &PdfDocument,
    history: &mut History,
) -> CliResult {
    let path = output_path(input, output, op);
    doc.save(&path)?;
    history.record(input, operation_label(op));
    println!("{} {}", "Saved to".green(), path.display());
    Ok(())
}

fn operation_label(op: Operation) -> &'static str {
    match op {
        Operation::Compress => "compress",
        Operation::Rotate => "rotate",
        Operation::Edit => "edit",
        Operation::Convert => "convert",
        Operation::Resize(_) => "resize",
        Operation::Watermark => "watermark",
        Operation::Protect => "protect",
        Operation::Unlock => "unlock",
    }
}

fn parse_region(s: &str) -> Result<CensorRegion, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 5 {
        return Err(format!("Invalid region '{}': expected PAGE,X,Y,WIDTH,HEIGHT", s));
    }
    let page: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid page number in region '{}'", s))?;
    let mut numbers = [0f32; 4];
    for (slot, part) in numbers.iter_mut().zip(&parts[1..]) {
        *slot = part
            .parse()
            .map_err(|_| format!("Invalid number '{}' in region '{}'", part, s))?;
    }
    let [x, y, width, height] = numbers;
    Ok(CensorRegion::new(page, x, y, width, height))
}

fn cmd_compress(
    toolkit: &Toolkit,
    inputs: &[PathBuf],
    output: Option<&Path>,
    password: Option<&str>,
    zip: Option<&Path>,
    json: bool,
    history: &mut History,
) -> CliResult {
    let batch = inputs
        .iter()
        .map(|path| {
            let input = BatchInput::from_path(path)?;
            Ok(match password {
                Some(pw) => input.with_password(pw),
                None => input,
            })
        })
        .collect::<pdfsuite::Result<Vec<_>>>()?;

    let pb = ProgressBar::new(batch.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let report = toolkit.compress_batch(batch, |progress: &BatchProgress<'_>| {
        match progress.phase {
            BatchPhase::Started => pb.set_message(progress.name.to_string()),
            BatchPhase::Rendering { page, pages } => {
                pb.set_message(format!("{} (page {}/{})", progress.name, page, pages))
            }
            BatchPhase::Retrying { attempt } => {
                pb.set_message(format!("{} (attempt {})", progress.name, attempt))
            }
            BatchPhase::Compressed | BatchPhase::FellBack => pb.inc(1),
        }
    })?;
    pb.finish_and_clear();

    if let Some(dir) = output {
        fs::create_dir_all(dir)?;
    }
    let paths = batch_output_paths(
        inputs
            .iter()
            .zip(&report.files)
            .map(|(input, outcome)| (input.as_path(), outcome.output_name.as_str())),
        output,
    );

    let mut written = Vec::new();
    for ((input, outcome), path) in inputs.iter().zip(&report.files).zip(paths) {
        fs::write(&path, &outcome.data)?;
        history.record(input, "compress");

        if outcome.is_fallback() {
            let reason = outcome
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();
            println!(
                "{} {} {}",
                "Copied".yellow(),
                path.display(),
                format!("({})", reason).dimmed()
            );
        } else {
            println!(
                "{} {} ({:.1}% saved)",
                "Compressed".green(),
                path.display(),
                outcome.stats.saved_percentage
            );
        }
        written.push(path);
    }

    let stats = &report.stats;
    println!(
        "\n{} {} compressed, {} copied, {:.1}% saved overall",
        "Done!".green().bold(),
        stats.compressed_count,
        stats.fallback_count,
        stats.saved_percentage
    );
    if stats.optimizer_failures > 0 {
        println!(
            "{} optimizer failed on {} page images",
            "Note:".yellow(),
            stats.optimizer_failures
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    }

    if let Some(zip) = zip {
        let entries: Vec<ArchiveEntry> = written.into_iter().map(ArchiveEntry::path).collect();
        let archive = ArchiveBundler::new().bundle(&entries)?;
        archive.save(zip)?;
        println!("{} {}", "Archived to".green(), zip.display());
    }

    Ok(())
}

fn cmd_rotate(
    toolkit: &Toolkit,
    doc: &PdfDocument,
    angle: i64,
    pages: Option<&str>,
    input: &Path,
    output: Option<&Path>,
    history: &mut History,
) -> CliResult {
    let selection = match pages {
        Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?,
        None => PageSelection::All,
    };
    let rotation = Rotation::from_degrees(angle);
    let rotations: BTreeMap<u32, Rotation> = selection
        .resolve(doc.page_count())?
        .into_iter()
        .map(|page| (page, rotation))
        .collect();
    let result = toolkit.rotate(doc, &rotations)?;
    write_output(input, output, Operation::Rotate, &result, history)
}

fn cmd_watermark(
    doc: &PdfDocument,
    options: &WatermarkOptions,
    input: &Path,
    output: Option<&Path>,
    history: &mut History,
) -> CliResult {
    let result = pdfsuite::stamp::apply_watermark(doc, options)?;
    write_output(input, output, Operation::Watermark, &result, history)
}

fn cmd_protect(
    doc: &PdfDocument,
    options: &ProtectionOptions,
    input: &Path,
    output: Option<&Path>,
    history: &mut History,
) -> CliResult {
    let result = pdfsuite::security::protect(doc, options)?;
    write_output(input, output, Operation::Protect, &result, history)
}

fn cmd_unlock(
    input: &Path,
    password: &str,
    output: Option<&Path>,
    history: &mut History,
) -> CliResult {
    let data = fs::read(input)?;
    let result = pdfsuite::security::unlock(data, password)?;
    write_output(input, output, Operation::Unlock, &result, history)
}

fn cmd_thumbnails(
    toolkit: &Toolkit,
    doc: &PdfDocument,
    input: &Path,
    output: Option<&Path>,
    scale: f32,
) -> CliResult {
    let output_dir = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_thumbnails", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(u64::from(doc.page_count()));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut generator =
        pdfsuite::ThumbnailGenerator::with_scale(toolkit.rasterizer(), scale);
    let mut placeholders = 0;
    for thumbnail in generator.generate(doc) {
        match &thumbnail.image {
            ThumbnailImage::Rendered(image) => {
                let path = output_dir.join(format!("page-{:04}.jpg", thumbnail.page));
                fs::write(&path, &image.data)?;
            }
            ThumbnailImage::Placeholder { reason, .. } => {
                pb.println(format!(
                    "{} page {}: {}",
                    "Skipped".yellow(),
                    thumbnail.page,
                    reason
                ));
                placeholders += 1;
            }
        }
        pb.set_position(u64::from(thumbnail.progress.completed));
    }
    pb.finish_and_clear();

    println!(
        "{} {} thumbnails in {} ({} skipped)",
        "Done!".green().bold(),
        doc.page_count() - placeholders,
        output_dir.display(),
        placeholders
    );
    Ok(())
}

fn cmd_bundle(inputs: &[PathBuf], output: &Path, level: i32) -> CliResult {
    let entries: Vec<ArchiveEntry> = inputs.iter().cloned().map(ArchiveEntry::path).collect();
    let archive = ArchiveBundler::new().with_level(level).bundle(&entries)?;
    archive.save(output)?;

    for skipped in &archive.skipped {
        println!("{} {}: {}", "Skipped".yellow(), skipped.name, skipped.reason);
    }
    println!(
        "{} {} files archived to {}",
        "Done!".green().bold(),
        archive.entries.len(),
        output.display()
    );
    Ok(())
}

fn cmd_info(input: &Path, password: Option<&str>, json: bool) -> CliResult {
    let doc = PdfDocument::open_with_password(input, password)?;
    let info = doc.info();

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), info.version);
    println!("{}: {}", "Pages".bold(), info.page_count);
    println!("{}: {} bytes", "Size".bold(), info.size);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if info.encrypted { "Yes" } else { "No" }
    );
    println!(
        "{}: {}",
        "Linearized".bold(),
        if info.linearized { "Yes" } else { "No" }
    );

    if let Some(ref title) = info.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = info.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = info.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = info.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = info.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = info.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for page in doc.pages() {
        let (w, h) = page.display_size();
        println!(
            "  {:>4}  {:>7.1} x {:<7.1} pt  {}",
            page.number,
            w,
            h,
            page.rotation.to_string().dimmed()
        );
    }

    Ok(())
}

fn cmd_history(history: &History) {
    if history.files.is_empty() {
        println!("{}", "No recent files".dimmed());
        return;
    }
    for entry in history.files.entries() {
        println!(
            "{}  {}  {}",
            entry.used_at.format("%Y-%m-%d %H:%M"),
            entry.name,
            entry.operation.as_deref().unwrap_or("").dimmed()
        );
    }
}

fn cmd_version() {
    println!("{} {}", "pdfsuite".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF transform and batch-processing tool");
    println!();
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() {
        let region = parse_region("2, 10, 20.5, 30, 40").unwrap();
        assert_eq!(region, CensorRegion::new(2, 10.0, 20.5, 30.0, 40.0));
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("x,1,2,3,4").is_err());
    }

    #[test]
    fn test_output_path_defaults_next_to_input() {
        let path = output_path(Path::new("in/scan.pdf"), None, Operation::Rotate);
        assert_eq!(path, PathBuf::from("in/scan_rotado.pdf"));
        let path = output_path(Path::new("scan.pdf"), Some(Path::new("x.pdf")), Operation::Rotate);
        assert_eq!(path, PathBuf::from("x.pdf"));
    }

    #[test]
    fn test_batch_outputs_never_collide() {
        let paths = batch_output_paths(
            [
                (Path::new("jan/report.pdf"), "report_comprimido.pdf"),
                (Path::new("feb/report.pdf"), "report_comprimido.pdf"),
                (Path::new("feb/other.pdf"), "other_comprimido.pdf"),
            ],
            Some(Path::new("out")),
        );
        assert_eq!(
            paths,
            [
                PathBuf::from("out/report_comprimido.pdf"),
                PathBuf::from("out/report_comprimido (1).pdf"),
                PathBuf::from("out/other_comprimido.pdf"),
            ]
        );

        // Next to the inputs, only same-directory duplicates are renamed.
        let paths = batch_output_paths(
            [
                (Path::new("jan/report.pdf"), "report_comprimido.pdf"),
                (Path::new("feb/report.pdf"), "report_comprimido.pdf"),
                (Path::new("feb/report.pdf"), "report_comprimido.pdf"),
            ],
            None,
        );
        assert_eq!(
            paths,
            [
                PathBuf::from("jan/report_comprimido.pdf"),
                PathBuf::from("feb/report_comprimido.pdf"),
                PathBuf::from("feb/report_comprimido (1).pdf"),
            ]
        );
    }

    #[test]
    fn test_password_flag_on_single_file_commands() {
        for args in [
            &["pdfsuite", "rotate", "a.pdf", "--password", "pw"][..],
            &["pdfsuite", "reorder", "a.pdf", "--order", "2,1", "--password", "pw"],
            &["pdfsuite", "watermark", "a.pdf", "-t", "DRAFT", "--password", "pw"],
            &["pdfsuite", "protect", "a.pdf", "--user-password", "new", "--password", "pw"],
            &["pdfsuite", "resize", "a.pdf", "--password", "pw"],
            &["pdfsuite", "thumbnails", "a.pdf", "--password", "pw"],
        ] {
            let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
            let password = match cli.command {
                Commands::Rotate { password, .. }
                | Commands::Reorder { password, .. }
                | Commands::Watermark { password, .. }
                | Commands::Protect { password, .. }
                | Commands::Resize { password, .. }
                | Commands::Thumbnails { password, .. } => password,
                _ => unreachable!(),
            };
            assert_eq!(password.as_deref(), Some("pw"));
        }
    }

    #[test]
    fn test_open_input_with_password() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("locked.pdf");
        let doc = pdfsuite::open_bytes(&one_page_pdf()).unwrap();
        pdfsuite::security::protect(&doc, &ProtectionOptions::new("secret"))
            .unwrap()
            .save(&path)
            .unwrap();

        assert!(open_input(&path, None).is_err());
        let opened = open_input(&path, Some("secret")).unwrap();
        assert_eq!(opened.page_count(), 1);
    }

    fn one_page_pdf() -> Vec<u8> {
        use lopdf::{dictionary, Document, Object};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "pdfsuite", "compress", "a.pdf", "b.pdf", "--level", "high", "--attempts", "2",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Compress { .. }));

        let cli = Cli::try_parse_from(["pdfsuite", "rotate", "a.pdf", "--angle", "-90"]).unwrap();
        assert!(matches!(cli.command, Commands::Rotate { angle: -90, .. }));
    }
}
