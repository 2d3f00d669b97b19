use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

use kakijun::{
    Artifact, ExecutorKind, ExecutorSettings, Graph, GlyphSource, GlyphSourceOpts, NodeId,
    RasterOpts,
};

#[derive(Parser, Debug)]
#[command(name = "kakijun", version)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a character and write its baked, stroke-indexed SVG.
    Bake(BakeArgs),
    /// Evaluate one node of a graph file to SVG or PNG.
    Eval(EvalArgs),
    /// Count the visible strokes of an SVG document.
    Count(CountArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Directory holding `<codepoint>.svg` glyph files.
    #[arg(long, default_value = "kanji")]
    local_root: PathBuf,

    /// Remote base URL tried before the local directory.
    #[arg(long)]
    remote_base: Option<String>,

    /// Only use the local directory.
    #[arg(long)]
    offline: bool,

    /// Per-tier fetch timeout in milliseconds.
    #[arg(long, default_value_t = 6000)]
    timeout_ms: u64,
}

impl SourceArgs {
    fn opts(&self) -> GlyphSourceOpts {
        let defaults = GlyphSourceOpts::default();
        GlyphSourceOpts {
            remote_base: if self.offline {
                None
            } else {
                self.remote_base.clone().or(defaults.remote_base)
            },
            local_root: self.local_root.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            ..defaults
        }
    }
}

#[derive(Parser, Debug)]
struct BakeArgs {
    /// Character to resolve.
    #[arg(long = "char")]
    ch: String,

    /// Tag leaves in place instead of regrouping them per stroke.
    #[arg(long)]
    annotate: bool,

    /// Output SVG path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Parser, Debug)]
struct EvalArgs {
    /// Graph JSON file.
    #[arg(long)]
    graph: PathBuf,

    /// Node to evaluate.
    #[arg(long)]
    target: String,

    /// Output path; `.png` rasterizes, anything else writes SVG (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Executor to evaluate with.
    #[arg(long, value_enum, default_value_t = ExecutorChoice::Fallback)]
    executor: ExecutorChoice,

    /// PNG canvas edge in pixels.
    #[arg(long, default_value_t = 512)]
    size: u32,

    /// PNG background color (`#rgb`, `#rrggbb`, `#rrggbbaa`).
    #[arg(long, default_value = "#ffffff")]
    background: String,

    /// Stroke color for glyph nodes without one.
    #[arg(long, default_value = "#000000")]
    stroke_color: String,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Parser, Debug)]
struct CountArgs {
    /// Input SVG document.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExecutorChoice {
    InProcess,
    Worker,
    Fallback,
}

impl From<ExecutorChoice> for ExecutorKind {
    fn from(c: ExecutorChoice) -> Self {
        match c {
            ExecutorChoice::InProcess => ExecutorKind::InProcess,
            ExecutorChoice::Worker => ExecutorKind::Worker,
            ExecutorChoice::Fallback => ExecutorKind::Fallback,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Bake(args) => cmd_bake(args),
        Command::Eval(args) => cmd_eval(args),
        Command::Count(args) => cmd_count(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn cmd_bake(args: BakeArgs) -> anyhow::Result<()> {
    let source = GlyphSource::new(args.source.opts());
    let glyph = source
        .resolve(&args.ch)
        .with_context(|| format!("resolve glyph {:?}", args.ch))?;
    let svg = if args.annotate {
        kakijun::annotate(&glyph.source, true).context("annotate glyph")?
    } else {
        let baked = kakijun::bake(&glyph.source).context("bake glyph")?;
        eprintln!("{}: {} strokes", glyph.codepoint_id, baked.count);
        baked.svg
    };
    write_svg(args.out.as_deref(), &svg)
}

fn cmd_eval(args: EvalArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.graph)
        .with_context(|| format!("read graph '{}'", args.graph.display()))?;
    let graph = Graph::from_json(&text)
        .with_context(|| format!("load graph '{}'", args.graph.display()))?;
    let target = NodeId::from(args.target.as_str());
    if !graph.contains(&target) {
        anyhow::bail!("graph has no node '{target}'");
    }

    let mut settings = ExecutorSettings {
        glyphs: args.source.opts(),
        ..ExecutorSettings::default()
    };
    settings.eval.stroke_color = args.stroke_color.clone();
    let executor = kakijun::create_executor(args.executor.into(), &settings);
    let artifact = executor
        .evaluate(&graph, &target)
        .with_context(|| format!("evaluate '{target}'"))?
        .with_context(|| format!("node '{target}' produced no artifact"))?;

    match args.out.as_deref() {
        Some(path) if has_png_extension(path) => {
            let opts = RasterOpts {
                size: args.size,
                background: kakijun::export::parse_hex_color(&args.background)?,
            };
            let png = kakijun::rasterize_png(&artifact, &opts).context("rasterize artifact")?;
            create_parent(path)?;
            std::fs::write(path, png)
                .with_context(|| format!("write png '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
            Ok(())
        }
        out => write_svg(out, &artifact),
    }
}

fn cmd_count(args: CountArgs) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read '{}'", args.in_path.display()))?;
    println!("{}", kakijun::ops::count_visible_strokes(&Artifact::from(text)));
    Ok(())
}

fn has_png_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn write_svg(out: Option<&Path>, svg: &Artifact) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            create_parent(path)?;
            std::fs::write(path, svg.as_str())
                .with_context(|| format!("write svg '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{svg}"),
    }
    Ok(())
}
