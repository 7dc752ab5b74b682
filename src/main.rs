//! dtext CLI - render DText markup to HTML

use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;
use dtext::Options;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dtext")]
#[command(version, about = "Render DText markup to HTML", long_about = None)]
#[command(after_help = "EXAMPLES:
    dtext post.dtext              Render a file to HTML
    dtext --strip < post.dtext    Render stdin as plain text
    dtext --refs post.dtext       Also print referenced entities as JSON on stderr")]
struct Cli {
    /// Input file; reads stdin when omitted or `-`
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Output escaped plain text instead of HTML
    #[arg(short, long)]
    strip: bool,

    /// Parse the input as one inline run, without block structure
    #[arg(short, long)]
    inline: bool,

    /// Leave @mentions as plain text
    #[arg(long)]
    no_mentions: bool,

    /// Render [color] tags
    #[arg(short = 'c', long)]
    allow_color: bool,

    /// Rich thumbnail embeds allowed per document
    #[arg(long, value_name = "N", default_value_t = Options::default().max_thumbs)]
    max_thumbs: usize,

    /// Print mentions, wiki titles and embedded post ids as JSON on stderr
    #[arg(long)]
    refs: bool,
}

impl Cli {
    fn options(&self) -> Options {
        Options {
            strip: self.strip,
            inline: self.inline,
            disable_mentions: self.no_mentions,
            allow_color: self.allow_color,
            max_thumbs: self.max_thumbs,
        }
    }
}

fn run(cli: &Cli) -> io::Result<()> {
    // Input need not be UTF-8; the engine replaces invalid sequences.
    let input = match cli.input.as_deref() {
        Some(path) if path != "-" => std::fs::read(path)?,
        _ => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let rendered = dtext::parse(&input, &cli.options()).map_err(io::Error::other)?;
    io::stdout().write_all(rendered.html.as_bytes())?;

    if cli.refs {
        let json = serde_json::to_string(&rendered.references).map_err(io::Error::other)?;
        writeln!(io::stderr(), "{json}")?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "render failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
