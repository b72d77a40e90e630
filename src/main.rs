use anyhow::Context;
use clap::{Parser, Subcommand};
use rfslides::{realtime, PageEvent, SlideshowConfig};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rfslides", version, about = "Rotate images and dismiss flash messages on a headless page")]
struct Cli {
    /// HTML page to load (defaults to the bundled demo page)
    #[arg(long, global = true)]
    page: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Advance virtual time and print the resulting events
    Simulate {
        /// Virtual milliseconds to simulate
        #[arg(long, default_value_t = 60_000)]
        for_ms: u64,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
        /// Print the final document as HTML
        #[arg(long)]
        dump: bool,
    },
    /// Drive the page in real time until Ctrl-C or the limit
    Run {
        #[arg(long)]
        for_secs: Option<u64>,
        #[arg(long)]
        json: bool,
    },
}

fn print_event(ev: &PageEvent, json: bool) {
    if json {
        match serde_json::to_string(ev) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("failed to serialize event: {}", e),
        }
        return;
    }
    match ev {
        PageEvent::ImageShown { at, src } => println!("{:>8}ms  show     {}", at, src),
        PageEvent::DisplayMissing { at } => println!("{:>8}ms  missing  (no display target)", at),
        PageEvent::Faded { at, node } => println!("{:>8}ms  fade     node {}", at, node),
        PageEvent::Removed { at, node } => println!("{:>8}ms  remove   node {}", at, node),
        PageEvent::RemovalSkipped { at, node } => println!("{:>8}ms  skip     node {} (already gone)", at, node),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SlideshowConfig::from_file(path).with_context(|| format!("loading config {}", path.display()))?,
        None => SlideshowConfig::default(),
    };
    let mut page = rfslides::new_page(config, cli.page.as_deref()).context("loading page")?;

    match cli.command {
        Command::Simulate { for_ms, json, dump } => {
            page.on_event(move |ev| print_event(ev, json));
            page.advance(for_ms);
            if dump {
                println!("{}", page.document().to_html());
            }
        }
        Command::Run { for_secs, json } => {
            page.on_event(move |ev| print_event(ev, json));
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().context("building runtime")?;
            let reason = rt.block_on(async {
                let (tx, rx) = tokio::sync::oneshot::channel();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        let _ = tx.send(());
                    }
                });
                realtime::drive(&mut page, for_secs.map(Duration::from_secs), rx).await
            });
            log::info!("stopped: {:?}", reason);
        }
    }
    Ok(())
}
