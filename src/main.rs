use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use gitlab_emoji::{Awardable, EmojiEvent, decode_event, encode_event, summarize};
use tracing::{Level, error, info, warn};

/// Decode a GitLab emoji webhook payload and print it in canonical form.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Payload file; reads stdin when omitted or `-`
    input: Option<PathBuf>,

    #[arg(short, long)]
    pretty: bool,

    /// Print a one-line summary instead of the re-encoded payload
    #[arg(short, long)]
    summary: bool,

    #[arg(short, long, env = "GITLAB_EMOJI_LOG", default_value = "warn")]
    log_level: Level,
}

fn read_input(input: Option<&PathBuf>) -> anyhow::Result<Vec<u8>> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        _ => {
            let mut body = Vec::new();
            io::stdin()
                .read_to_end(&mut body)
                .context("failed to read stdin")?;
            Ok(body)
        }
    }
}

fn log_event(event: &EmojiEvent) {
    info!(
        "Received {} event ({:?} payload)",
        event.object_kind,
        event.revision()
    );

    match event.awardable() {
        Some(Awardable::Issue(issue)) => {
            info!("Award on issue #{}: {} ({})", issue.iid, issue.title, issue.state);
        }
        Some(Awardable::WorkItem(item)) => {
            info!("Award on {} #{}: {} ({})", item.kind, item.iid, item.title, item.state);
        }
        Some(Awardable::Note(note)) => {
            info!("Award on note {} ({})", note.id, note.noteable_type);
        }
        Some(Awardable::MergeRequest(mr)) => {
            info!("Award on merge request !{}: {} ({})", mr.iid, mr.title, mr.state);
        }
        None => {
            warn!("Emoji event carries no awardable object");
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let body = read_input(args.input.as_ref())?;
    let event = decode_event(&body)?;
    log_event(&event);

    if args.summary {
        println!("{}", summarize(&event));
    } else {
        println!("{}", encode_event(&event, args.pretty)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
