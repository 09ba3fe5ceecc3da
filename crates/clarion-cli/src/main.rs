use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use clarion_application::Orchestrator;
use clarion_core::activity::{ActivityReporter, ChannelActivitySink};
use clarion_core::config::ClarionConfig;
use clarion_core::model::{ConversationContext, Utterance};
use clarion_interaction::Collaborators;

#[derive(Parser)]
#[command(name = "clarion")]
#[command(about = "CLARION - emergency request orchestrator", long_about = None)]
struct Cli {
    /// One request to process; without it an interactive session starts.
    query: Option<String>,

    /// Show the agent activity log after each response.
    #[arg(long)]
    activity: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClarionConfig::from_env();

    if !config.ai_available() {
        eprintln!("note: CEREBRAS_API_KEY not set, AI assistance disabled");
    }
    if !config.search_available() {
        eprintln!("note: EXA_API_KEY not set, web search disabled");
    }

    let collaborators = Collaborators::from_config(&config);
    let (sink, mut activity_rx) = ChannelActivitySink::new();
    let reporter = ActivityReporter::new(Arc::new(sink));
    let orchestrator = Orchestrator::new(config, collaborators, reporter);

    let mut context = ConversationContext::new(Uuid::new_v4());

    match cli.query {
        Some(query) => {
            run_turn(&orchestrator, &mut context, &query, cli.activity, &mut activity_rx).await;
        }
        None => {
            println!("clarion interactive session (empty line to quit)");
            let stdin = io::stdin();
            loop {
                print!("> ");
                io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
                    break;
                }
                run_turn(&orchestrator, &mut context, line.trim(), cli.activity, &mut activity_rx)
                    .await;
            }
        }
    }

    Ok(())
}

async fn run_turn(
    orchestrator: &Orchestrator,
    context: &mut ConversationContext,
    query: &str,
    show_activity: bool,
    activity_rx: &mut tokio::sync::mpsc::UnboundedReceiver<clarion_core::activity::ActivityEvent>,
) {
    let utterance = Utterance::new(query, context.session_id);

    match orchestrator.route(&utterance, context).await {
        Ok(response) => {
            println!("{}", response.summary_text);
            println!(
                "\n[{} | confidence {:.0}%{}]",
                response.specialist,
                response.confidence * 100.0,
                if response.used_fallback {
                    " | answered from local fallback data"
                } else {
                    ""
                }
            );
        }
        Err(err) => {
            eprintln!("error: {err}");
        }
    }

    if show_activity {
        println!("\nactivity:");
        while let Ok(event) = activity_rx.try_recv() {
            println!(
                "  {} {:>8}  {}: {}",
                event.timestamp.format("%H:%M:%S%.3f"),
                event.stage,
                event.agent,
                event.description
            );
        }
    } else {
        // Keep the channel drained so a long session does not hoard
        // events.
        while activity_rx.try_recv().is_ok() {}
    }
}
