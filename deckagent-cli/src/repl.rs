//! Single-topic and interactive runs of the research pipeline.

use crate::render;
use crossterm::style::Stylize;
use deckagent_core::{
    AgentStatus, DeckConfig, GroundedResearchProvider, Pipeline, PipelineCallback, PipelineState,
};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use std::process::ExitCode;
use std::sync::Arc;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Prints the progress view to stderr on every busy transition.
pub(crate) struct TerminalCallback {
    quiet: bool,
}

#[async_trait::async_trait]
impl PipelineCallback for TerminalCallback {
    async fn on_status_change(&self, state: &PipelineState) {
        if self.quiet {
            return;
        }
        let view = render::render_status(state.status, &state.topic);
        if !view.is_empty() {
            eprintln!("\n{}", view.trim_end().cyan());
        }
    }
}

fn build_pipeline(config: &DeckConfig, options: OutputOptions) -> anyhow::Result<Pipeline> {
    let provider = GroundedResearchProvider::from_config(config)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    let callback = Arc::new(TerminalCallback {
        quiet: options.quiet || options.json,
    });
    Ok(Pipeline::new(Arc::new(provider), callback))
}

fn print_outcome(state: &PipelineState, options: OutputOptions) -> anyhow::Result<()> {
    if options.json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }
    match (&state.status, &state.result, &state.error) {
        (AgentStatus::Complete, Some(deck), _) => {
            println!("\n{}", render::render_deck(deck));
        }
        (AgentStatus::Error, _, Some(message)) => {
            eprintln!("\n{}", render::render_error(message).red());
        }
        _ => {}
    }
    Ok(())
}

/// Run `topic` to completion and print the outcome.
///
/// Returns `false` when the run ended in ERROR.
pub(crate) async fn research_topic(
    pipeline: &mut Pipeline,
    topic: &str,
    options: OutputOptions,
) -> anyhow::Result<bool> {
    if !pipeline.begin(topic) {
        anyhow::bail!("Topic must not be empty");
    }
    pipeline.run().await;
    print_outcome(pipeline.state(), options)?;
    Ok(pipeline.status() != AgentStatus::Error)
}

/// Research one topic and print the deck. A failed run maps to a non-zero exit code.
pub async fn run_single_topic(
    topic: &str,
    config: DeckConfig,
    options: OutputOptions,
) -> anyhow::Result<ExitCode> {
    let mut pipeline = build_pipeline(&config, options)?;
    if research_topic(&mut pipeline, topic, options).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Prompt for topics until the user quits.
pub async fn run_interactive(config: DeckConfig, options: OutputOptions) -> anyhow::Result<()> {
    let mut pipeline = build_pipeline(&config, options)?;
    let theme = ColorfulTheme::default();

    println!(
        "{}\n{}\n",
        "Research any technical topic. Instantly.".bold(),
        "The agent researches the web, synthesizes findings, and builds an executive deck."
            .dark_grey()
    );

    while let Some(topic) = prompt_topic(&theme, &config.ui.suggestions)? {
        if topic.trim().is_empty() {
            continue;
        }
        if research_topic(&mut pipeline, &topic, options).await? {
            let again = Confirm::with_theme(&theme)
                .with_prompt("Research another topic?")
                .default(true)
                .interact()?;
            if !again {
                break;
            }
            pipeline.reset();
        }
    }
    Ok(())
}

/// Ask for a topic. `None` means the user chose to quit.
fn prompt_topic(theme: &ColorfulTheme, suggestions: &[String]) -> anyhow::Result<Option<String>> {
    let mut items: Vec<&str> = suggestions.iter().map(String::as_str).collect();
    let custom_idx = items.len();
    items.push("Enter a custom topic...");
    items.push("Quit");

    let choice = Select::with_theme(theme)
        .with_prompt("What should the agent research?")
        .items(&items)
        .default(custom_idx)
        .interact()?;

    if choice < custom_idx {
        return Ok(Some(suggestions[choice].clone()));
    }
    if choice > custom_idx {
        return Ok(None);
    }

    let topic: String = Input::with_theme(theme)
        .with_prompt("Topic (e.g., The Future of Solid State Batteries)")
        .allow_empty(true)
        .interact_text()?;
    Ok(Some(topic))
}
