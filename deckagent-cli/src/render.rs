//! Plain-text rendering of pipeline state.
//!
//! Pure functions of the current state: nothing here touches the terminal
//! or the pipeline. The REPL decides where and how the text is printed.

use deckagent_core::{AgentStatus, PresentationData, SlideRole};
use std::cmp::Ordering;

const WRAP_WIDTH: usize = 78;

struct Step {
    status: AgentStatus,
    label: &'static str,
    subtext: &'static str,
}

const STEPS: [Step; 2] = [
    Step {
        status: AgentStatus::Researching,
        label: "Conducting Autonomous Research",
        subtext: "Scanning web sources, verifying facts with Google Grounding...",
    },
    Step {
        status: AgentStatus::Synthesizing,
        label: "Synthesizing Executive Summary",
        subtext: "Distilling insights, formatting slides, generating strategic outlook...",
    },
];

/// Progress view for a run in flight. Empty for non-busy statuses.
pub fn render_status(status: AgentStatus, topic: &str) -> String {
    let Some(current) = STEPS.iter().position(|s| s.status == status) else {
        return String::new();
    };

    let mut lines = vec![format!("Agent Active: {}", topic)];
    for (idx, step) in STEPS.iter().enumerate() {
        let marker = match idx.cmp(&current) {
            Ordering::Less => "[ok]",
            Ordering::Equal => "[..]",
            Ordering::Greater => "[  ]",
        };
        lines.push(format!("  {} {}", marker, step.label));
        lines.push(format!("       {}", step.subtext));
    }
    finish(lines)
}

/// Full deck view: every slide, then the numbered source list.
pub fn render_deck(deck: &PresentationData) -> String {
    let mut lines = vec![
        format!("Executive Briefing: {}", deck.topic),
        "=".repeat(WRAP_WIDTH),
    ];

    let total = deck.slides.len();
    for (idx, slide) in deck.slides.iter().enumerate() {
        lines.push(String::new());
        lines.push(match SlideRole::for_index(idx) {
            Some(role) => format!("Slide {}/{} · {}", idx + 1, total, role.heading()),
            None => format!("Slide {}/{}", idx + 1, total),
        });
        lines.push(slide.title.clone());
        lines.push("-".repeat(slide.title.chars().count().min(WRAP_WIDTH)));

        for point in &slide.points {
            lines.extend(wrapped(point, "  • ", "    "));
        }
        if let Some(metric) = &slide.metric {
            lines.push(format!("  Key metric: {}", metric));
        }
        if !slide.summary.is_empty() {
            lines.extend(wrapped(&slide.summary, "  Notes: ", "         "));
        }
    }

    if !deck.sources.is_empty() {
        lines.push(String::new());
        lines.push("Sources".to_string());
        lines.extend(
            deck.sources
                .iter()
                .enumerate()
                .map(|(idx, source)| format!("  [{}] {} <{}>", idx + 1, source.title, source.uri)),
        );
    }
    finish(lines)
}

fn wrapped(text: &str, first: &str, rest: &str) -> Vec<String> {
    let options = textwrap::Options::new(WRAP_WIDTH)
        .initial_indent(first)
        .subsequent_indent(rest);
    textwrap::wrap(text, options)
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}

fn finish(mut lines: Vec<String>) -> String {
    lines.push(String::new());
    lines.join("\n")
}

pub fn render_error(message: &str) -> String {
    format!("! {}", message)
}
