//! Markdown body rendering over the `pulldown-cmark` event stream.
//!
//! Two passes: the first walks the stream collecting heading text and
//! fenced code blocks; fences are then highlighted concurrently on
//! blocking tasks. The second pass rebuilds the stream with heading ids
//! injected and highlighted fragments substituted for each fence, so the
//! final markup keeps exact source order.

use std::collections::{HashMap, HashSet};

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use tracing::warn;

use crate::Heading;
use crate::highlight;

/// Markdown extensions enabled for document bodies.
fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Rendered body markup plus the headings side channel.
#[derive(Debug, Clone)]
pub(crate) struct Rendered {
    pub html: String,
    pub headings: Vec<Heading>,
}

/// Render a markdown body to HTML with anchored headings and highlighted
/// fences.
pub(crate) async fn render(body: &str) -> Rendered {
    let events: Vec<Event<'_>> = Parser::new_ext(body, parser_options()).collect();

    let headings = collect_headings(&events);
    let fences = collect_fences(&events);
    let fragments = highlight_fences(&fences).await;

    let mut out: Vec<Event<'_>> = Vec::with_capacity(events.len());
    let mut heading_idx = 0;
    let mut fence_idx = 0;
    let mut iter = events.into_iter();
    while let Some(event) = iter.next() {
        match event {
            Event::Start(Tag::Heading {
                level,
                classes,
                attrs,
                ..
            }) => {
                let id = headings[heading_idx].id.clone();
                heading_idx += 1;
                out.push(Event::Start(Tag::Heading {
                    level,
                    id: Some(id.into()),
                    classes,
                    attrs,
                }));
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                // Swallow the fence body; the highlighted fragment replaces
                // the whole block.
                for inner in iter.by_ref() {
                    if matches!(inner, Event::End(TagEnd::CodeBlock)) {
                        break;
                    }
                }
                out.push(Event::Html(fragments[fence_idx].clone().into()));
                fence_idx += 1;
            }
            other => out.push(other),
        }
    }

    let mut markup = String::with_capacity(body.len() * 2);
    html::push_html(&mut markup, out.into_iter());

    Rendered {
        html: markup,
        headings,
    }
}

// ---------------------------------------------------------------------------
// Pass one: headings and fences
// ---------------------------------------------------------------------------

/// Collect headings in document order, assigning each a stable anchor id.
fn collect_headings(events: &[Event<'_>]) -> Vec<Heading> {
    let mut anchors = AnchorAssigner::default();
    let mut headings = Vec::new();

    let mut idx = 0;
    while idx < events.len() {
        if let Event::Start(Tag::Heading { level, .. }) = &events[idx] {
            let mut text = String::new();
            let mut end = idx + 1;
            while end < events.len() {
                match &events[end] {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) => text.push_str(t),
                    Event::Code(c) => text.push_str(c),
                    Event::SoftBreak | Event::HardBreak => text.push(' '),
                    _ => {}
                }
                end += 1;
            }

            let text = text.trim().to_string();
            headings.push(Heading {
                id: anchors.assign(&text),
                text,
                level: heading_level(*level),
            });
            idx = end;
        }
        idx += 1;
    }
    headings
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Deterministic anchor ids: slugified heading text, repeats suffixed with
/// a counter. The free-slot scan keeps suffixed ids from colliding with an
/// anchor some other heading produced outright ("Example 1" vs a repeated
/// "Example").
#[derive(Default)]
struct AnchorAssigner {
    counts: HashMap<String, usize>,
    used: HashSet<String>,
}

impl AnchorAssigner {
    fn assign(&mut self, text: &str) -> String {
        let base = match slug::slugify(text) {
            s if s.is_empty() => "section".to_string(),
            s => s,
        };

        let mut count = self.counts.get(&base).copied().unwrap_or(0);
        let chosen = loop {
            let candidate = if count == 0 {
                base.clone()
            } else {
                format!("{base}-{count}")
            };
            count += 1;
            if self.used.insert(candidate.clone()) {
                break candidate;
            }
        };
        self.counts.insert(base, count);
        chosen
    }
}

/// A fenced code block awaiting highlighting.
struct Fence {
    language: Option<String>,
    code: String,
}

/// Collect fenced blocks in document order. Indented code blocks keep the
/// default rendering and are not collected.
fn collect_fences(events: &[Event<'_>]) -> Vec<Fence> {
    let mut fences = Vec::new();

    let mut idx = 0;
    while idx < events.len() {
        if let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) = &events[idx] {
            let mut code = String::new();
            let mut end = idx + 1;
            while end < events.len() {
                match &events[end] {
                    Event::End(TagEnd::CodeBlock) => break,
                    Event::Text(t) => code.push_str(t),
                    _ => {}
                }
                end += 1;
            }
            fences.push(Fence {
                language: language_tag(info),
                code,
            });
            idx = end;
        }
        idx += 1;
    }
    fences
}

/// Language tag from a fence info string: the text before the first comma
/// or whitespace, lowercased (` ```rust,no_run ` tags `rust`).
fn language_tag(info: &str) -> Option<String> {
    let tag = info.split([',', ' ', '\t']).next().unwrap_or("").trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_ascii_lowercase())
    }
}

/// Highlight all fences concurrently; fragments come back in source order.
async fn highlight_fences(fences: &[Fence]) -> Vec<String> {
    let mut jobs = Vec::with_capacity(fences.len());
    for fence in fences {
        let code = fence.code.clone();
        let language = fence.language.clone();
        jobs.push(tokio::task::spawn_blocking(move || {
            highlight::highlight(&code, language.as_deref())
        }));
    }

    let mut fragments = Vec::with_capacity(fences.len());
    for (job, fence) in jobs.into_iter().zip(fences) {
        match job.await {
            Ok(fragment) => fragments.push(fragment),
            Err(e) => {
                warn!(error = %e, "highlight task failed, rendering plain block");
                fragments.push(highlight::plain_code_block(&fence.code));
            }
        }
    }
    fragments
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
