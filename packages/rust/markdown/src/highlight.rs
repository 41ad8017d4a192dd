//! Syntax highlighting for fenced code blocks.
//!
//! The engine (syntax set + theme) is expensive to build, so a single
//! process-wide instance is initialized lazily on first use and shared by
//! every call; `LazyLock` guarantees one-time initialization even under
//! concurrent first access. Failures never escape: code that cannot be
//! highlighted renders as an escaped plain block instead.

use std::sync::LazyLock;

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxReference, SyntaxSet};
use tracing::{debug, warn};

/// The fixed theme every fragment is rendered with.
const THEME: &str = "base16-ocean.dark";

/// Fence tags normalized to a language the engine has a grammar for.
/// Token lookup already covers names and file extensions (`rust`, `rs`,
/// `py`, `yml`); this table catches the web-stack tags the bundled syntax
/// set cannot match, mapped to their nearest grammar.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("ts", "javascript"),
    ("tsx", "javascript"),
    ("jsx", "javascript"),
    ("mjs", "javascript"),
    ("shell", "bash"),
    ("console", "bash"),
    ("zsh", "bash"),
];

struct Engine {
    syntaxes: SyntaxSet,
    theme: Theme,
}

static ENGINE: LazyLock<Engine> = LazyLock::new(|| {
    let syntaxes = SyntaxSet::load_defaults_newlines();
    let mut themes = ThemeSet::load_defaults();
    let theme = themes.themes.remove(THEME).expect("bundled theme");
    debug!(
        syntaxes = syntaxes.syntaxes().len(),
        theme = THEME,
        "highlight engine initialized"
    );
    Engine { syntaxes, theme }
});

impl Engine {
    /// Resolve a fence tag to a grammar, falling back to plain text for
    /// anything the engine does not know.
    fn syntax_for(&self, language: Option<&str>) -> &SyntaxReference {
        let Some(tag) = language else {
            return self.syntaxes.find_syntax_plain_text();
        };

        let canonical = LANGUAGE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == tag)
            .map_or(tag, |(_, canonical)| *canonical);

        match self.syntaxes.find_syntax_by_token(canonical) {
            Some(syntax) => syntax,
            None => {
                debug!(tag, "no grammar for language tag, rendering plain");
                self.syntaxes.find_syntax_plain_text()
            }
        }
    }
}

/// Highlight a code fragment per the fixed theme, returning an HTML
/// `<pre>` fragment.
///
/// `language` is the lowercased fence tag; `None` and unrecognized tags
/// render as plain text. Never fails: an engine error degrades to an
/// escaped, unstyled block.
pub fn highlight(code: &str, language: Option<&str>) -> String {
    let engine = &*ENGINE;
    let syntax = engine.syntax_for(language);

    match highlighted_html_for_string(code, &engine.syntaxes, syntax, &engine.theme) {
        Ok(html) => html,
        Err(e) => {
            warn!(
                language = language.unwrap_or("none"),
                error = %e,
                "highlighting failed, rendering plain block"
            );
            plain_code_block(code)
        }
    }
}

/// Escaped, unhighlighted rendering used when the engine itself fails.
pub(crate) fn plain_code_block(code: &str) -> String {
    format!("<pre><code>{}</code></pre>\n", escape_html(code))
}

/// Minimal HTML escape for text destined for a `<pre>` block.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_language_produces_styled_markup() {
        let html = highlight("fn main() {}\n", Some("rust"));
        assert!(html.contains("<pre"));
        assert!(html.contains("main"));
        assert!(html.contains("style="));
    }

    #[test]
    fn alias_matches_canonical_language() {
        let code = "const x = () => 1;\n";
        assert_eq!(highlight(code, Some("ts")), highlight(code, Some("javascript")));
        assert_eq!(highlight(code, Some("jsx")), highlight(code, Some("javascript")));
    }

    #[test]
    fn unrecognized_language_renders_like_untagged() {
        let code = "some opaque text\n";
        assert_eq!(highlight(code, Some("zzz-no-such-lang")), highlight(code, None));
    }

    #[test]
    fn code_is_escaped_in_output() {
        let html = highlight("<b>&</b>\n", None);
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;b&gt;"));
    }

    #[test]
    fn highlighting_is_deterministic() {
        let code = "let answer = 42;\n";
        assert_eq!(highlight(code, Some("rust")), highlight(code, Some("rust")));
    }

    #[test]
    fn plain_block_escapes_markup() {
        let html = plain_code_block("<script>alert(1)</script>");
        assert!(html.starts_with("<pre><code>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
