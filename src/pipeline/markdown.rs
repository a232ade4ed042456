//! Markdown → standalone HTML document.
//!
//! `pulldown-cmark` produces the body; the body and the assembled stylesheet
//! are then substituted into an HTML template with `{{ name }}` placeholders.
//! The stylesheet and template are loaded once per run by
//! [`HtmlTemplate::from_config`] and reused for every file.
//!
//! Fenced code blocks are highlighted with `syntect` into inline-styled
//! HTML, so no highlighting stylesheet is needed. Blocks in a language
//! syntect does not know stay plain `<pre><code>`.

use crate::config::ConversionConfig;
use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use tracing::{debug, warn};

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// syntect theme used for fenced code blocks.
pub const CODE_THEME: &str = "InspiredGitHub";

/// Used when no configured stylesheet could be read.
pub const BUILTIN_CSS: &str = r#"
body {
    font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif;
    line-height: 1.6;
    color: #24292e;
    max-width: 100%;
    margin: 0 auto;
}
h1, h2, h3, h4, h5, h6 { margin-top: 1.4em; margin-bottom: 0.6em; line-height: 1.25; }
h1 { font-size: 2em; border-bottom: 1px solid #eaecef; padding-bottom: 0.3em; }
h2 { font-size: 1.5em; border-bottom: 1px solid #eaecef; padding-bottom: 0.3em; }
code { font-family: "SFMono-Regular", Consolas, Menlo, monospace; background: #f6f8fa; padding: 0.2em 0.4em; border-radius: 3px; }
pre { background: #f6f8fa; padding: 1em; overflow: auto; border-radius: 6px; }
pre code { background: none; padding: 0; }
blockquote { margin: 0; padding: 0 1em; color: #6a737d; border-left: 0.25em solid #dfe2e5; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #dfe2e5; padding: 6px 13px; }
tr:nth-child(2n) { background: #f6f8fa; }
img { max-width: 100%; }
"#;

/// Appended after the user stylesheets; `margin` and `base_font_size` are
/// filled from the configuration.
pub const PRINT_CSS_TEMPLATE: &str = r#"
@media print {
    @page { margin: {{ margin }}; }
    body { font-size: {{ base_font_size }}px; }
    pre, blockquote, table, img { page-break-inside: avoid; }
    h1, h2, h3 { page-break-after: avoid; }
}
"#;

/// Extra rules for `--compact`.
const COMPACT_CSS: &str = r#"
@media print {
    p, ul, ol, pre, table { margin-top: 0.4em; margin-bottom: 0.4em; }
    h1, h2, h3, h4 { margin-top: 0.8em; margin-bottom: 0.4em; }
}
"#;

/// Used when no template file is configured or it cannot be read.
pub const BUILTIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
{{ css_content }}
</style>
</head>
<body>
<article class="markdown-body">
{{ html_content }}
</article>
</body>
</html>
"#;

/// A loaded stylesheet plus HTML template.
#[derive(Debug, Clone)]
pub struct HtmlTemplate {
    css: String,
    template: String,
}

impl HtmlTemplate {
    pub fn new(css: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            template: template.into(),
        }
    }

    /// Load stylesheets and the template named by `config`, falling back to
    /// the built-in ones.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let mut css = load_stylesheets(&config.effective_css_sources());
        if css.trim().is_empty() {
            debug!("No stylesheet loaded, using built-in CSS");
            css = BUILTIN_CSS.to_string();
        }
        css.push_str(&print_css(config.print_margin(), config.font_size, config.compact));

        let template = config
            .effective_template()
            .and_then(|path| match std::fs::read_to_string(&path) {
                Ok(t) if !t.trim().is_empty() => Some(t),
                Ok(_) => {
                    warn!("Template '{}' is empty, using built-in template", path.display());
                    None
                }
                Err(e) => {
                    warn!(
                        "Template '{}' not readable ({e}), using built-in template",
                        path.display()
                    );
                    None
                }
            })
            .unwrap_or_else(|| BUILTIN_TEMPLATE.to_string());

        Self { css, template }
    }

    pub fn css(&self) -> &str {
        &self.css
    }

    /// Render `markdown` into a complete HTML document.
    pub fn render(&self, markdown: &str) -> String {
        let body = markdown_to_html(markdown);
        fill_template(
            &self.template,
            &[("css_content", &self.css), ("html_content", &body)],
        )
    }
}

impl Default for HtmlTemplate {
    fn default() -> Self {
        Self::new(
            format!("{BUILTIN_CSS}{}", print_css("0.5in", 16, false)),
            BUILTIN_TEMPLATE,
        )
    }
}

fn load_stylesheets(paths: &[PathBuf]) -> String {
    let mut css = String::new();
    for path in paths {
        match std::fs::read_to_string(path) {
            Ok(sheet) => {
                css.push_str(&sheet);
                css.push('\n');
            }
            Err(e) => warn!("Stylesheet '{}' not readable ({e}), skipping", path.display()),
        }
    }
    css
}

fn print_css(margin: &str, font_size: u32, compact: bool) -> String {
    let size = font_size.to_string();
    let mut css = fill_template(
        PRINT_CSS_TEMPLATE,
        &[("margin", margin), ("base_font_size", &size)],
    );
    if compact {
        css.push_str(COMPACT_CSS);
    }
    css
}

/// Replace `{{ name }}` placeholders. Unknown names become empty strings.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            values
                .iter()
                .find(|(name, _)| *name == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_default()
        })
        .into_owned()
}

/// Render GitHub-flavoured Markdown to an HTML fragment.
///
/// Headings without an explicit `{#id}` get a unique slug id, and fenced
/// code blocks are syntax highlighted.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES;
    let mut events: Vec<Event<'_>> = Parser::new_ext(markdown, options).collect();

    let mut used: HashSet<String> = events
        .iter()
        .filter_map(|e| match e {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }
        let slug = unique_slug(slugify(&heading_text(&events[i + 1..])), &mut used);
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, highlight_code_blocks(events).into_iter());
    out
}

/// Replace each fenced code block that syntect can highlight with one raw
/// HTML event.
fn highlight_code_blocks(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut iter = events.into_iter();
    while let Some(event) = iter.next() {
        let fenced = match &event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => Some(lang.to_string()),
            _ => None,
        };
        let Some(lang) = fenced else {
            out.push(event);
            continue;
        };

        let mut block = vec![event];
        let mut code = String::new();
        for inner in iter.by_ref() {
            let end = matches!(inner, Event::End(TagEnd::CodeBlock));
            if let Event::Text(ref text) = inner {
                code.push_str(text);
            }
            block.push(inner);
            if end {
                break;
            }
        }

        match highlight(&code, &lang) {
            Some(html) => out.push(Event::Html(CowStr::from(html))),
            None => out.extend(block),
        }
    }
    out
}

/// Inline-styled HTML for `code`, or `None` when the language is unknown.
///
/// An unlabelled fence is matched on its first line (shebangs, `<?php`).
fn highlight(code: &str, lang: &str) -> Option<String> {
    let token = lang.split_whitespace().next().unwrap_or("");
    let syntax = if token.is_empty() {
        SYNTAXES.find_syntax_by_first_line(code)?
    } else {
        SYNTAXES.find_syntax_by_token(token)?
    };
    let theme = THEMES.themes.get(CODE_THEME)?;
    match highlighted_html_for_string(code, &SYNTAXES, syntax, theme) {
        Ok(html) => Some(format!("<div class=\"highlight\">{html}</div>\n")),
        Err(e) => {
            debug!("Highlighting '{token}' block failed: {e}");
            None
        }
    }
}

fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            _ => {}
        }
    }
    text
}

/// Lowercase, spaces to hyphens, punctuation dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() || c == '_' {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn unique_slug(base: String, used: &mut HashSet<String>) -> String {
    let base = if base.is_empty() {
        "section".to_string()
    } else {
        base
    };
    let mut candidate = base.clone();
    let mut n = 1;
    while used.contains(&candidate) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}
