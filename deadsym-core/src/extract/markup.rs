//! Vue, Svelte and Astro components.
//!
//! ```text
//!  component source
//!        │
//!        ├── script view ──► javascript extractor ──► SymbolTable
//!        │   (everything outside <script> / Astro frontmatter blanked)
//!        │
//!        └── template view ──► template_usage(name)
//!            (script and style blanked, <!-- --> stripped)
//! ```
//!
//! Both views keep every newline and byte offset of the original, so line
//! numbers reported from the script view are physical lines of the file.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use super::javascript::extract_script;
use super::Extractor;
use crate::error::DeadsymResult;
use crate::language::Language;
use crate::model::SymbolTable;
use crate::usage::{contains_word, CommentStripper, CommentStyle};

/// Extractor for a markup host; the script itself is JavaScript or TypeScript.
#[derive(Debug, Clone, Copy)]
pub struct MarkupExtractor {
    host: Language,
}

impl MarkupExtractor {
    pub const fn new(host: Language) -> Self {
        Self { host }
    }

    pub fn host(&self) -> Language {
        self.host
    }
}

impl Extractor for MarkupExtractor {
    fn extract(&self, filename: &str, source: &str) -> DeadsymResult<SymbolTable> {
        let view = script_view(self.host, source);
        Ok(extract_script(filename, &view))
    }

    fn comment_style(&self) -> CommentStyle {
        CommentStyle::CLike
    }

    fn usage_view<'a>(&self, source: &'a str) -> Cow<'a, str> {
        Cow::Owned(script_view(self.host, source))
    }

    fn supports_template_usage(&self) -> bool {
        true
    }

    fn template_usage(&self, source: &str, name: &str) -> bool {
        let template = template_view(self.host, source);
        let mut stripper = CommentStripper::new(CommentStyle::Markup);
        let text = template
            .lines()
            .map(|l| stripper.strip_line(l))
            .collect::<Vec<_>>()
            .join("\n");

        component_tag(&text, name)
            || contains_word(&brace_expressions(&text), name)
            || match self.host {
                Language::Vue => directive_usage(&text, name),
                Language::Svelte => svelte_action_usage(&text, name),
                _ => false,
            }
    }
}

fn script_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^>]*>(.*?)</script\s*>")
            .expect("Hardcoded regex pattern is valid")
    })
}

fn style_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<style\b[^>]*>(.*?)</style\s*>")
            .expect("Hardcoded regex pattern is valid")
    })
}

/// Vue directive attribute values: `:prop="x"`, `@click="f"`, `v-if="ok"`,
/// `#item="{ row }"`.
fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:^|\s)(?::|@|#|v-)[\w\-:.\[\]]*\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("Hardcoded regex pattern is valid")
    })
}

/// Svelte directives naming a script function without braces: `use:tooltip`.
fn svelte_action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:use|transition|in|out|animate):([\w$]+)")
            .expect("Hardcoded regex pattern is valid")
    })
}

/// Byte range of the Astro frontmatter: the text between a leading `---`
/// line and the next `---` line (or end of file when unclosed).
fn astro_frontmatter(source: &str) -> Option<Range<usize>> {
    let mut offset = 0;
    let mut start = None;
    for line in source.split_inclusive('\n') {
        let next = offset + line.len();
        let fence = line.trim() == "---";
        match start {
            None if fence => start = Some(next),
            None if line.trim().is_empty() => {}
            None => return None,
            Some(s) if fence => return Some(s..offset),
            Some(_) => {}
        }
        offset = next;
    }
    start.map(|s| s..source.len())
}

/// Byte ranges of executable script in a component.
pub fn script_regions(host: Language, source: &str) -> Vec<Range<usize>> {
    if host == Language::Astro {
        if let Some(frontmatter) = astro_frontmatter(source) {
            return vec![frontmatter];
        }
    }
    script_tag_regex()
        .captures_iter(source)
        .filter_map(|c| c.get(1))
        .map(|m| m.range())
        .collect()
}

/// Copy of `source` where every byte outside `keep` is a space, except
/// newlines.
fn mask(source: &str, keep: impl Fn(usize) -> bool) -> String {
    let mut out = String::with_capacity(source.len());
    for (idx, ch) in source.char_indices() {
        if ch == '\n' || keep(idx) {
            out.push(ch);
        } else {
            out.extend(std::iter::repeat(' ').take(ch.len_utf8()));
        }
    }
    out
}

/// Source with only the script region(s) left in place.
pub fn script_view(host: Language, source: &str) -> String {
    let regions = script_regions(host, source);
    mask(source, |idx| regions.iter().any(|r| r.contains(&idx)))
}

/// Source with script and style regions blanked.
pub fn template_view(host: Language, source: &str) -> String {
    let mut hidden = script_regions(host, source);
    hidden.extend(
        style_tag_regex()
            .captures_iter(source)
            .filter_map(|c| c.get(1))
            .map(|m| m.range()),
    );
    mask(source, |idx| !hidden.iter().any(|r| r.contains(&idx)))
}

/// `<Name ...>` or `</Name>`; `<NameSuffix>` does not count.
fn component_tag(text: &str, name: &str) -> bool {
    ["<", "</"].iter().any(|open| {
        let needle = format!("{open}{name}");
        text.match_indices(&needle).any(|(pos, _)| {
            text[pos + needle.len()..]
                .chars()
                .next()
                .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '-'))
        })
    })
}

/// Concatenated contents of every `{ ... }` expression, newline separated.
fn brace_expressions(text: &str) -> String {
    let mut out = String::new();
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '{' => {
                if depth > 0 {
                    out.push(ch);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                out.push(if depth == 0 { '\n' } else { ch });
            }
            _ if depth > 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

fn directive_usage(text: &str, name: &str) -> bool {
    directive_regex().captures_iter(text).any(|c| {
        c.get(1)
            .or_else(|| c.get(2))
            .is_some_and(|value| contains_word(value.as_str(), name))
    })
}

fn svelte_action_usage(text: &str, name: &str) -> bool {
    svelte_action_regex()
        .captures_iter(text)
        .any(|c| c.get(1).is_some_and(|m| m.as_str() == name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VUE: MarkupExtractor = MarkupExtractor::new(Language::Vue);
    const SVELTE: MarkupExtractor = MarkupExtractor::new(Language::Svelte);
    const ASTRO: MarkupExtractor = MarkupExtractor::new(Language::Astro);

    const VUE_SFC: &str = r#"<template>
  <div>
    <MyButton :label="title" @click="onClick" />
    {{ count }}
  </div>
</template>

<script setup lang="ts">
import MyButton from './MyButton.vue'
import Unused from './Unused.vue'
const title = 'hi'
const count = 1
function onClick() {}
</script>
"#;

    #[test]
    fn test_vue_script_lines_are_physical() {
        let table = VUE.extract("App.vue", VUE_SFC).unwrap();
        let button = table.imports.iter().find(|i| i.name == "MyButton").unwrap();
        assert_eq!(button.line, 9);
        let count = table.definitions.iter().find(|d| d.name == "count").unwrap();
        assert_eq!(count.line, 12);
    }

    #[test]
    fn test_vue_template_usage() {
        assert!(VUE.template_usage(VUE_SFC, "MyButton"));
        assert!(VUE.template_usage(VUE_SFC, "title"));
        assert!(VUE.template_usage(VUE_SFC, "onClick"));
        assert!(VUE.template_usage(VUE_SFC, "count"));
        assert!(!VUE.template_usage(VUE_SFC, "Unused"));
    }

    #[test]
    fn test_script_text_is_not_template_usage() {
        // `Unused` appears only inside the script block
        assert!(!VUE.template_usage(VUE_SFC, "Unused"));
        let view = VUE.usage_view(VUE_SFC);
        assert!(!view.contains("<template>"));
        assert_eq!(view.lines().count(), VUE_SFC.lines().count());
    }

    #[test]
    fn test_html_comments_hide_usage() {
        let src = "<script>\nimport Card from './Card.svelte'\n</script>\n<!-- <Card /> -->\n";
        assert!(!SVELTE.template_usage(src, "Card"));
    }

    #[test]
    fn test_tag_prefix_is_not_usage() {
        let src = "<script>\nimport Card from './Card.svelte'\n</script>\n<CardList />\n";
        assert!(!SVELTE.template_usage(src, "Card"));
        let src = "<script>\nimport Card from './Card.svelte'\n</script>\n<Card.Header />\n";
        assert!(SVELTE.template_usage(src, "Card"));
    }

    #[test]
    fn test_svelte_multiple_scripts_and_actions() {
        let src = "<script context=\"module\">\nexport const prerender = true\n</script>\n<script>\nimport { tooltip } from './actions'\nlet name = 'x'\n</script>\n<p use:tooltip>{name}</p>\n";
        let table = SVELTE.extract("Page.svelte", src).unwrap();
        assert_eq!(table.definitions.len(), 2);
        assert!(SVELTE.template_usage(src, "tooltip"));
        assert!(SVELTE.template_usage(src, "name"));
    }

    #[test]
    fn test_astro_frontmatter() {
        let src = "---\nimport Layout from '../layouts/Layout.astro'\nconst title = 'Home'\n---\n<Layout title={title}>\n</Layout>\n";
        let table = ASTRO.extract("index.astro", src).unwrap();
        assert_eq!(table.imports[0].name, "Layout");
        assert_eq!(table.imports[0].line, 2);
        assert!(ASTRO.template_usage(src, "Layout"));
        assert!(ASTRO.template_usage(src, "title"));
    }

    #[test]
    fn test_astro_unclosed_frontmatter_runs_to_eof() {
        let src = "---\nimport A from './A'\n";
        assert_eq!(astro_frontmatter(src), Some(4..src.len()));
    }

    #[test]
    fn test_astro_without_frontmatter_uses_script_tags() {
        let src = "<div></div>\n<script>\nconst a = 1\n</script>\n";
        let table = ASTRO.extract("x.astro", src).unwrap();
        assert_eq!(table.definitions[0].name, "a");
    }

    #[test]
    fn test_no_script_region_is_empty() {
        let table = VUE.extract("Plain.vue", "<template><div/></template>").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_mask_keeps_byte_offsets() {
        let src = "é<script>x</script>";
        let view = script_view(Language::Vue, src);
        assert_eq!(view.len(), src.len());
        assert_eq!(view.find('x'), src.find('x'));
    }

    #[test]
    fn test_case_insensitive_script_tags() {
        let src = "<SCRIPT>\nconst a = 1\n</SCRIPT>";
        assert_eq!(script_regions(Language::Svelte, src).len(), 1);
    }
}
