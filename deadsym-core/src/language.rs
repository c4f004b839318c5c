//! Language dispatch by filename extension.
//!
//! The mapping is case-insensitive on the extension. Anything unrecognized is
//! [`Language::Unknown`], which analyzes to an empty result rather than an
//! error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Language tag selected for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    /// JavaScript-family dialect hosted in a `.vue` single-file component.
    Vue,
    /// JavaScript-family dialect hosted in a `.svelte` component.
    Svelte,
    Astro,
    Python,
    Go,
    Ruby,
    Php,
    Unknown,
}

impl Language {
    /// Stable lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Vue => "vue",
            Language::Svelte => "svelte",
            Language::Astro => "astro",
            Language::Python => "python",
            Language::Go => "go",
            Language::Ruby => "ruby",
            Language::Php => "php",
            Language::Unknown => "unknown",
        }
    }

    /// True for every dialect handled by the JavaScript token extractor.
    pub fn is_javascript_family(&self) -> bool {
        matches!(
            self,
            Language::TypeScript
                | Language::JavaScript
                | Language::Vue
                | Language::Svelte
                | Language::Astro
        )
    }

    /// True when the executable code lives inside a markup document.
    pub fn is_markup_hosted(&self) -> bool {
        matches!(self, Language::Vue | Language::Svelte | Language::Astro)
    }

    /// Map a bare extension (without the dot) to a language.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "vue" => Language::Vue,
            "svelte" => Language::Svelte,
            "astro" => Language::Astro,
            "py" => Language::Python,
            "go" => Language::Go,
            "rb" => Language::Ruby,
            "php" => Language::Php,
            _ => Language::Unknown,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the language of a file from its name.
pub fn detect_language(filename: &str) -> Language {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(Language::from_extension)
        .unwrap_or(Language::Unknown)
}
