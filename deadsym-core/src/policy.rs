//! Framework export exemptions.
//!
//! Some exported names are consumed by a framework's file-based router or
//! build pipeline rather than by any import in the repository. Reporting them
//! as unused would be noise, so every analyzer consults [`is_framework_export`]
//! before flagging a definition. The rules only apply to JavaScript-family
//! dialects.
//!
//! | File                                  | Exempt names                            |
//! |---------------------------------------|-----------------------------------------|
//! | `route.{ts,js,..}`, `+server.{ts,js}` | HTTP verbs (`GET`, `POST`, ...)         |
//! | `middleware.{ts,js}`                  | `middleware`, `config`                  |
//! | any                                   | page/layout meta and lifecycle exports  |

use std::path::Path;

use crate::language::Language;

const HTTP_VERBS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

const MIDDLEWARE_EXPORTS: &[&str] = &["middleware", "config"];

/// Meta/lifecycle exports read by Next.js, SvelteKit, Astro and Remix.
const LIFECYCLE_EXPORTS: &[&str] = &[
    // Next.js app and pages router
    "metadata",
    "generateMetadata",
    "generateStaticParams",
    "generateViewport",
    "generateImageMetadata",
    "generateSitemaps",
    "viewport",
    "revalidate",
    "dynamic",
    "dynamicParams",
    "fetchCache",
    "runtime",
    "preferredRegion",
    "maxDuration",
    "getStaticProps",
    "getStaticPaths",
    "getServerSideProps",
    "reportWebVitals",
    // SvelteKit
    "load",
    "actions",
    "prerender",
    "ssr",
    "csr",
    "trailingSlash",
    "entries",
    // Astro (getStaticPaths is shared with Next.js above)
    "partial",
    // Remix / React Router
    "loader",
    "action",
    "meta",
    "links",
    "headers",
    "handle",
    "ErrorBoundary",
];

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
}

fn is_route_file(stem: &str) -> bool {
    stem == "route" || stem == "+server"
}

fn is_middleware_file(stem: &str) -> bool {
    stem == "middleware" || stem == "_middleware"
}

/// True if `name`, defined in `filename`, is consumed by a framework
/// convention and must never be reported as unused.
pub fn is_framework_export(name: &str, filename: &str, language: Language) -> bool {
    if !language.is_javascript_family() {
        return false;
    }

    let stem = file_stem(filename);

    if is_route_file(stem) && HTTP_VERBS.contains(&name) {
        return true;
    }

    if is_middleware_file(stem) && MIDDLEWARE_EXPORTS.contains(&name) {
        return true;
    }

    LIFECYCLE_EXPORTS.contains(&name)
}
