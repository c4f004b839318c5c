//! Comprehensive test suite for deadsym-core.

use crate::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: &str) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_project() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join("deadsym_tests")
        .join(format!("{}_{}", timestamp, id));

    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn texts(issues: &[CodeIssue]) -> Vec<&str> {
    issues.iter().map(|i| i.text.as_str()).collect()
}

fn keys(result: &AnalysisResult) -> Vec<(usize, String, String)> {
    result
        .issues()
        .map(|i| (i.line, i.text.clone(), i.file.clone()))
        .collect()
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn test_scenario_unused_python_import() {
    let engine = Engine::new();
    let result = engine.analyze(&SourceFile::new("main.py", "import os\n"));
    assert_eq!(result.imports.len(), 1);
    assert_eq!(result.imports[0].line, 1);
    assert_eq!(result.imports[0].text, "import os");
    assert_eq!(result.imports[0].file, "main.py");
}

#[test]
fn test_scenario_unused_parameter() {
    let engine = Engine::new();
    let result = engine.analyze(&SourceFile::new("f.py", "def f(a, b): return a\n"));
    assert_eq!(texts(&result.parameters), vec!["parameter b"]);
    assert_eq!(result.parameters[0].line, 1);
}

#[test]
fn test_scenario_unimported_exported_widget() {
    let engine = Engine::new();
    let ws = engine.analyze_workspace(&[
        SourceFile::new("file1.ts", "export class Widget {\n  render() { return 1; }\n}\n"),
        SourceFile::new("file2.ts", "export const other = 1;\n"),
    ]);
    let file1 = ws.get("file1.ts").unwrap();
    assert!(texts(&file1.variables).contains(&"class Widget"));
}

#[test]
fn test_scenario_malformed_structural_source() {
    let engine = Engine::new();
    for (name, src) in [
        ("broken.py", "def f(a, b:\n    return"),
        ("broken.go", "package main\nfunc main( {\n"),
    ] {
        let result = engine.analyze(&SourceFile::new(name, src));
        assert!(result.imports.is_empty());
        assert!(result.variables.is_empty());
        assert!(result.parameters.is_empty());
    }
}

#[test]
fn test_scenario_workspace_resubmitted_in_other_order() {
    let engine = Engine::new();
    let a = SourceFile::new("a.py", "import os\nvalue = 1\n").with_fingerprint("fa");
    let b = SourceFile::new("b.py", "from a import value\nprint(value)\n").with_fingerprint("fb");

    let first = engine.analyze_workspace(&[a.clone(), b.clone()]);
    let before = engine.stats();
    let second = engine.analyze_workspace(&[b, a]);
    let after = engine.stats();

    assert_eq!(after.extractions, before.extractions);
    assert_eq!(after.workspace_hits, before.workspace_hits + 1);
    for (name, result) in &first.results {
        assert_eq!(keys(result), keys(second.get(name).unwrap()));
    }
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_self_exclusion_every_language() {
    let cases = [
        ("a.ts", "const lonely = 1;\n"),
        ("a.py", "lonely = 1\n"),
        ("a.go", "package a\n\nvar lonely = 1\n"),
        ("a.rb", "LONELY = 1\n"),
        ("a.php", "<?php\nfunction lonely() {}\n"),
    ];
    for (name, src) in cases {
        let result = analyze_file(&SourceFile::new(name, src));
        assert_eq!(result.variables.len(), 1, "{name}: declaration line must not count as use");
    }
}

#[test]
fn test_whole_word_matching() {
    let src = "const foo = 1;\nconst foobar = 2;\nconst barfoo = 3;\nconsole.log(foobar, barfoo);\n";
    let result = analyze_file(&SourceFile::new("w.js", src));
    assert_eq!(texts(&result.variables), vec!["const foo"]);
}

#[test]
fn test_comment_blindness() {
    let cases = [
        ("c.ts", "import { helper } from './h';\n// helper()\n/* helper\n */\n"),
        ("c.py", "import helper\n# helper()\n"),
        ("c.go", "package c\n\nimport \"helper\"\n\n// helper.Run()\n"),
        ("c.rb", "require 'helper'\n# Helper.run\n"),
        ("c.php", "<?php\nuse App\\Helper;\n// Helper::run();\n# Helper\n"),
    ];
    for (name, src) in cases {
        let result = analyze_file(&SourceFile::new(name, src));
        assert_eq!(result.imports.len(), 1, "{name}: comment mention must not count");
    }
}

#[test]
fn test_idempotent_single_file_analysis() {
    let engine = Engine::new();
    let file = SourceFile::new("i.ts", "import a from 'a';\nfunction f(x, y) { return x; }\n")
        .with_fingerprint("same");
    let first = engine.analyze(&file);
    let second = engine.analyze(&file);
    assert_eq!(keys(&first), keys(&second));
    assert!(!first.is_empty());
    let ids: Vec<_> = first.issues().chain(second.issues()).map(|i| i.id.clone()).collect();
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn test_cross_file_import_linkage() {
    let engine = Engine::new();
    let ws = engine.analyze_workspace(&[
        SourceFile::new("A.ts", "export function helper() { return 1; }\n"),
        SourceFile::new("B.ts", "import { helper } from './A';\n"),
    ]);
    assert!(ws.get("A.ts").unwrap().variables.is_empty());
    // the binding itself is still unused inside B
    assert_eq!(texts(&ws.get("B.ts").unwrap().imports), vec!["import { helper }"]);
}

#[test]
fn test_local_shadow_independence() {
    let engine = Engine::new();
    let ws = engine.analyze_workspace(&[
        SourceFile::new("a.py", "count = 0\nprint(count)\nstale = 1\n"),
        SourceFile::new("b.py", "count = 5\nprint(count)\n"),
        SourceFile::new("c.py", "print('nothing here')\nrestale = 2\nprint(restale)\n"),
    ]);
    assert!(ws.get("a.py").unwrap().variables.iter().all(|i| i.text != "var count"));
    assert!(ws.get("b.py").unwrap().variables.is_empty());
    assert_eq!(texts(&ws.get("a.py").unwrap().variables), vec!["var stale"]);
}

#[test]
fn test_php_aliased_use_is_bound_to_alias() {
    let src = "<?php\nuse App\\Models\\Post as BlogPost;\nuse App\\Models\\Tag as Label;\nfunction show() { return new BlogPost(); }\nshow();\n";
    let result = analyze_file(&SourceFile::new("show.php", src));
    assert_eq!(texts(&result.imports), vec!["use App\\Models\\Tag as Label;"]);
}

#[test]
fn test_multiline_strings_do_not_hide_usage() {
    let js = "const foo = 1;\nconst url = `\nhttp://x/${foo}\n`;\nconsole.log(url);\n";
    assert!(analyze_file(&SourceFile::new("a.js", js)).variables.is_empty());

    let py = "import os\nDOC = \"\"\"\nhttp://x #frag os.sep\n\"\"\"\nprint(DOC)\n";
    assert!(analyze_file(&SourceFile::new("a.py", py)).imports.is_empty());
}

#[test]
fn test_reference_from_unrecognized_file() {
    let engine = Engine::new();
    let ws = engine.analyze_workspace(&[
        SourceFile::new("app.js", "function initApp() {}\n"),
        SourceFile::new("index.html", "<body onload=\"initApp()\"></body>\n"),
    ]);
    assert!(ws.get("app.js").unwrap().variables.is_empty());
    assert!(ws.get("index.html").unwrap().is_empty());
}

// ============================================================================
// Robustness against garbage input
// ============================================================================

const GARBAGE: &[&str] = &[
    "",
    "\n\n\n",
    "((((((",
    "}}}}]]]",
    "\"unterminated",
    "/* never closed",
    "import { from",
    "def def def (((",
    "package\nfunc (",
    "<script>",
    "<?php use \\{",
    "class << self\n  def",
    "\u{0}\u{1}\u{ffff}",
    "🎉 émoji ident = 🎉",
];

#[test]
fn test_garbage_input_never_panics() {
    let engine = Engine::new();
    let names = [
        "g.ts", "g.tsx", "g.js", "g.vue", "g.svelte", "g.astro", "g.py", "g.go", "g.rb", "g.php",
        "g.txt",
    ];
    for name in names {
        for src in GARBAGE {
            let _ = engine.analyze(&SourceFile::new(name, *src));
        }
    }
    let files: Vec<_> = names
        .iter()
        .zip(GARBAGE.iter().cycle())
        .map(|(n, s)| SourceFile::new(*n, *s))
        .collect();
    let ws = engine.analyze_workspace(&files);
    assert_eq!(ws.results.len(), names.len());
}

#[test]
fn test_unknown_language() {
    assert_eq!(detect_language("x.unknown"), Language::Unknown);
    let engine = Engine::new();
    assert!(engine.analyze(&SourceFile::new("x.unknown", "import os")).is_empty());
}

// ============================================================================
// Markup dialects
// ============================================================================

#[test]
fn test_svelte_component_usage() {
    let src = "<script>\n  import Button from './Button.svelte';\n  import Modal from './Modal.svelte';\n  export let title;\n  function unusedHelper(a) { return a; }\n</script>\n\n<Button on:click={() => title} />\n";
    let result = analyze_file(&SourceFile::new("Page.svelte", src));
    assert_eq!(texts(&result.imports), vec!["import Modal"]);
    assert_eq!(texts(&result.variables), vec!["function unusedHelper"]);
}

#[test]
fn test_astro_frontmatter_usage() {
    let src = "---\nimport Layout from '../layouts/Layout.astro';\nimport Card from '../components/Card.astro';\nconst title = 'Home';\n---\n<Layout title={title}>\n  <h1>{title}</h1>\n</Layout>\n";
    let result = analyze_file(&SourceFile::new("index.astro", src));
    assert_eq!(texts(&result.imports), vec!["import Card"]);
    assert!(result.variables.is_empty());
}

#[test]
fn test_markup_without_script_is_empty() {
    let result = analyze_file(&SourceFile::new("Empty.vue", "<template><div/></template>\n"));
    assert!(result.is_empty());
}

// ============================================================================
// Framework exemptions
// ============================================================================

#[test]
fn test_route_handlers_exempt_in_workspace() {
    let engine = Engine::new();
    let ws = engine.analyze_workspace(&[SourceFile::new(
        "app/api/items/route.ts",
        "export async function GET() { return 1; }\nexport async function POST() { return 2; }\n",
    )]);
    assert!(ws.get("app/api/items/route.ts").unwrap().variables.is_empty());
}

// ============================================================================
// Filesystem: config, cache persistence, builder
// ============================================================================

#[test]
fn test_config_drives_builder() {
    let root = setup_temp_project();
    write_file(&root.join("src/a.py"), "import os\ndef f(x):\n    return 1\nf(1)\n");
    write_file(&root.join("fixtures/b.py"), "import sys\n");
    write_file(
        &root.join("deadsym.toml"),
        "exclude_dirs = [\"fixtures\"]\n[analysis]\nparameters = false\n",
    );

    let config = load_config(&root).unwrap().unwrap();
    let report = Deadsym::new(&root)
        .with_cache(false)
        .with_config(&config)
        .analyze()
        .unwrap();

    assert_eq!(report.files_analyzed, 1);
    let a = report.results.get("src/a.py").unwrap();
    assert_eq!(texts(&a.imports), vec!["import os"]);
    assert!(a.parameters.is_empty());
    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_invalid_config_is_error() {
    let root = setup_temp_project();
    write_file(&root.join("deadsym.toml"), "ignore = 5\n");
    assert!(load_config(&root).is_err());
    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_cache_roundtrip_through_engine() {
    let root = setup_temp_project();
    let engine = Engine::new();
    engine.analyze_workspace(&[
        SourceFile::new("a.go", "package a\n\nimport \"fmt\"\n\nfunc Hi() { fmt.Println() }\n"),
        SourceFile::new("b.rb", "require 'json'\n"),
    ]);
    save_cache(&root, &engine.symbol_cache()).unwrap();

    let loaded = load_cache(&root).unwrap();
    assert_eq!(loaded.len(), 2);
    let seeded = Engine::with_symbol_cache(loaded);
    seeded.analyze(&SourceFile::new("b.rb", "require 'json'\n"));
    assert_eq!(seeded.stats().extractions, 0);
    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_builder_changed_file_reextracted() {
    let root = setup_temp_project();
    write_file(&root.join("a.ts"), "import x from 'x';\n");
    write_file(&root.join("b.ts"), "export const y = 1;\n");
    Deadsym::new(&root).analyze().unwrap();

    write_file(&root.join("a.ts"), "import x from 'x';\nx();\n");
    let report = Deadsym::new(&root).analyze().unwrap();
    assert_eq!(report.stats.extractions, 1);
    assert_eq!(report.stats.symbol_hits, 1);
    assert!(report.results.get("a.ts").unwrap().imports.is_empty());
    fs::remove_dir_all(&root).ok();
}

#[test]
fn test_json_shape_of_results() {
    let result = analyze_file(&SourceFile::new("main.py", "import os\n"));
    let value = serde_json::to_value(&result).unwrap();
    let issue = &value["imports"][0];
    assert_eq!(issue["line"], 1);
    assert_eq!(issue["text"], "import os");
    assert_eq!(issue["file"], "main.py");
    assert!(issue["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(value["variables"].as_array().unwrap().is_empty());
}
