// src/build/compile/mod.rs

//! Stylesheet compilation and dependency discovery.
//!
//! [`Compiler`] is the seam the pipeline talks to. The built-in
//! [`ImportCompiler`] understands the part of LESS the watch loop actually
//! depends on: `@import` resolution (so every transitively imported file is
//! reported as a dependency) and `//` line comments. Everything else in the
//! source is passed through untouched.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::build::BuildError;
use crate::fs::FileSystem;

mod graph;
mod parse;

use graph::ImportGraph;

/// Result of a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub css: String,
    /// Absolute paths of every file read besides the root, in discovery order.
    pub dependencies: Vec<PathBuf>,
}

/// Turns a root stylesheet into CSS plus the set of files it read.
pub trait Compiler: Send + Sync + Debug {
    /// `source` is the already-read contents of `path`.
    fn compile(&self, path: &Path, source: &str) -> Result<CompileOutput, BuildError>;
}

/// Minimal LESS front-end: inlines `@import`ed files and strips `//`
/// comments. Inputs that are not `.less` are passed through unchanged.
#[derive(Debug, Clone)]
pub struct ImportCompiler {
    fs: Arc<dyn FileSystem>,
}

impl ImportCompiler {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Compiler for ImportCompiler {
    fn compile(&self, path: &Path, source: &str) -> Result<CompileOutput, BuildError> {
        if !is_less(path) {
            debug!(path = %path.display(), "not a .less file; passing through");
            return Ok(CompileOutput {
                css: source.to_string(),
                dependencies: Vec::new(),
            });
        }

        let graph = ImportGraph::discover(self.fs.as_ref(), path, source)?;
        graph.check_acyclic()?;
        Ok(graph.emit())
    }
}

fn is_less(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("less"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn compiler(fs: &MockFileSystem) -> ImportCompiler {
        ImportCompiler::new(Arc::new(fs.clone()))
    }

    fn compile(fs: &MockFileSystem, path: &str) -> Result<CompileOutput, BuildError> {
        let src = fs.read_to_string(Path::new(path)).unwrap();
        compiler(fs).compile(Path::new(path), &src)
    }

    #[test]
    fn inlines_imports_and_reports_dependencies() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "@import \"b\";\na { color: red; }\n");
        fs.add_file("/p/b.less", "@import 'sub/c.less';\nb { x: 1; }\n");
        fs.add_file("/p/sub/c.less", "c { y: 2; }\n");

        let out = compile(&fs, "/p/a.less").unwrap();
        assert_eq!(
            out.dependencies,
            vec![PathBuf::from("/p/b.less"), PathBuf::from("/p/sub/c.less")]
        );
        assert!(out.css.contains("c { y: 2; }"));
        assert!(out.css.contains("b { x: 1; }"));
        assert!(out.css.find("c {").unwrap() < out.css.find("a {").unwrap());
        assert!(!out.css.contains("@import"));
    }

    #[test]
    fn nested_imports_resolve_relative_to_importer_then_root() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "@import \"lib/x\";");
        fs.add_file("/p/lib/x.less", "@import \"vars\";");
        // Not next to lib/x.less, found through the root directory.
        fs.add_file("/p/vars.less", "v{}");

        let out = compile(&fs, "/p/a.less").unwrap();
        assert_eq!(
            out.dependencies,
            vec![PathBuf::from("/p/lib/x.less"), PathBuf::from("/p/vars.less")]
        );
        assert_eq!(out.css, "v{}");
    }

    #[test]
    fn files_are_inlined_once_by_default() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "@import \"m\";@import \"m\";@import (multiple) \"m\";");
        fs.add_file("/p/m.less", "m{}");

        let out = compile(&fs, "/p/a.less").unwrap();
        assert_eq!(out.css, "m{}m{}");
        assert_eq!(out.dependencies, vec![PathBuf::from("/p/m.less")]);
    }

    #[test]
    fn css_and_url_imports_are_hoisted_verbatim() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/p/a.less",
            "a{}\n@import \"reset.css\";\n@import url(\"https://fonts.example/x\");\n",
        );

        let out = compile(&fs, "/p/a.less").unwrap();
        assert!(out.dependencies.is_empty());
        assert!(out.css.starts_with(
            "@import \"reset.css\";\n@import url(\"https://fonts.example/x\");\n"
        ));
    }

    #[test]
    fn media_imports_are_wrapped() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "@import \"print\" print;");
        fs.add_file("/p/print.less", "p{}");

        let out = compile(&fs, "/p/a.less").unwrap();
        assert_eq!(out.css, "@media print {\np{}\n}");
    }

    #[test]
    fn optional_missing_import_is_skipped() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "@import (optional) \"nope\";a{}");

        let out = compile(&fs, "/p/a.less").unwrap();
        assert_eq!(out.css, "a{}");
        assert!(out.dependencies.is_empty());
    }

    #[test]
    fn missing_import_reports_location() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "a{}\n  @import \"gone\";\n");

        let err = compile(&fs, "/p/a.less").unwrap_err();
        let loc = err.location().cloned().unwrap();
        assert_eq!(loc.file, PathBuf::from("/p/a.less"));
        assert_eq!((loc.line, loc.column), (2, 3));
        assert!(err.to_string().contains("'gone' wasn't found"));
        match err {
            BuildError::Compile { extract, .. } => {
                assert_eq!(extract, vec!["1 a{}".to_string(), "2   @import \"gone\";".to_string()]);
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/open.less", "a {\n  b { c: d; }\n");
        fs.add_file("/p/close.less", "a { }\n}\n");

        let err = compile(&fs, "/p/open.less").unwrap_err();
        let loc = err.location().unwrap();
        assert_eq!((loc.line, loc.column), (1, 3));
        assert!(err.to_string().contains("missing closing"));

        let err = compile(&fs, "/p/close.less").unwrap_err();
        let loc = err.location().unwrap();
        assert_eq!((loc.line, loc.column), (2, 1));
    }

    #[test]
    fn errors_in_imported_files_point_at_that_file() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "@import \"b\";");
        fs.add_file("/p/b.less", "x { content: \"oops; }\n");

        let err = compile(&fs, "/p/a.less").unwrap_err();
        let loc = err.location().unwrap();
        assert_eq!(loc.file, PathBuf::from("/p/b.less"));
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn circular_imports_are_rejected() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "@import \"b\";");
        fs.add_file("/p/b.less", "@import \"c\";");
        fs.add_file("/p/c.less", "@import \"a\";");

        let err = compile(&fs, "/p/a.less").unwrap_err();
        assert!(err.to_string().contains("circular import"));
        assert!(err.location().is_some());
    }

    #[test]
    fn line_comments_are_stripped_but_urls_survive() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/p/a.less",
            "// header\na { background: url(http://x/y.png); } // trailing\n/* kept */\n",
        );

        let out = compile(&fs, "/p/a.less").unwrap();
        assert_eq!(
            out.css,
            "\na { background: url(http://x/y.png); } \n/* kept */\n"
        );
    }

    #[test]
    fn non_less_input_passes_through() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/site.css", "@import \"x\"; // not a comment in css\n");

        let out = compile(&fs, "/p/site.css").unwrap();
        assert_eq!(out.css, "@import \"x\"; // not a comment in css\n");
        assert!(out.dependencies.is_empty());
    }

    #[test]
    fn unknown_import_option_is_an_error() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a.less", "@import (shiny) \"b\";");
        let err = compile(&fs, "/p/a.less").unwrap_err();
        assert!(err.to_string().contains("unknown @import option 'shiny'"));
    }
}
