// src/build/compile/graph.rs

//! Import graph over every file a root stylesheet reaches.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use super::parse::{compile_error, parse_file, ImportStmt, Segment};
use super::CompileOutput;
use crate::build::BuildError;
use crate::fs::FileSystem;
use crate::watch::path_utils::normalize_path;

#[derive(Debug, Clone)]
enum ImportAction {
    /// Keep the statement as plain CSS, hoisted to the top of the output.
    Verbatim,
    /// Optional import whose file does not exist.
    Skip,
    Inline { file: usize, multiple: bool },
    Reference { file: usize },
    Raw { content: String },
}

#[derive(Debug)]
struct ParsedFile {
    path: PathBuf,
    segments: Vec<Segment>,
    /// One entry per `Segment::Import`, in order.
    actions: Vec<ImportAction>,
}

#[derive(Debug)]
pub(super) struct ImportGraph {
    files: Vec<ParsedFile>,
    sources: Vec<String>,
    edges: DiGraphMap<usize, ()>,
    dependencies: Vec<PathBuf>,
}

impl ImportGraph {
    /// Parse the root and every file it reaches, breadth first.
    pub(super) fn discover(fs: &dyn FileSystem, root: &Path, root_src: &str) -> Result<Self, BuildError> {
        let root = normalize_path(root);
        let root_dir = root.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut graph = ImportGraph {
            files: Vec::new(),
            sources: Vec::new(),
            edges: DiGraphMap::new(),
            dependencies: Vec::new(),
        };
        let mut index: HashMap<PathBuf, usize> = HashMap::new();
        let mut seen_deps: HashSet<PathBuf> = HashSet::new();

        let segments = parse_file(&root, root_src)?;
        index.insert(root.clone(), 0);
        graph.edges.add_node(0);
        graph.files.push(ParsedFile {
            path: root.clone(),
            segments,
            actions: Vec::new(),
        });
        graph.sources.push(root_src.to_string());

        let mut queue = VecDeque::from([0usize]);
        while let Some(current) = queue.pop_front() {
            let importer_dir = graph.files[current]
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();

            let imports: Vec<ImportStmt> = graph.files[current]
                .segments
                .iter()
                .filter_map(|s| match s {
                    Segment::Import(stmt) => Some(stmt.clone()),
                    Segment::Text(_) => None,
                })
                .collect();

            let mut actions = Vec::with_capacity(imports.len());
            for stmt in imports {
                let importer_src = &graph.sources[current];
                let found = match resolve_import(fs, &stmt, &importer_dir, &root_dir, importer_src)? {
                    Resolved::File(path) => path,
                    Resolved::PlainCss => {
                        actions.push(ImportAction::Verbatim);
                        continue;
                    }
                    Resolved::Missing => {
                        actions.push(ImportAction::Skip);
                        continue;
                    }
                };

                if seen_deps.insert(found.clone()) && found != root {
                    graph.dependencies.push(found.clone());
                }

                if stmt.options.inline {
                    let content = fs.read_to_string(&found).map_err(|e| {
                        compile_error(importer_src, &format!("failed to read '{}': {e}", stmt.target), stmt.location.clone())
                    })?;
                    actions.push(ImportAction::Raw { content });
                    continue;
                }

                let file = match index.get(&found) {
                    Some(&idx) => idx,
                    None => {
                        let src = fs.read_to_string(&found).map_err(|e| {
                            compile_error(importer_src, &format!("failed to read '{}': {e}", stmt.target), stmt.location.clone())
                        })?;
                        let segments = parse_file(&found, &src)?;
                        let idx = graph.files.len();
                        index.insert(found.clone(), idx);
                        graph.files.push(ParsedFile {
                            path: found,
                            segments,
                            actions: Vec::new(),
                        });
                        graph.sources.push(src);
                        queue.push_back(idx);
                        idx
                    }
                };

                graph.edges.add_edge(current, file, ());
                actions.push(if stmt.options.reference {
                    ImportAction::Reference { file }
                } else {
                    ImportAction::Inline {
                        file,
                        multiple: stmt.options.multiple,
                    }
                });
            }
            graph.files[current].actions = actions;
        }

        debug!(
            root = %root.display(),
            files = graph.files.len(),
            dependencies = graph.dependencies.len(),
            "import graph discovered"
        );
        Ok(graph)
    }

    /// Reject circular imports, pointing at the statement that closes the
    /// cycle.
    pub(super) fn check_acyclic(&self) -> Result<(), BuildError> {
        let Err(cycle) = toposort(&self.edges, None) else {
            return Ok(());
        };
        let node = cycle.node_id();
        let file = &self.files[node];

        let imports = file.segments.iter().filter_map(|s| match s {
            Segment::Import(stmt) => Some(stmt),
            Segment::Text(_) => None,
        });
        for (stmt, action) in imports.zip(&file.actions) {
            let target = match action {
                ImportAction::Inline { file, .. } | ImportAction::Reference { file } => *file,
                _ => continue,
            };
            if has_path_connecting(&self.edges, target, node, None) {
                return Err(compile_error(
                    &self.sources[node],
                    &format!("circular import of '{}'", stmt.target),
                    stmt.location.clone(),
                ));
            }
        }

        Err(BuildError::Compile {
            message: format!("circular import involving {}", file.path.display()),
            location: None,
            extract: Vec::new(),
        })
    }

    pub(super) fn emit(self) -> CompileOutput {
        let mut body = String::new();
        let mut hoisted = Vec::new();
        let mut emitted = HashSet::from([0usize]);
        self.emit_file(0, &mut body, &mut hoisted, &mut emitted);

        let css = if hoisted.is_empty() {
            body
        } else {
            format!("{}\n{}", hoisted.join("\n"), body)
        };

        CompileOutput {
            css,
            dependencies: self.dependencies,
        }
    }

    fn emit_file(
        &self,
        idx: usize,
        out: &mut String,
        hoisted: &mut Vec<String>,
        emitted: &mut HashSet<usize>,
    ) {
        let file = &self.files[idx];
        let mut actions = file.actions.iter();

        for segment in &file.segments {
            let stmt = match segment {
                Segment::Text(text) => {
                    out.push_str(text);
                    continue;
                }
                Segment::Import(stmt) => stmt,
            };
            let Some(action) = actions.next() else {
                continue;
            };

            match action {
                ImportAction::Verbatim => hoisted.push(stmt.raw.clone()),
                ImportAction::Skip | ImportAction::Reference { .. } => {}
                ImportAction::Raw { content } => {
                    with_media(out, stmt.media.as_deref(), |out| out.push_str(content));
                }
                ImportAction::Inline { file, multiple } => {
                    if !multiple && !emitted.insert(*file) {
                        continue;
                    }
                    with_media(out, stmt.media.as_deref(), |out| {
                        self.emit_file(*file, out, hoisted, emitted)
                    });
                }
            }
        }
    }
}

fn with_media(out: &mut String, media: Option<&str>, body: impl FnOnce(&mut String)) {
    match media {
        Some(query) => {
            out.push_str("@media ");
            out.push_str(query);
            out.push_str(" {\n");
            body(out);
            out.push_str("\n}");
        }
        None => body(out),
    }
}

enum Resolved {
    File(PathBuf),
    /// URLs, `.css` files and `(css)` imports stay plain CSS statements.
    PlainCss,
    /// `(optional)` import whose file does not exist.
    Missing,
}

/// Locate the file an import points at.
fn resolve_import(
    fs: &dyn FileSystem,
    stmt: &ImportStmt,
    importer_dir: &Path,
    root_dir: &Path,
    importer_src: &str,
) -> Result<Resolved, BuildError> {
    let target = stmt.target.trim();
    if target.contains("://") || target.starts_with("//") {
        return Ok(Resolved::PlainCss);
    }

    let mut candidate = PathBuf::from(target);
    let ext = candidate
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        None => {
            candidate.set_extension("less");
        }
        Some("css") if !stmt.options.less => return Ok(Resolved::PlainCss),
        Some(_) => {}
    }
    if stmt.options.css {
        return Ok(Resolved::PlainCss);
    }

    let tried: Vec<PathBuf> = [importer_dir, root_dir]
        .iter()
        .map(|dir| normalize_path(&dir.join(&candidate)))
        .collect();

    if let Some(found) = tried.iter().find(|p| fs.is_file(p)) {
        return Ok(Resolved::File(found.clone()));
    }
    if stmt.options.optional {
        return Ok(Resolved::Missing);
    }

    let mut tried_list: Vec<String> = tried.iter().map(|p| p.display().to_string()).collect();
    tried_list.dedup();
    Err(compile_error(
        importer_src,
        &format!("'{}' wasn't found. Tried - {}", target, tried_list.join(", ")),
        stmt.location.clone(),
    ))
}
