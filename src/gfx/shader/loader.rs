//! Shader source loading with `#include` resolution
//!
//! Shader files may pull shared snippets in with `#include "name.wgsl"`.
//! Each included file is expanded at most once per program, nested includes
//! are followed, and `//` comment lines are dropped from the output.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::error;

use crate::error::{ViewerError, ViewerResult};

const INCLUDE_DIRECTIVE: &str = "#include";

/// Reads `file` from `shader_dir` and resolves its includes against `include_dir`
pub fn load_shader_source(shader_dir: &Path, file: &str, include_dir: &Path) -> ViewerResult<String> {
    let path = shader_dir.join(file);
    let source = std::fs::read_to_string(&path).map_err(|e| {
        error!("Failed to load shader '{}'.", path.display());
        ViewerError::asset(&path, e)
    })?;

    resolve_includes(&source, |name| {
        let include_path = include_dir.join(name);
        std::fs::read_to_string(&include_path).map_err(|e| {
            error!("Failed to load shader include '{}'.", include_path.display());
            ViewerError::asset(&include_path, e)
        })
    })
}

/// Expands `#include` directives using `read` to fetch included sources
pub fn resolve_includes<F>(source: &str, mut read: F) -> ViewerResult<String>
where
    F: FnMut(&str) -> ViewerResult<String>,
{
    let mut included = HashSet::new();
    let mut out = String::with_capacity(source.len());
    expand(source, &mut read, &mut included, &mut out)?;
    Ok(out)
}

fn expand<F>(
    source: &str,
    read: &mut F,
    included: &mut HashSet<String>,
    out: &mut String,
) -> ViewerResult<()>
where
    F: FnMut(&str) -> ViewerResult<String>,
{
    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix(INCLUDE_DIRECTIVE) {
            let name = parse_include_name(rest).ok_or_else(|| {
                ViewerError::asset(PathBuf::from(trimmed), "malformed #include directive")
            })?;
            if !included.insert(name.to_string()) {
                continue;
            }
            let nested = read(name)?;
            expand(&nested, read, included, out)?;
            continue;
        }

        out.push_str(line);
        out.push('\n');
    }
    Ok(())
}

fn parse_include_name(rest: &str) -> Option<&str> {
    let rest = rest.trim();
    let rest = rest.strip_prefix('"')?;
    let end = rest.find('"')?;
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn library() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("fog.wgsl", "fn fog() {}"),
            ("lighting.wgsl", "#include \"fog.wgsl\"\nfn light() {}"),
        ])
    }

    fn reader<'a>(
        files: &'a HashMap<&'static str, &'static str>,
        calls: &'a mut Vec<String>,
    ) -> impl FnMut(&str) -> ViewerResult<String> + 'a {
        move |name| {
            calls.push(name.to_string());
            files
                .get(name)
                .map(|s| s.to_string())
                .ok_or_else(|| ViewerError::asset(name, "missing"))
        }
    }

    #[test]
    fn test_include_is_expanded_once() {
        let files = library();
        let mut calls = Vec::new();
        let source = "#include \"fog.wgsl\"\n#include \"lighting.wgsl\"\nfn main() {}";

        let out = resolve_includes(source, reader(&files, &mut calls)).unwrap();

        assert_eq!(out.matches("fn fog()").count(), 1);
        assert!(out.contains("fn light() {}"));
        assert!(out.ends_with("fn main() {}\n"));
        assert_eq!(calls, vec!["fog.wgsl", "lighting.wgsl"]);
    }

    #[test]
    fn test_comment_lines_are_dropped() {
        let files = library();
        let mut calls = Vec::new();
        let source = "// header\n  // indented\nlet a = 1; // trailing stays\n";

        let out = resolve_includes(source, reader(&files, &mut calls)).unwrap();

        assert_eq!(out, "let a = 1; // trailing stays\n");
    }

    #[test]
    fn test_missing_include_is_an_asset_error() {
        let files = library();
        let mut calls = Vec::new();
        let err = resolve_includes("#include \"water.wgsl\"", reader(&files, &mut calls)).unwrap_err();
        assert!(matches!(err, ViewerError::AssetLoad { .. }));
    }

    #[test]
    fn test_malformed_directive_is_rejected() {
        let files = library();
        let mut calls = Vec::new();
        assert!(resolve_includes("#include fog.wgsl", reader(&files, &mut calls)).is_err());
        assert!(calls.is_empty());
    }
}
