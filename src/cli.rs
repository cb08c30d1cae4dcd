//! Minimal CLI: catalog → mapping, plus an annotation debug view
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indexmap::IndexSet;
use rayon::prelude::*;
use serde_json::{json, Map, Value};

use elastic_mapping::{AnnotationSet, Catalog, EmptyTokens, Mapper, MapperOptions};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// derive Elasticsearch index mappings from record types declared in JSON catalogs
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// derive the index mapping of a catalog record
    Mapping(MappingOut),
    /// parse an annotation string and print what the mapper sees
    Tags(TagsOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more catalog files. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// record to map instead of the catalog's declared root
    #[arg(long)]
    record: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct MappingOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// name under `mappings` (defaults to the record name)
    #[arg(long)]
    root_name: Option<String>,

    /// discard empty annotation tokens instead of keeping them as ""
    #[arg(long, default_value_t = false)]
    drop_empty_tags: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct TagsOut {
    /// raw annotation, e.g. "text, -"
    raw: String,

    /// discard empty annotation tokens instead of keeping them as ""
    #[arg(long, default_value_t = false)]
    drop_empty_tags: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

fn empty_tokens(drop: bool) -> EmptyTokens {
    if drop { EmptyTokens::Drop } else { EmptyTokens::Keep }
}

impl MappingOut {
    fn map_file(&self, mapper: &Mapper, path: &Path) -> Result<Value> {
        let catalog = Catalog::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?;
        let (record, ty) = catalog
            .root_descriptor(self.input_settings.record.as_deref())
            .with_context(|| format!("no record to map in {}", path.display()))?;
        let root_name = self.root_name.as_deref().unwrap_or(&record);
        let derivation = mapper
            .derive_descriptor(&ty, root_name)
            .with_context(|| format!("failed to derive mapping for `{record}` ({})", path.display()))?;
        if !derivation.diagnostics.is_empty() {
            tracing::info!(
                path = %path.display(),
                skipped = derivation.diagnostics.len(),
                "fields without a mapping were skipped"
            );
        }
        Ok(derivation.mapping.to_value())
    }

    fn run(&self) -> Result<()> {
        let paths = resolve_file_path_patterns(&self.input_settings.input)?;
        let mapper = Mapper::with_options(MapperOptions {
            empty_tokens: empty_tokens(self.drop_empty_tags),
        });

        // each file is mapped on its own tree
        let mut mappings = paths
            .par_iter()
            .map(|path| Ok((path.display().to_string(), self.map_file(&mapper, path)?)))
            .collect::<Result<Vec<(String, Value)>>>()?;

        let output = if mappings.len() == 1 {
            mappings.remove(0).1
        } else {
            Value::Object(mappings.into_iter().collect::<Map<String, Value>>())
        };
        emit(&format!("{output:#}"), self.out.as_deref())
    }
}

impl TagsOut {
    fn run(&self) -> Result<()> {
        let set = AnnotationSet::parse_with(&self.raw, empty_tokens(self.drop_empty_tags));
        let view = json!({
            "tokens": set.tokens().collect::<Vec<_>>(),
            "exclude": set.is_excluded(),
            "text": set.renders_as_text(),
        });
        emit(&format!("{view:#}"), None)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Mapping(target) => target.run(),
            Command::Tags(target) => target.run(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn emit(text: &str, out: Option<&Path>) -> Result<()> {
    let Some(out) = out else {
        println!("{text}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
}

/// Expand globs and literal paths, in order. A file reached twice is kept once.
fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = IndexSet::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                out.insert(entry?);
                matched_any = true;
            }
            if !matched_any {
                // an explicit glob that matched nothing is a mistake, not an empty run
                anyhow::bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.insert(PathBuf::from(pattern));
        }
    }

    Ok(out.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("elastic-mapping-cli-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "dir/b.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a.json"), PathBuf::from("dir/b.json")]);
    }

    #[test]
    fn repeated_paths_are_resolved_once() {
        let dir = scratch_dir("dedup");
        std::fs::write(dir.join("a.json"), "{}").unwrap();
        std::fs::write(dir.join("b.json"), "{}").unwrap();
        let literal = dir.join("a.json");
        let pattern = dir.join("*.json");

        let paths = resolve_file_path_patterns([
            literal.to_str().unwrap(),
            pattern.to_str().unwrap(),
            literal.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(paths, [literal, dir.join("b.json")]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        let err = resolve_file_path_patterns(["/no/such/dir/*.json"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }

    #[test]
    fn parses_mapping_arguments() {
        let cli = CommandLineInterface::try_parse_from([
            "elastic-mapping",
            "mapping",
            "-i",
            "a.json",
            "b.json",
            "--record",
            "Post",
            "--drop-empty-tags",
        ])
        .unwrap();
        let Command::Mapping(target) = cli.cmd else {
            panic!("expected the mapping subcommand");
        };
        assert_eq!(target.input_settings.input, ["a.json", "b.json"]);
        assert_eq!(target.input_settings.record.as_deref(), Some("Post"));
        assert!(target.drop_empty_tags);
        assert!(target.root_name.is_none());
    }

    #[test]
    fn mapping_has_no_debug_flag() {
        let parsed =
            CommandLineInterface::try_parse_from(["elastic-mapping", "mapping", "-i", "a.json", "--no-op"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn load_errors_name_the_catalog_file() {
        let dir = scratch_dir("broken");
        let catalog = dir.join("broken-catalog.json");
        std::fs::write(&catalog, r#"{"records": {"A": {"fields": [{"name": 1}]}}}"#).unwrap();

        let cli = CommandLineInterface::try_parse_from([
            "elastic-mapping",
            "mapping",
            "-i",
            catalog.to_str().unwrap(),
        ])
        .unwrap();
        let err = cli.run().unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("broken-catalog.json"), "{message}");
        assert!(message.contains("JSON path"), "{message}");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn maps_a_catalog_file() {
        let dir = scratch_dir("map");
        let catalog = dir.join("post.json");
        std::fs::write(
            &catalog,
            r#"{"root": "Post", "records": {"Post": {"fields": [
                {"name": "title", "type": "string", "tag": "text"},
                {"name": "published", "type": "timestamp"}
            ]}}}"#,
        )
        .unwrap();
        let out = dir.join("out").join("post.mapping.json");

        let cli = CommandLineInterface::try_parse_from([
            "elastic-mapping",
            "mapping",
            "-i",
            catalog.to_str().unwrap(),
            "--root-name",
            "doc",
            "-o",
            out.to_str().unwrap(),
        ])
        .unwrap();
        cli.run().unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(
            written,
            json!({"mappings": {"doc": {"properties": {
                "title": {"type": "text"},
                "published": {"type": "date"}
            }}}})
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
