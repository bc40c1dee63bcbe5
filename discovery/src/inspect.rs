//! Per-script inspection and catalog assembly.
//!
//! [`inspect_script`] runs the metadata parser and the command extractor
//! independently over one script's text. [`build_catalog`] turns a batch of
//! reports into a [`ScriptCatalog`] with collision-free identifiers.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use script_manifest_core::{
    CommandSignature, IdentifierAllocator, ScriptCatalog, ScriptMetadata, ScriptRecord,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::InspectConfig;
use crate::error::{InspectError, Result};
use crate::metadata::MetadataParser;
use crate::signature::CommandExtractor;

static VERSION_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?\d+(\.\d+)*([-+][0-9A-Za-z.]+)?$").expect("static regex must compile")
});

/// Everything extracted from one script, before identifiers are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptReport {
    /// Path relative to the collection root, with `/` separators.
    pub path: String,
    /// Unsanitized name the script's identifier is derived from.
    pub identifier_seed: String,
    pub metadata: ScriptMetadata,
    pub commands: Vec<CommandSignature>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ScriptReport {
    /// Converts the report into a catalog record under `identifier`.
    pub fn into_record(self, identifier: &str) -> ScriptRecord {
        let mut record = ScriptRecord::new(identifier, &self.path, self.metadata);
        record.commands = self.commands;
        record.warnings = self.warnings;
        record
    }
}

/// Inspects one script's text.
///
/// `path` is the script's path relative to the collection root. When the
/// configuration carries a base URL and the manifest has no
/// `external_source`, `script_source` is synthesized from the two.
///
/// # Errors
///
/// Fails only when the Python grammar cannot be set up; malformed manifests
/// and signatures degrade to fallback values and warnings.
///
/// # Examples
///
/// ```
/// use script_manifest_discovery::config::InspectConfig;
/// use script_manifest_discovery::inspect::inspect_script;
///
/// let source = "\
/// ## /// script
/// ## title = \"Hello\"
/// ## ///
/// @app.command()
/// def hello(name: str):
///     pass
/// ";
/// let config = InspectConfig {
///     base_url: "https://example.org/scripts".into(),
///     ..InspectConfig::default()
/// };
/// let report = inspect_script("hello/0.1.0.py", source, &config).unwrap();
/// assert_eq!(report.metadata.title(), Some("Hello"));
/// assert_eq!(report.commands[0].name, "hello");
/// assert_eq!(report.identifier_seed, "hello");
/// assert_eq!(
///     report.metadata.script_source.as_deref(),
///     Some("https://example.org/scripts/hello/0.1.0.py")
/// );
/// ```
pub fn inspect_script(path: &str, source: &str, config: &InspectConfig) -> Result<ScriptReport> {
    let mut parser = MetadataParser::new(source);
    let mut metadata = parser.parse();
    let warnings = parser.warnings().to_vec();

    if !config.base_url.is_empty() {
        metadata.resolve_script_source(&config.base_url, path);
    }

    let commands = CommandExtractor::new(&config.extractor).extract_source(source)?;

    info!(
        path,
        entries = metadata.len(),
        commands = commands.len(),
        warnings = warnings.len(),
        "inspected script"
    );

    Ok(ScriptReport {
        path: path.to_string(),
        identifier_seed: identifier_seed(path),
        metadata,
        commands,
        warnings,
    })
}

/// Reads and inspects the script at `path`.
///
/// The report path is `path` relative to `root` when it lies under it.
pub fn inspect_file(
    root: impl AsRef<Path>,
    path: impl AsRef<Path>,
    config: &InspectConfig,
) -> Result<ScriptReport> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    let relative = relative_path(root.as_ref(), path);
    inspect_script(&relative, &source, config)
}

/// Renders `path` relative to `root` with `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            Component::ParentDir => Some(".."),
            Component::Prefix(_) | Component::RootDir | Component::CurDir => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Expands files and directories into a sorted, de-duplicated list of
/// Python scripts.
///
/// Directories are walked recursively; hidden entries (names starting with
/// `.`) are skipped. Files given explicitly must end in `.py`.
pub fn collect_script_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if inputs.is_empty() {
        return Err(InspectError::InvalidInput(
            "No script paths were provided".to_string(),
        ));
    }

    let mut paths = BTreeSet::new();
    for input in inputs {
        if input.is_dir() {
            walk_dir(input, &mut paths)?;
            continue;
        }

        if input.is_file() {
            if !is_python_file(input) {
                return Err(InspectError::InvalidInput(format!(
                    "Script file '{}' must end in .py",
                    input.display()
                )));
            }
            paths.insert(input.clone());
            continue;
        }

        return Err(InspectError::InvalidInput(format!(
            "Script path '{}' does not exist",
            input.display()
        )));
    }

    Ok(paths.into_iter().collect())
}

fn walk_dir(dir: &Path, paths: &mut BTreeSet<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'));
        if hidden {
            continue;
        }
        if path.is_dir() {
            walk_dir(&path, paths)?;
        } else if is_python_file(&path) {
            paths.insert(path);
        }
    }
    Ok(())
}

fn is_python_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new("py"))
}

/// Picks the name a script's identifier is derived from.
///
/// Scripts are often stored as `<name>/<version>.py`; for those the parent
/// directory names the script. Otherwise the file stem does.
///
/// # Examples
///
/// ```
/// use script_manifest_discovery::inspect::identifier_seed;
///
/// assert_eq!(identifier_seed("hello-world/0.1.0.py"), "hello-world");
/// assert_eq!(identifier_seed("tools/cleanup.py"), "cleanup");
/// assert_eq!(identifier_seed("0.2.py"), "0.2");
/// ```
pub fn identifier_seed(path: &str) -> String {
    let path = Path::new(path);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();

    if VERSION_STEM.is_match(stem) {
        let parent = path
            .parent()
            .and_then(|parent| parent.file_name())
            .and_then(|name| name.to_str());
        if let Some(parent) = parent {
            return parent.to_string();
        }
    }
    stem.to_string()
}

/// Assembles reports into a catalog, in the order given.
///
/// Excluded paths are dropped. Versioned files in one `<name>/` directory
/// are one script: only the latest version is kept. Identifiers are
/// sanitized seeds; a seed that collides with an earlier one gets a
/// numeric suffix.
pub fn build_catalog(
    reports: Vec<ScriptReport>,
    version: &str,
    generated_at: &str,
    config: &InspectConfig,
) -> ScriptCatalog {
    let mut catalog = ScriptCatalog::new(version, generated_at);
    catalog.name = config.catalog.name.clone();

    let reports: Vec<ScriptReport> = reports
        .into_iter()
        .filter(|report| {
            let excluded = config.is_excluded(&report.path);
            if excluded {
                debug!(path = %report.path, "excluded from catalog");
            }
            !excluded
        })
        .collect();

    let mut latest: HashMap<&str, usize> = HashMap::new();
    for (index, report) in reports.iter().enumerate() {
        let Some(directory) = version_directory(&report.path) else {
            continue;
        };
        latest
            .entry(directory)
            .and_modify(|best| {
                if compare_versions(&report.path, &reports[*best].path) == Ordering::Greater {
                    *best = index;
                }
            })
            .or_insert(index);
    }
    let keep: Vec<bool> = reports
        .iter()
        .enumerate()
        .map(|(index, report)| match version_directory(&report.path) {
            Some(directory) => latest.get(directory) == Some(&index),
            None => true,
        })
        .collect();

    let mut identifiers = IdentifierAllocator::new();
    for (report, keep) in reports.into_iter().zip(keep) {
        if !keep {
            debug!(path = %report.path, "superseded by a newer version");
            continue;
        }
        let identifier = identifiers.claim(&report.identifier_seed);
        if identifier != script_manifest_core::sanitize_identifier(&report.identifier_seed) {
            debug!(
                path = %report.path,
                identifier = %identifier,
                "identifier collided, suffix added"
            );
        }
        catalog.scripts.push(report.into_record(&identifier));
    }

    info!(scripts = catalog.script_count(), "built catalog");
    catalog
}

/// The `<name>` directory of a `<name>/<version>.py` path.
fn version_directory(path: &str) -> Option<&str> {
    let (directory, file) = path.rsplit_once('/')?;
    let stem = file.strip_suffix(".py").unwrap_or(file);
    VERSION_STEM.is_match(stem).then_some(directory)
}

/// Orders two versioned paths by their numeric release components, then
/// by file name.
fn compare_versions(a: &str, b: &str) -> Ordering {
    fn release(path: &str) -> (Vec<u64>, &str) {
        let file = path.rsplit_once('/').map_or(path, |(_, file)| file);
        let stem = file.strip_suffix(".py").unwrap_or(file);
        let stem = stem.strip_prefix('v').unwrap_or(stem);
        let numbers = stem
            .split(['-', '+'])
            .next()
            .unwrap_or_default()
            .split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect();
        (numbers, file)
    }
    release(a).cmp(&release(b))
}
