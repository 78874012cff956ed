//! Configuration loading.
//!
//! A config file is a TOML document declaring a project and a registry of
//! named workflows. Parsing constructs the engine's object graph directly;
//! the engine never reads the file again. Keys are kebab-case and unknown
//! keys are rejected, so typos surface as configuration errors with the
//! file position toml reports.
//!
//! ```toml
//! project = "example"
//!
//! [workflows.default]
//! mode = "squash"
//!
//! [workflows.default.origin]
//! type = "git"
//! url = "https://github.com/example/upstream"
//! ref = "main"
//!
//! [workflows.default.destination]
//! type = "folder"
//!
//! [workflows.default.authoring]
//! mode = "pass-through"
//!
//! [[workflows.default.transformations]]
//! type = "move"
//! before = "src"
//! after = "lib"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::authoring::{Author, Authoring, AuthoringMode};
use crate::destination::{Destination, FolderDestination, GitDestination};
use crate::error::{MigrateError, Result};
use crate::matcher::PathMatcher;
use crate::origin::{FolderOrigin, GitOrigin, GitRepoType, Origin};
use crate::revision::Revision;
use crate::transform::Transformation;
use crate::workflow::{Workflow, WorkflowMode};

/// Settings that come from outside the config file: CLI flags and the
/// environment.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Root directory for bare repository caches.
    pub storage_root: PathBuf,
    /// Replaces every git origin URL when set (`--git-origin-url`).
    pub origin_url_override: Option<String>,
    /// Replaces each workflow's configured `last-rev` when set.
    pub last_rev_override: Option<String>,
}

/// The loaded registry: a project name and its workflows, keyed by name.
/// Mutable only while loading; the engine reads it.
#[derive(Debug)]
pub struct MigrationConfig {
    pub project: String,
    workflows: IndexMap<String, Workflow>,
    /// Non-fatal findings from loading (e.g. an overridden origin URL).
    /// The CLI surfaces these and continues.
    pub warnings: Vec<String>,
}

impl MigrationConfig {
    /// Load and validate a config file, constructing every workflow's
    /// object graph.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            MigrateError::config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            MigrateError::config(format!("invalid config '{}': {e}", path.display()))
        })?;
        Self::from_file(file, options)
    }

    fn from_file(file: ConfigFile, options: &LoadOptions) -> Result<Self> {
        if file.project.trim().is_empty() {
            return Err(MigrateError::config("project name cannot be empty"));
        }
        if file.workflows.is_empty() {
            return Err(MigrateError::config("config declares no workflows"));
        }

        let mut warnings = Vec::new();
        if let Some(override_url) = &options.origin_url_override {
            for def in file.workflows.values() {
                if let OriginDef::Git { url, .. } = &def.origin
                    && url != override_url
                {
                    warnings.push(format!("Origin URL '{url}' overridden by '{override_url}'"));
                }
            }
        }

        let mut workflows = IndexMap::new();
        for (name, def) in file.workflows {
            if name.trim().is_empty() {
                return Err(MigrateError::config("workflow name cannot be empty"));
            }
            let workflow = def.build(&file.project, &name, options)?;
            workflows.insert(name, workflow);
        }

        Ok(Self {
            project: file.project,
            workflows,
            warnings,
        })
    }

    /// Look up a workflow by name.
    pub fn workflow(&self, name: &str) -> Result<&Workflow> {
        self.workflows.get(name).ok_or_else(|| {
            MigrateError::config(format!(
                "workflow '{name}' is not defined (available: {})",
                self.workflows.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn workflow_names(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    project: String,
    #[serde(default)]
    workflows: IndexMap<String, WorkflowDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct WorkflowDef {
    origin: OriginDef,
    destination: DestinationDef,
    #[serde(default)]
    authoring: Option<AuthoringDef>,
    #[serde(default)]
    transformations: Vec<TransformationDef>,
    #[serde(default)]
    mode: WorkflowMode,
    #[serde(default)]
    last_rev: Option<String>,
    #[serde(default)]
    exclude_in_origin: Vec<String>,
    #[serde(default)]
    exclude_in_destination: Vec<String>,
    #[serde(default)]
    reversible_check: bool,
    #[serde(default)]
    ask_for_confirmation: bool,
}

impl WorkflowDef {
    fn build(self, project: &str, name: &str, options: &LoadOptions) -> Result<Workflow> {
        let origin = self.origin.build(options)?;
        let destination = self.destination.build(project, options)?;
        let authoring = match self.authoring {
            Some(def) => def.build()?,
            None => Authoring::pass_through(),
        };

        let steps = self
            .transformations
            .into_iter()
            .map(TransformationDef::build)
            .collect::<Result<Vec<_>>>()?;
        let transformation = Transformation::sequence(steps);

        let last_rev = options
            .last_rev_override
            .clone()
            .or(self.last_rev)
            .map(Revision::new);

        Ok(Workflow {
            project: project.to_string(),
            name: name.to_string(),
            origin,
            destination,
            authoring,
            transformation,
            last_rev_override: last_rev,
            exclude_in_origin: PathMatcher::of(self.exclude_in_origin)?,
            exclude_in_destination: PathMatcher::of(self.exclude_in_destination)?,
            mode: self.mode,
            reversible_check: self.reversible_check,
            ask_for_confirmation: self.ask_for_confirmation,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum OriginDef {
    #[serde(rename_all = "kebab-case")]
    Git {
        url: String,
        #[serde(default, rename = "ref")]
        reference: Option<String>,
        #[serde(default)]
        repo_type: GitRepoType,
    },
    Folder {
        path: PathBuf,
        #[serde(default)]
        author: Option<String>,
    },
}

impl OriginDef {
    fn build(self, options: &LoadOptions) -> Result<Origin> {
        match self {
            OriginDef::Git {
                url,
                reference,
                repo_type,
            } => {
                if url.trim().is_empty() {
                    return Err(MigrateError::config("origin url cannot be empty"));
                }
                let url = options.origin_url_override.clone().unwrap_or(url);
                Ok(Origin::Git(GitOrigin::new(
                    url,
                    reference,
                    repo_type,
                    &options.storage_root,
                )))
            }
            OriginDef::Folder { path, author } => {
                let author = author.as_deref().map(Author::parse).transpose()?;
                Ok(Origin::Folder(FolderOrigin::new(path, author)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum DestinationDef {
    Git {
        url: String,
        push: String,
    },
    Folder {
        #[serde(default)]
        path: Option<PathBuf>,
    },
}

impl DestinationDef {
    fn build(self, project: &str, options: &LoadOptions) -> Result<Destination> {
        match self {
            DestinationDef::Git { url, push } => {
                if url.trim().is_empty() {
                    return Err(MigrateError::config("destination url cannot be empty"));
                }
                if push.trim().is_empty() {
                    return Err(MigrateError::config("destination push ref cannot be empty"));
                }
                Ok(Destination::Git(GitDestination::new(
                    url,
                    push,
                    &options.storage_root,
                )))
            }
            DestinationDef::Folder { path } => {
                let path = path.map(|p| {
                    PathBuf::from(
                        shellexpand::tilde(&p.to_string_lossy().into_owned()).into_owned(),
                    )
                });
                Ok(Destination::Folder(FolderDestination::new(path, project)))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct AuthoringDef {
    mode: AuthoringMode,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    whitelist: Vec<String>,
}

impl AuthoringDef {
    fn build(self) -> Result<Authoring> {
        let default = self.default.as_deref().map(Author::parse).transpose()?;
        Authoring::new(self.mode, default, self.whitelist)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum TransformationDef {
    Move {
        before: String,
        after: String,
    },
    Sequence {
        steps: Vec<TransformationDef>,
    },
}

impl TransformationDef {
    fn build(self) -> Result<Transformation> {
        match self {
            TransformationDef::Move { before, after } => Transformation::move_of(before, after),
            TransformationDef::Sequence { steps } => Ok(Transformation::sequence(
                steps
                    .into_iter()
                    .map(TransformationDef::build)
                    .collect::<Result<Vec<_>>>()?,
            )),
        }
    }
}
