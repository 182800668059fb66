//! Project scaffold generator for `ponzu new`.
//!
//! Generates a minimal project layout:
//! - ponzu.toml with paths, build and TLS settings
//! - README.md and .gitignore
//! - empty content/ and cmd/ponzu/ directories

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

/// Upstream source repository recorded in new projects
pub const DEFAULT_REPOSITORY: &str = "https://github.com/ponzu-cms/ponzu";

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("directory {0} already exists and is not empty")]
    NotEmpty(PathBuf),

    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to generate {path}: {message}")]
    Generate { path: PathBuf, message: String },
}

/// Result of scaffold generation.
#[derive(Debug, Clone)]
pub struct ScaffoldResult {
    /// Files and directories that were created.
    pub created: Vec<PathBuf>,
    /// Root of the new project.
    pub output_dir: PathBuf,
}

impl ScaffoldResult {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            created: Vec::new(),
            output_dir,
        }
    }

    /// Generate a summary string.
    pub fn summary(&self) -> String {
        format!(
            "New ponzu project created at {} ({} entries)",
            self.output_dir.display(),
            self.created.len()
        )
    }
}

/// Configuration for scaffold generation.
#[derive(Debug, Clone, Default)]
pub struct ScaffoldOptions {
    /// Project is used for ponzu core development (`--dev`).
    pub dev: bool,
    /// Alternate source repository (`--fork`).
    pub fork: Option<String>,
}

impl ScaffoldOptions {
    pub fn repository(&self) -> &str {
        self.fork.as_deref().unwrap_or(DEFAULT_REPOSITORY)
    }
}

/// A single file to be scaffolded.
pub trait ScaffoldFile {
    /// Relative path within the project directory.
    fn path(&self) -> &'static str;

    /// Generate the file content.
    fn generate(&self, project_name: &str, options: &ScaffoldOptions) -> Result<String>;
}

// =============================================================================
// FILE GENERATORS
// =============================================================================

/// Generates ponzu.toml, the project config read by every ponzu command.
pub struct ProjectConfigGenerator;

impl ScaffoldFile for ProjectConfigGenerator {
    fn path(&self) -> &'static str {
        "ponzu.toml"
    }

    fn generate(&self, project_name: &str, options: &ScaffoldOptions) -> Result<String> {
        Ok(format!(
            r#"# {project_name}

[source]
repository = "{repository}"
dev = {dev}

[paths]
data = ".ponzu"
content = "content"

[build]
binary = "ponzu-server"
package = "./cmd/ponzu"

[tls]
dev_port = 10443

[logging]
level = "info"
to_file = false
"#,
            repository = options.repository(),
            dev = options.dev,
        ))
    }
}

/// Generates README.md.
pub struct ReadmeGenerator;

impl ScaffoldFile for ReadmeGenerator {
    fn path(&self) -> &'static str {
        "README.md"
    }

    fn generate(&self, project_name: &str, _options: &ScaffoldOptions) -> Result<String> {
        Ok(format!(
            r#"# {project_name}

A ponzu content server project.

```bash
ponzu generate content post title:string body:string:richtext
ponzu build
ponzu run admin,api
```

Content type definitions live in `content/`. Runtime data (config store,
analytics, certificates) is kept in `.ponzu/`.
"#
        ))
    }
}

/// Generates .gitignore.
pub struct GitignoreGenerator;

impl ScaffoldFile for GitignoreGenerator {
    fn path(&self) -> &'static str {
        ".gitignore"
    }

    fn generate(&self, _project_name: &str, _options: &ScaffoldOptions) -> Result<String> {
        Ok(".ponzu/\nponzu-server\n".to_string())
    }
}

// =============================================================================
// SCAFFOLD ORCHESTRATOR
// =============================================================================

/// Directories created empty in every project
const DIRECTORIES: &[&str] = &["content", "cmd/ponzu"];

/// The main scaffold generator.
pub struct ProjectScaffold {
    output_dir: PathBuf,
    options: ScaffoldOptions,
}

impl ProjectScaffold {
    pub fn new(output_dir: PathBuf, options: ScaffoldOptions) -> Self {
        Self {
            output_dir,
            options,
        }
    }

    /// Get all file generators.
    fn generators(&self) -> Vec<Box<dyn ScaffoldFile>> {
        vec![
            Box::new(ProjectConfigGenerator),
            Box::new(ReadmeGenerator),
            Box::new(GitignoreGenerator),
        ]
    }

    fn project_name(&self) -> String {
        self.output_dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "ponzu-project".to_string())
    }

    /// Generate the project. Fails before writing anything if the target
    /// directory exists and is not empty.
    pub fn generate(&self) -> Result<ScaffoldResult, ScaffoldError> {
        if !is_empty_or_missing(&self.output_dir) {
            return Err(ScaffoldError::NotEmpty(self.output_dir.clone()));
        }

        let mut result = ScaffoldResult::new(self.output_dir.clone());
        let project_name = self.project_name();

        for dir in DIRECTORIES {
            let path = self.output_dir.join(dir);
            fs::create_dir_all(&path).map_err(|source| ScaffoldError::Create {
                path: path.clone(),
                source,
            })?;
            result.created.push(path);
        }

        for generator in self.generators() {
            let path = self.output_dir.join(generator.path());
            let content = generator
                .generate(&project_name, &self.options)
                .map_err(|e| ScaffoldError::Generate {
                    path: path.clone(),
                    message: e.to_string(),
                })?;

            fs::write(&path, content).map_err(|source| ScaffoldError::Create {
                path: path.clone(),
                source,
            })?;
            result.created.push(path);
        }

        tracing::info!(
            dir = %self.output_dir.display(),
            repository = self.options.repository(),
            dev = self.options.dev,
            "Scaffolded project"
        );

        Ok(result)
    }
}

fn is_empty_or_missing(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => !dir.exists(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("mysite");

        let result = ProjectScaffold::new(output.clone(), ScaffoldOptions::default())
            .generate()
            .unwrap();

        assert!(output.join("ponzu.toml").is_file());
        assert!(output.join("README.md").is_file());
        assert!(output.join(".gitignore").is_file());
        assert!(output.join("content").is_dir());
        assert!(output.join("cmd/ponzu").is_dir());
        assert_eq!(result.created.len(), 5);
        assert!(result.summary().contains("mysite"));

        let config = std::fs::read_to_string(output.join("ponzu.toml")).unwrap();
        assert!(config.starts_with("# mysite"));
        assert!(config.contains(DEFAULT_REPOSITORY));
        assert!(config.contains("dev = false"));
    }

    #[test]
    fn test_generated_config_is_valid_toml() {
        let options = ScaffoldOptions {
            dev: true,
            fork: Some("https://github.com/me/ponzu".to_string()),
        };
        let content = ProjectConfigGenerator.generate("site", &options).unwrap();
        let parsed: toml::Value = toml::from_str(&content).unwrap();

        assert_eq!(
            parsed["source"]["repository"].as_str(),
            Some("https://github.com/me/ponzu")
        );
        assert_eq!(parsed["source"]["dev"].as_bool(), Some(true));
        assert_eq!(parsed["build"]["binary"].as_str(), Some("ponzu-server"));
    }

    #[test]
    fn test_existing_empty_directory_is_accepted() {
        let temp_dir = TempDir::new().unwrap();
        ProjectScaffold::new(temp_dir.path().to_path_buf(), ScaffoldOptions::default())
            .generate()
            .unwrap();
        assert!(temp_dir.path().join("ponzu.toml").exists());
    }

    #[test]
    fn test_non_empty_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("keep.txt"), "mine").unwrap();

        let err = ProjectScaffold::new(temp_dir.path().to_path_buf(), ScaffoldOptions::default())
            .generate()
            .unwrap_err();

        assert!(matches!(err, ScaffoldError::NotEmpty(_)));
        assert!(!temp_dir.path().join("ponzu.toml").exists());
    }
}
