use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SpecReconError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Analysis behavior settings
    pub analysis: AnalysisConfig,

    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Root directory to analyze
    pub root_dir: PathBuf,

    /// Base Java package (e.g., "com.company")
    pub base_package: String,

    /// Encoding hints, tried in order (e.g., ["utf-8", "euc-kr", "ms949"])
    pub encodings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Directory glob patterns to exclude from scanning
    pub exclude_dirs: Vec<String>,

    /// Class name patterns treated as utility classes
    pub util_patterns: Vec<String>,

    /// Whether utility classes appear in reports
    pub include_utils: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    pub dir: PathBuf,

    /// Output file name (without extension)
    pub file_name: String,

    /// Report formats to generate
    pub formats: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig {
                root_dir: PathBuf::from("./src"),
                base_package: String::new(),
                encodings: vec![
                    "utf-8".to_string(),
                    "euc-kr".to_string(),
                    "ms949".to_string(),
                ],
            },
            analysis: AnalysisConfig {
                exclude_dirs: vec![
                    "**/test/**".to_string(),
                    "**/tests/**".to_string(),
                    "**/target/**".to_string(),
                    "**/build/**".to_string(),
                    "**/out/**".to_string(),
                    "**/.git/**".to_string(),
                    "**/.svn/**".to_string(),
                    "**/node_modules/**".to_string(),
                ],
                util_patterns: vec![
                    "*Util".to_string(),
                    "*Utils".to_string(),
                    "*Helper".to_string(),
                    "*Helpers".to_string(),
                    "*DTO".to_string(),
                    "*VO".to_string(),
                    "*Entity".to_string(),
                    "*Constant".to_string(),
                    "*Constants".to_string(),
                    "*Config".to_string(),
                    "*Configuration".to_string(),
                ],
                include_utils: false,
            },
            output: OutputConfig {
                dir: PathBuf::from("./output"),
                file_name: "spec-recon-report".to_string(),
                formats: vec![
                    "csv".to_string(),
                    "html".to_string(),
                    "openapi".to_string(),
                ],
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| SpecReconError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SpecReconError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                let candidates = ["spec-recon.toml", ".spec-recon.toml"];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    /// Check if a class name matches any utility pattern
    pub fn is_util(&self, class_name: &str) -> bool {
        self.analysis
            .util_patterns
            .iter()
            .any(|pattern| match_name_pattern(class_name, pattern))
    }

    /// Check if a root-relative path falls under an excluded directory
    pub fn should_exclude(&self, rel_path: &str) -> bool {
        let normalized = rel_path.replace('\\', "/");
        self.analysis
            .exclude_dirs
            .iter()
            .any(|pattern| match_path_pattern(&normalized, pattern))
    }

    /// Full path of the primary output file (without format extension)
    pub fn output_base(&self) -> PathBuf {
        self.output.dir.join(&self.output.file_name)
    }

    /// Create the output directory if missing
    pub fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output.dir)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.project.root_dir.exists() {
            return Err(SpecReconError::Config(format!(
                "root_dir does not exist: {}",
                self.project.root_dir.display()
            )));
        }
        if self.project.encodings.is_empty() {
            return Err(SpecReconError::Config(
                "project.encodings must contain at least one encoding".to_string(),
            ));
        }
        if self.output.file_name.is_empty() {
            return Err(SpecReconError::Config(
                "output.file_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Match a name against a simple glob pattern ('*' only at the ends)
fn match_name_pattern(name: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    if let Some(middle) = pattern
        .strip_prefix('*')
        .and_then(|p| p.strip_suffix('*'))
    {
        name.contains(middle)
    } else if let Some(suffix) = pattern.strip_prefix('*') {
        name.ends_with(suffix)
    } else if let Some(prefix) = pattern.strip_suffix('*') {
        name.starts_with(prefix)
    } else {
        name == pattern
    }
}

/// Match a slash-separated path against a `**/dir/**` style pattern
fn match_path_pattern(path: &str, pattern: &str) -> bool {
    if pattern.contains("**") {
        let parts: Vec<&str> = pattern.splitn(2, "**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_matches('/');
            let suffix = parts[1].trim_matches('/');

            let has_prefix = prefix.is_empty()
                || path.starts_with(&format!("{}/", prefix))
                || path.contains(&format!("/{}/", prefix));

            let has_suffix = suffix.is_empty()
                || path.contains(&format!("/{}/", suffix))
                || path.ends_with(&format!("/{}", suffix))
                || path.starts_with(&format!("{}/", suffix))
                || path == suffix;

            return has_prefix && has_suffix;
        }
    }

    let clean = pattern.trim_matches('*');
    !clean.is_empty() && path.contains(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_excludes_build_trees() {
        let cfg = Config::default();
        assert!(cfg.should_exclude("com/company/target/classes/Foo.java"));
        assert!(cfg.should_exclude("src/test/java/FooTest.java"));
        assert!(cfg.should_exclude("node_modules/pkg/index.js"));
        assert!(!cfg.should_exclude("src/main/java/com/company/UserController.java"));
    }

    #[test]
    fn util_patterns_match_suffixes() {
        let cfg = Config::default();
        assert!(cfg.is_util("StringUtil"));
        assert!(cfg.is_util("DateUtils"));
        assert!(cfg.is_util("ProductDTO"));
        assert!(cfg.is_util("AppConfiguration"));
        assert!(!cfg.is_util("UserController"));
        assert!(!cfg.is_util("ProductService"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = Config::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.project.encodings, cfg.project.encodings);
        assert_eq!(parsed.output.file_name, cfg.output.file_name);
        assert_eq!(parsed.analysis.util_patterns.len(), cfg.analysis.util_patterns.len());
    }

    #[test]
    fn name_pattern_variants() {
        assert!(match_name_pattern("UserMapper", "*Mapper"));
        assert!(match_name_pattern("MapperScan", "Mapper*"));
        assert!(match_name_pattern("XxMapperYy", "*Mapper*"));
        assert!(match_name_pattern("Exact", "Exact"));
        assert!(!match_name_pattern("UserService", "*Mapper"));
    }
}
