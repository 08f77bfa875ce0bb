//! Configuration file loading for authstrip.
//!
//! Discovers and loads `authstrip.toml` from the scan root. Merges config file
//! settings with CLI arguments (CLI takes precedence, CLI lists extend config
//! lists).

use anyhow::Context;
use authstrip_rules::{AccessPolicy, ImportMarker, PatternRegistry, PatternRule, PolicyMode};
use authstrip_scan::ScanConfig;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "authstrip.toml";

/// Top-level configuration from authstrip.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthstripConfig {
    pub scan: ScanSection,
    pub policy: PolicySection,
    pub marker: MarkerSection,
    /// Extra rules, applied after the builtin catalog.
    pub rules: Vec<RuleConfig>,
    pub verify: Option<VerifySection>,
}

/// Additions to the default scan settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSection {
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySection {
    pub mode: Option<PolicyMode>,
    pub user_id: Option<String>,
}

/// Overrides for the bypass-import marker. Unset fields keep the default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerSection {
    pub detect: Option<String>,
    pub lines: Option<Vec<String>>,
}

/// A setting the backend must contain once it runs without auth.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifySection {
    /// Relative to the scan root.
    pub file: Utf8PathBuf,
    pub contains: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub id: String,
    pub pattern: String,
    /// `regex` replacement template; `{user_id}` expands to the policy's user id.
    pub replace: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Searches for `authstrip.toml` in the scan root.
pub fn discover_config(root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if config_path.is_file() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

pub fn load_config(path: &Utf8Path) -> anyhow::Result<AuthstripConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

pub fn parse_config(contents: &str) -> anyhow::Result<AuthstripConfig> {
    let config: AuthstripConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Loads `explicit` if given, otherwise the root's config file, otherwise defaults.
pub fn load_or_default(
    root: &Utf8Path,
    explicit: Option<&Utf8Path>,
) -> anyhow::Result<AuthstripConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(root) {
        Some(path) => load_config(&path),
        None => Ok(AuthstripConfig::default()),
    }
}

/// CLI inputs that can override or extend the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub policy: Option<PolicyMode>,
    pub user_id: Option<String>,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub scan: ScanConfig,
    pub policy: AccessPolicy,
    pub marker: ImportMarker,
    pub extra_rules: Vec<PatternRule>,
    pub verify: Option<VerifySection>,
}

impl MergedConfig {
    /// Builtin rules for the policy, then the extra rules, with the merged marker.
    ///
    /// Extra rules only apply under the permissive policy; enforcing runs are no-ops.
    pub fn registry(&self) -> anyhow::Result<PatternRegistry> {
        let base = PatternRegistry::for_policy(&self.policy).context("build rule catalog")?;
        let registry = match self.policy {
            AccessPolicy::Enforcing => base,
            AccessPolicy::Permissive { .. } => base
                .extend(self.extra_rules.clone())
                .context("add configured rules")?,
        };
        registry
            .with_marker(self.marker.clone())
            .context("configure bypass marker")
    }
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: AuthstripConfig,
}

impl ConfigMerger {
    pub fn new(config: AuthstripConfig) -> Self {
        Self { config }
    }

    pub fn merge(self, cli: &CliOverrides) -> anyhow::Result<MergedConfig> {
        let mut scan = ScanConfig::default();
        for ext in self.config.scan.extensions.iter().chain(&cli.extensions) {
            scan.extensions.insert(normalize_extension(ext));
        }
        for name in self.config.scan.exclude.iter().chain(&cli.exclude) {
            scan.excluded_dirs.insert(name.clone());
        }

        let mode = cli.policy.or(self.config.policy.mode).unwrap_or_default();
        let user_id = cli
            .user_id
            .as_deref()
            .or(self.config.policy.user_id.as_deref());
        let policy = AccessPolicy::from_mode(mode, user_id).context("invalid policy")?;

        let defaults = ImportMarker::default();
        let marker = ImportMarker {
            detect: self.config.marker.detect.unwrap_or(defaults.detect),
            lines: self.config.marker.lines.unwrap_or(defaults.lines),
        };

        let substitute = match &policy {
            AccessPolicy::Permissive { user_id } => user_id.replace('$', "$$"),
            AccessPolicy::Enforcing => String::new(),
        };
        let extra_rules = self
            .config
            .rules
            .iter()
            .map(|r| {
                let template = r.replace.replace("{user_id}", &substitute);
                let rule = PatternRule::template(r.id.as_str(), &r.pattern, template)
                    .with_context(|| format!("invalid rule '{}'", r.id))?;
                Ok(match &r.description {
                    Some(d) => rule.with_description(d.as_str()),
                    None => rule,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        debug!(
            "merged config: mode={:?}, extensions={:?}, excluded={:?}, extra_rules={}",
            policy.mode(),
            scan.extensions,
            scan.excluded_dirs,
            extra_rules.len()
        );

        Ok(MergedConfig {
            scan,
            policy,
            marker,
            extra_rules,
            verify: self.config.verify,
        })
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

/// Parses `KEY=VALUE` arguments. Values may be empty and may contain `=`.
pub fn parse_env_pairs(pairs: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    let mut out: Vec<(String, String)> = Vec::new();
    for entry in pairs {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid pair '{}': expected KEY=VALUE", entry))?;
        let key = key.trim();
        if key.is_empty() || key.chars().any(char::is_whitespace) || key.starts_with('#') {
            anyhow::bail!("invalid pair '{}': bad key", entry);
        }
        match out.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.to_string(),
            None => out.push((key.to_string(), value.to_string())),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_config_gives_defaults() {
        let config = parse_config("").unwrap();
        let merged = ConfigMerger::new(config)
            .merge(&CliOverrides::default())
            .unwrap();
        assert_eq!(merged.scan, ScanConfig::default());
        assert_eq!(merged.policy, AccessPolicy::permissive());
        assert_eq!(merged.marker, ImportMarker::default());
        assert!(merged.extra_rules.is_empty());
        assert!(merged.verify.is_none());
        assert_eq!(merged.registry().unwrap().len(), 8);
    }

    #[test]
    fn full_config_parses() {
        let config = parse_config(
            r#"
[scan]
extensions = [".pyi"]
exclude = ["migrations"]

[policy]
mode = "permissive"
user_id = "dev"

[marker]
lines = ["from utils.no_auth import get_default_user_id"]

[[rules]]
id = "billing-check"
pattern = '\bawait check_billing\(\w+\)'
replace = 'True  # billing disabled for {user_id}'
description = "Billing always passes."

[verify]
file = "utils/config.py"
contains = "NO_AUTH_MODE: bool = True"
"#,
        )
        .unwrap();

        let merged = ConfigMerger::new(config)
            .merge(&CliOverrides::default())
            .unwrap();
        assert!(merged.scan.extensions.contains("pyi"));
        assert!(merged.scan.extensions.contains("py"));
        assert!(merged.scan.excluded_dirs.contains("migrations"));
        assert!(merged.scan.excluded_dirs.contains(".git"));
        assert_eq!(merged.marker.detect, "from utils.no_auth import");
        assert_eq!(merged.marker.lines.len(), 1);
        assert_eq!(
            merged.verify,
            Some(VerifySection {
                file: "utils/config.py".into(),
                contains: "NO_AUTH_MODE: bool = True".into(),
            })
        );

        let registry = merged.registry().unwrap();
        assert_eq!(registry.len(), 9);
        let last = registry.rules().last().unwrap();
        assert_eq!(last.id().as_str(), "billing-check");
        assert_eq!(
            last.apply("ok = await check_billing(uid)"),
            "ok = True  # billing disabled for dev"
        );
    }

    #[test]
    fn cli_overrides_and_extends() {
        let config = parse_config(
            "[policy]\nmode = \"permissive\"\nuser_id = \"from-file\"\n[scan]\nexclude = [\"a\"]\n",
        )
        .unwrap();
        let cli = CliOverrides {
            policy: None,
            user_id: Some("from-cli".into()),
            extensions: vec!["pyw".into()],
            exclude: vec!["b".into()],
        };
        let merged = ConfigMerger::new(config).merge(&cli).unwrap();
        assert_eq!(
            merged.policy,
            AccessPolicy::Permissive {
                user_id: "from-cli".into()
            }
        );
        assert!(merged.scan.excluded_dirs.contains("a"));
        assert!(merged.scan.excluded_dirs.contains("b"));
        assert!(merged.scan.extensions.contains("pyw"));
    }

    #[test]
    fn enforcing_skips_extra_rules() {
        let config =
            parse_config("[[rules]]\nid = \"x\"\npattern = \"guard\\\\(\\\\)\"\nreplace = \"ok()\"\n")
                .unwrap();
        let cli = CliOverrides {
            policy: Some(PolicyMode::Enforcing),
            ..CliOverrides::default()
        };
        let merged = ConfigMerger::new(config).merge(&cli).unwrap();
        assert!(merged.registry().unwrap().is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("[scan]\nextension = [\"py\"]\n").is_err());
        assert!(parse_config("[poilcy]\nmode = \"enforcing\"\n").is_err());
        assert!(parse_config("[verify]\nfile = \"a.py\"\n").is_err());
    }

    #[test]
    fn invalid_rule_pattern_is_an_error() {
        let config = parse_config("[[rules]]\nid = \"bad\"\npattern = \"(\"\nreplace = \"\"\n").unwrap();
        let err = ConfigMerger::new(config)
            .merge(&CliOverrides::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("invalid rule 'bad'"));
    }

    #[test]
    fn duplicate_rule_id_is_an_error() {
        let config = parse_config(
            "[[rules]]\nid = \"jwt-user-dependency\"\npattern = \"x\"\nreplace = \"y\"\n",
        )
        .unwrap();
        let merged = ConfigMerger::new(config)
            .merge(&CliOverrides::default())
            .unwrap();
        assert!(merged.registry().is_err());
    }

    #[test]
    fn invalid_user_id_is_an_error() {
        let cli = CliOverrides {
            user_id: Some("a\"b".into()),
            ..CliOverrides::default()
        };
        assert!(
            ConfigMerger::new(AuthstripConfig::default())
                .merge(&cli)
                .is_err()
        );
    }

    #[test]
    fn env_pairs() {
        let pairs = parse_env_pairs(&[
            "API_URL=https://x.test/?a=b".to_string(),
            "EMPTY=".to_string(),
            "API_URL=https://y.test".to_string(),
        ])
        .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("API_URL".to_string(), "https://y.test".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
        assert!(parse_env_pairs(&["NOEQUALS".to_string()]).is_err());
        assert!(parse_env_pairs(&["=v".to_string()]).is_err());
        assert!(parse_env_pairs(&["A B=v".to_string()]).is_err());
    }

    #[test]
    fn discover_in_root() {
        let td = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(td.path().to_path_buf()).unwrap();
        assert!(discover_config(&root).is_none());
        fs::write(root.join(CONFIG_FILE_NAME), "[policy]\nmode = \"enforcing\"\n").unwrap();
        let config = load_or_default(&root, None).unwrap();
        assert_eq!(config.policy.mode, Some(PolicyMode::Enforcing));
    }
}
