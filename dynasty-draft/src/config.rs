// Configuration loading and parsing (league.toml, strategy.toml).

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::draft::pick::Position;
use crate::draft::roster::{requirements_from_config, RosterRequirements, Slot};
use crate::valuation::recommend::RecommendationParams;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

/// Immutable configuration, loaded once at startup and handed to each
/// component's constructor.
#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub strategy: StrategyConfig,
    pub feed: FeedConfig,
    pub data_paths: DataPaths,
}

impl Config {
    /// `[league.roster]` as typed slot requirements.
    pub fn roster_requirements(&self) -> RosterRequirements {
        requirements_from_config(&self.league.roster)
    }

    /// `[recommendation]` as scoring parameters.
    pub fn recommendation_params(&self) -> RecommendationParams {
        let rec = &self.strategy.recommendation;
        let position_caps: BTreeMap<Position, usize> = rec
            .position_caps
            .iter()
            .filter_map(|(k, &v)| Position::from_str_pos(k).map(|p| (p, v)))
            .collect();
        RecommendationParams {
            count: rec.count,
            balance_boost: rec.balance_boost,
            ratio_upper: rec.ratio_upper,
            ratio_lower: rec.ratio_lower,
            empty_need_boost: rec.empty_need_boost,
            position_caps,
        }
    }
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    #[serde(default)]
    pub name: String,
    pub platform: String,
    pub league_id: String,
    /// The participant this assistant drafts for.
    pub user_id: String,
    /// Slot key -> required count.
    pub roster: HashMap<String, usize>,
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    recommendation: RecommendationSection,
    refresh: RefreshConfig,
    feed: FeedConfig,
    data_paths: DataPaths,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub recommendation: RecommendationSection,
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationSection {
    pub count: usize,
    pub balance_boost: f64,
    pub ratio_upper: f64,
    pub ratio_lower: f64,
    #[serde(default)]
    pub empty_need_boost: f64,
    /// Position key -> roster count at which the position is excluded.
    #[serde(default = "default_position_caps")]
    pub position_caps: HashMap<String, usize>,
}

fn default_position_caps() -> HashMap<String, usize> {
    HashMap::from([("QB".to_string(), 2), ("TE".to_string(), 1)])
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    pub auto_refresh: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub rankings: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` and
/// `config/strategy.toml`, relative to the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config()` which handles default initialization automatically.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        strategy: StrategyConfig {
            recommendation: strategy_file.recommendation,
            refresh: strategy_file.refresh,
        },
        feed: strategy_file.feed,
        data_paths: strategy_file.data_paths,
    };

    validate(&config)?;

    Ok(config)
}

/// Files read from `config/`, each with a shipped copy under `defaults/`.
const CONFIG_FILES: [&str; 2] = ["league.toml", "strategy.toml"];

/// Copy `defaults/<file>` to `config/<file>` for every config file the user
/// has not created yet. Existing files are never overwritten. Returns the
/// paths that were written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let mut copied = Vec::new();

    for name in CONFIG_FILES {
        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        let source = base_dir.join("defaults").join(name);
        if !source.is_file() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "{} is missing and there is no {} to start from",
                    target.display(),
                    source.display()
                ),
            });
        }
        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("cannot create {}: {e}", config_dir.display()),
        })?;
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("cannot copy {} to {}: {e}", source.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working directory.
/// Ensures default config files are copied before loading.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    // League validations
    let league = &config.league;
    if !league.platform.eq_ignore_ascii_case("sleeper") {
        return Err(invalid(
            "league.platform",
            format!("unsupported platform '{}', expected \"sleeper\"", league.platform),
        ));
    }
    if league.league_id.trim().is_empty() {
        return Err(invalid("league.league_id", "must not be empty"));
    }
    if league.user_id.trim().is_empty() {
        return Err(invalid("league.user_id", "must not be empty"));
    }
    for key in league.roster.keys() {
        if Slot::from_config_key(key).is_none() {
            return Err(invalid(
                &format!("league.roster.{key}"),
                "unknown roster slot",
            ));
        }
    }
    if league.roster.values().sum::<usize>() == 0 {
        return Err(invalid("league.roster", "must contain at least one slot"));
    }

    // Recommendation validations
    let rec = &config.strategy.recommendation;
    if rec.count == 0 {
        return Err(invalid("recommendation.count", "must be greater than 0"));
    }
    let boost_fields: &[(&str, f64)] = &[
        ("recommendation.balance_boost", rec.balance_boost),
        ("recommendation.empty_need_boost", rec.empty_need_boost),
    ];
    for (name, val) in boost_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(invalid(name, format!("must be a finite value >= 0, got {val}")));
        }
    }
    if !rec.ratio_lower.is_finite() || !rec.ratio_upper.is_finite() {
        return Err(invalid("recommendation.ratio_lower", "ratios must be finite"));
    }
    if rec.ratio_lower <= 0.0 || rec.ratio_lower >= rec.ratio_upper {
        return Err(invalid(
            "recommendation.ratio_lower",
            format!(
                "must satisfy 0 < ratio_lower < ratio_upper, got {} and {}",
                rec.ratio_lower, rec.ratio_upper
            ),
        ));
    }
    for key in rec.position_caps.keys() {
        if Position::from_str_pos(key).is_none() {
            return Err(invalid(
                &format!("recommendation.position_caps.{key}"),
                "unknown position",
            ));
        }
    }

    // Refresh and feed
    if config.strategy.refresh.interval_secs == 0 {
        return Err(invalid("refresh.interval_secs", "must be greater than 0"));
    }
    if config.feed.timeout_secs == 0 {
        return Err(invalid("feed.timeout_secs", "must be greater than 0"));
    }
    if config.feed.base_url.trim().is_empty() {
        return Err(invalid("feed.base_url", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// Helper: returns the path to the dynasty-draft crate root
    /// (works whether `cargo test` runs from the crate root or repo root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("dynasty-draft/defaults").exists() {
            cwd.join("dynasty-draft")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh temp dir with `config/` holding the default files.
    fn temp_with_defaults(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&config_dir).unwrap();
        let root = project_root();
        fs::copy(root.join("defaults/league.toml"), config_dir.join("league.toml")).unwrap();
        fs::copy(root.join("defaults/strategy.toml"), config_dir.join("strategy.toml")).unwrap();
        tmp
    }

    /// Rewrite one config file with a textual substitution.
    fn patch(tmp: &Path, file: &str, from: &str, to: &str) {
        let path = tmp.join("config").join(file);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(from), "{file} does not contain {from:?}");
        fs::write(&path, text.replace(from, to)).unwrap();
    }

    fn expect_invalid(tmp: &Path, expected_field: &str) {
        let err = load_config_from(tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_project_files() {
        let tmp = temp_with_defaults("dynasty_config_test_defaults");
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.league.platform, "sleeper");
        assert!(!config.league.league_id.is_empty());
        assert_eq!(config.league.roster.get("QB"), Some(&1));
        assert_eq!(config.league.roster.get("SUPER_FLEX"), Some(&1));

        let reqs = config.roster_requirements();
        assert_eq!(reqs[&Slot::Position(Position::WideReceiver)], 3);
        assert_eq!(reqs[&Slot::Flex], 2);
        assert_eq!(reqs[&Slot::Bench], 12);

        let params = config.recommendation_params();
        assert_eq!(params.count, 5);
        assert!((params.balance_boost - 10.0).abs() < f64::EPSILON);
        assert!((params.ratio_upper - 1.3).abs() < f64::EPSILON);
        assert!((params.ratio_lower - 0.7).abs() < f64::EPSILON);
        assert_eq!(params.empty_need_boost, 0.0);
        assert_eq!(params.position_caps.get(&Position::Quarterback), Some(&2));
        assert_eq!(params.position_caps.get(&Position::TightEnd), Some(&1));

        assert!(config.strategy.refresh.auto_refresh);
        assert_eq!(config.strategy.refresh.interval_secs, 30);
        assert_eq!(config.feed.base_url, "https://api.sleeper.app/v1");
        assert_eq!(config.feed.timeout_secs, 10);
        assert_eq!(config.data_paths.rankings, "data/rankings.csv");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn position_caps_default_when_absent() {
        let tmp = temp_with_defaults("dynasty_config_test_caps_default");
        patch(
            &tmp,
            "strategy.toml",
            "[recommendation.position_caps]\nQB = 2\nTE = 1\n",
            "",
        );
        let config = load_config_from(&tmp).unwrap();
        let params = config.recommendation_params();
        assert_eq!(params.position_caps.get(&Position::Quarterback), Some(&2));
        assert_eq!(params.position_caps.get(&Position::TightEnd), Some(&1));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unsupported_platform() {
        let tmp = temp_with_defaults("dynasty_config_test_platform");
        patch(&tmp, "league.toml", "platform = \"sleeper\"", "platform = \"espn\"");
        expect_invalid(&tmp, "league.platform");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_empty_user_id() {
        let tmp = temp_with_defaults("dynasty_config_test_user_id");
        patch(&tmp, "league.toml", "user_id = \"734219874589102080\"", "user_id = \"\"");
        expect_invalid(&tmp, "league.user_id");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_roster_slot() {
        let tmp = temp_with_defaults("dynasty_config_test_roster_slot");
        patch(&tmp, "league.toml", "BENCH = 12", "TAXI = 4");
        expect_invalid(&tmp, "league.roster.TAXI");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_count() {
        let tmp = temp_with_defaults("dynasty_config_test_count");
        patch(&tmp, "strategy.toml", "count = 5", "count = 0");
        expect_invalid(&tmp, "recommendation.count");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_negative_boost() {
        let tmp = temp_with_defaults("dynasty_config_test_boost");
        patch(&tmp, "strategy.toml", "balance_boost = 10.0", "balance_boost = -1.0");
        expect_invalid(&tmp, "recommendation.balance_boost");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_inverted_ratios() {
        let tmp = temp_with_defaults("dynasty_config_test_ratios");
        patch(&tmp, "strategy.toml", "ratio_lower = 0.7", "ratio_lower = 1.5");
        expect_invalid(&tmp, "recommendation.ratio_lower");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_cap_position() {
        let tmp = temp_with_defaults("dynasty_config_test_cap_pos");
        patch(&tmp, "strategy.toml", "TE = 1", "XX = 1");
        expect_invalid(&tmp, "recommendation.position_caps.XX");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_interval_and_timeout() {
        let tmp = temp_with_defaults("dynasty_config_test_interval");
        patch(&tmp, "strategy.toml", "interval_secs = 30", "interval_secs = 0");
        expect_invalid(&tmp, "refresh.interval_secs");
        let _ = fs::remove_dir_all(&tmp);

        let tmp = temp_with_defaults("dynasty_config_test_timeout");
        patch(&tmp, "strategy.toml", "timeout_secs = 10", "timeout_secs = 0");
        expect_invalid(&tmp, "feed.timeout_secs");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn each_missing_file_is_reported_by_name() {
        for file in CONFIG_FILES {
            let tmp = temp_with_defaults(&format!("dynasty_config_test_missing_{file}"));
            fs::remove_file(tmp.join("config").join(file)).unwrap();

            match load_config_from(&tmp).unwrap_err() {
                ConfigError::FileNotFound { path } => assert!(path.ends_with(file)),
                other => panic!("expected FileNotFound for {file}, got: {other}"),
            }

            let _ = fs::remove_dir_all(&tmp);
        }
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = temp_with_defaults("dynasty_config_test_invalid_toml");
        fs::write(tmp.join("config/league.toml"), "this is not valid [[[ toml").unwrap();

        let err = load_config_from(&tmp).unwrap_err();
        match &err {
            ConfigError::ParseError { path, .. } => {
                assert!(path.ends_with("league.toml"));
            }
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    /// Temp dir with only `defaults/` populated.
    fn temp_with_shipped_defaults(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        let root = project_root();
        for file in CONFIG_FILES {
            fs::copy(root.join("defaults").join(file), tmp.join("defaults").join(file)).unwrap();
        }
        tmp
    }

    #[test]
    fn first_run_copies_defaults_and_loads() {
        let tmp = temp_with_shipped_defaults("dynasty_config_test_first_run");

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 2);
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.league.platform, "sleeper");

        // Second run has nothing left to copy.
        assert!(ensure_config_files(&tmp).unwrap().is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn edited_config_survives_defaults_copy() {
        let tmp = temp_with_shipped_defaults("dynasty_config_test_edited");
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/strategy.toml"), "# mine\n").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/league.toml")]);
        assert_eq!(
            fs::read_to_string(tmp.join("config/strategy.toml")).unwrap(),
            "# mine\n"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_config_without_default_is_reported() {
        let tmp = temp_with_shipped_defaults("dynasty_config_test_no_default");
        fs::remove_file(tmp.join("defaults/league.toml")).unwrap();

        match ensure_config_files(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("league.toml"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
