use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use vigil::domain::DifficultyLevel;
use vigil::engine::{DEFAULT_TICK_MS, DifficultyPolicy, ScoringSettings};
use vigil::runner::{DEFAULT_ACCURACY, DEFAULT_REACTION_MS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub difficulty: DifficultyPolicy,
    pub scoring: ScoringSettings,
    pub storage: StorageConfig,
    pub participant: ParticipantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_ms: u64,
    pub default_difficulty: DifficultyLevel,
    /// Overrides every game's default session length
    pub duration_sec: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            default_difficulty: DifficultyLevel::Medium,
            duration_sec: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub results_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            results_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("vigil"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantConfig {
    pub accuracy: f64,
    pub reaction_ms: u64,
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            accuracy: DEFAULT_ACCURACY,
            reaction_ms: DEFAULT_REACTION_MS,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> vigil::Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    fn validate(&self) -> vigil::Result<()> {
        if self.engine.tick_ms == 0 {
            return Err(vigil::VigilError::Config("engine.tick_ms must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.participant.accuracy) {
            return Err(vigil::VigilError::Config(format!(
                "participant.accuracy must be within [0, 1], got {}",
                self.participant.accuracy
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(config.engine.default_difficulty, DifficultyLevel::Medium);
        assert_eq!(config.scoring, ScoringSettings::default());
        assert!(config.storage.results_dir.ends_with("vigil"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let file = write_config("engine:\n  tick_ms: 50\nscoring:\n  points_correct: 20\n");
        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.engine.tick_ms, 50);
        assert_eq!(config.scoring.points_correct, 20);
        assert_eq!(config.scoring.penalty_card_rule, 3);
        assert_eq!(config.difficulty, DifficultyPolicy::default());
    }

    #[test]
    fn test_difficulty_override() {
        let yaml = "difficulty:\n  hard:\n    spawnIntervalMs: 800\n    maxConcurrentStimuli: 6\n    responseDeadlineMs: 900\n    targetProbability: 0.3\n";
        let file = write_config(yaml);
        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.difficulty.hard.spawn_interval_ms, 800);
        assert_eq!(config.difficulty.hard.rule_change_interval_ms, None);
        assert_eq!(config.difficulty.easy, DifficultyPolicy::default().easy);
    }

    #[test]
    fn test_explicit_path_errors_are_fatal() {
        let file = write_config("engine: [not, a, map]\n");
        assert!(Config::load(Some(&file.path().to_path_buf())).is_err());
        assert!(Config::load(Some(&PathBuf::from("/nonexistent/vigil.yml"))).is_err());
    }

    #[test]
    fn test_zero_tick_rejected() {
        let file = write_config("engine:\n  tick_ms: 0\n");
        assert!(Config::load(Some(&file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_malformed_yaml_is_yaml_error() {
        let file = write_config("engine: [not, a, map]\n");
        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, vigil::VigilError::Yaml(_)));

        let file = write_config("engine:\n  tick_ms: 0\n");
        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, vigil::VigilError::Config(_)));
    }
}
