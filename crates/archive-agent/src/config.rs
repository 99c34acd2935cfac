use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub data_dir: PathBuf,
    pub memory: MemoryConfig,
    pub search: SearchConfig,
    /// Upper bound on a single strategy attempt. Expiry advances the chain.
    pub strategy_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Maximum messages retained per conversation after maintenance.
    pub message_cap: usize,
    /// How many recent messages feed context derivation.
    pub recent_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Cap on keyword search results requested from the collaborator.
    pub keyword_limit: usize,
    /// Cap on the keyword-less diverse-sample request.
    pub diverse_limit: usize,
    /// How many ranked records are handed to generation strategies.
    pub max_context_records: usize,
}

impl AgentConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.memory.message_cap == 0 {
            return Err("memory.message_cap must be > 0".into());
        }
        if self.memory.recent_window == 0 {
            return Err("memory.recent_window must be > 0".into());
        }
        if self.search.keyword_limit == 0 {
            return Err("search.keyword_limit must be > 0".into());
        }
        if self.search.diverse_limit == 0 {
            return Err("search.diverse_limit must be > 0".into());
        }
        if self.search.max_context_records == 0 {
            return Err("search.max_context_records must be > 0".into());
        }
        if self.strategy_timeout_secs == 0 {
            return Err("strategy_timeout_secs must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("archive-agent");

        Self {
            data_dir,
            memory: MemoryConfig {
                message_cap: 50,
                recent_window: 5,
            },
            search: SearchConfig {
                keyword_limit: 25,
                diverse_limit: 30,
                max_context_records: 12,
            },
            strategy_timeout_secs: 30,
        }
    }
}
