//! JSON5 config file loading and invariant validation.

use crate::{ConfigError, MnemoConfig};
use log::{debug, info};
use std::fs;
use std::path::Path;

impl MnemoConfig {
    /// Load a config from a JSON5 file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load a config from JSON5 contents.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: serde_json::Value = json5::from_str(contents)?;
        let config: MnemoConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("memory.dedup_threshold", self.memory.dedup_threshold),
            ("memory.relevance_threshold", self.memory.relevance_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0.0, 1.0], got {value}"
                )));
            }
        }
        // Summarization keeps the system prompt plus a summary message; the
        // tail must leave room for both below the trigger length.
        if self.conversation.keep_recent + 2 > self.conversation.max_messages {
            return Err(ConfigError::Invalid(format!(
                "conversation.keep_recent ({}) must leave room below max_messages ({})",
                self.conversation.keep_recent, self.conversation.max_messages
            )));
        }
        if self.llm.chat_model.trim().is_empty() || self.llm.embedding_model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "llm.chat_model and llm.embedding_model must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{ConfigError, MnemoConfig};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn loads_json5_with_comments_and_trailing_commas() {
        let config = MnemoConfig::load_from_str(
            r#"{
                // demo overrides
                memory: { dedup_threshold: 0.85, },
                conversation: { ttl_secs: 60, },
            }"#,
        )
        .expect("config");
        assert_eq!(config.memory.dedup_threshold, 0.85);
        assert_eq!(config.conversation.ttl_secs, 60);
        assert_eq!(config.memory.relevance_threshold, 0.3);
    }

    #[test]
    fn loads_from_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("mnemo.json5");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "{{ server: {{ listen: \"0.0.0.0:9000\" }} }}").expect("write");

        let config = MnemoConfig::load_from_path(&path).expect("config");
        assert_eq!(config.server.listen, "0.0.0.0:9000");
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = MnemoConfig::load_from_str("{ memory: { relevance_threshold: 1.5 } }")
            .expect_err("invalid");
        match err {
            ConfigError::Invalid(message) => {
                assert!(message.contains("relevance_threshold"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_tail_longer_than_trigger() {
        let err = MnemoConfig::load_from_str("{ conversation: { keep_recent: 9 } }")
            .expect_err("invalid");
        match err {
            ConfigError::Invalid(message) => {
                assert!(message.contains("keep_recent"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
