//! Gateway + artifact configuration.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | host | 127.0.0.1 | Bind address |
//! | port | 5000 | HTTP port |
//! | knowledge_path | data/content.json | Concept name → entry document |
//! | intents_path | data/intents.json | Intent label → canned responses |
//! | vectorizer_path | model/vectorizer.json | TF-IDF export |
//! | classifier_path | model/chatbot_model.json | Linear intent model export |
//! | label_encoder_path | model/label_encoder.json | Class index → label |
//! | similarity_threshold | 0.20 | Best concept scores below this are a miss |
//! | miss_message | "Sorry, I'm still learning..." | Answer when nothing matches |
//!
//! Precedence: env `CONCEPTBOT__<KEY>` > TOML at `$CONCEPTBOT_CONFIG`
//! (default `config/conceptbot.toml`, optional) > defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LoadError, LoadResult};

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.20;
pub const DEFAULT_MISS_MESSAGE: &str =
    "Sorry, I'm still learning that concept. Try asking about another topic.";
const DEFAULT_CONFIG_PATH: &str = "config/conceptbot.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatbotConfig {
    pub host: String,
    pub port: u16,
    pub knowledge_path: PathBuf,
    pub intents_path: PathBuf,
    pub vectorizer_path: PathBuf,
    pub classifier_path: PathBuf,
    pub label_encoder_path: PathBuf,
    pub similarity_threshold: f32,
    pub miss_message: String,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            knowledge_path: PathBuf::from("data/content.json"),
            intents_path: PathBuf::from("data/intents.json"),
            vectorizer_path: PathBuf::from("model/vectorizer.json"),
            classifier_path: PathBuf::from("model/chatbot_model.json"),
            label_encoder_path: PathBuf::from("model/label_encoder.json"),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            miss_message: DEFAULT_MISS_MESSAGE.to_string(),
        }
    }
}

impl ChatbotConfig {
    /// Load from `$CONCEPTBOT_CONFIG` (or the default path) and the environment.
    pub fn load() -> LoadResult<Self> {
        let path = std::env::var("CONCEPTBOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load with an explicit TOML path; a missing file just means defaults + env.
    pub fn load_from(path: &Path) -> LoadResult<Self> {
        Self::load_layered(path, None)
    }

    /// `env` replaces the process environment when given (keys are full variable
    /// names, e.g. `CONCEPTBOT__PORT`).
    fn load_layered(path: &Path, env: Option<config::Map<String, String>>) -> LoadResult<Self> {
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("host", d.host)?
            .set_default("port", i64::from(d.port))?
            .set_default("knowledge_path", path_default(&d.knowledge_path))?
            .set_default("intents_path", path_default(&d.intents_path))?
            .set_default("vectorizer_path", path_default(&d.vectorizer_path))?
            .set_default("classifier_path", path_default(&d.classifier_path))?
            .set_default("label_encoder_path", path_default(&d.label_encoder_path))?
            .set_default("similarity_threshold", f64::from(d.similarity_threshold))?
            .set_default("miss_message", d.miss_message)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let cfg: Self = builder
            .add_source(
                config::Environment::with_prefix("CONCEPTBOT")
                    .separator("__")
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> LoadResult<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(LoadError::InvalidThreshold(self.similarity_threshold));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn path_default(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conceptbot.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "port = 8080\nsimilarity_threshold = 0.15\nknowledge_path = \"kb/concepts.json\"").unwrap();

        let cfg = ChatbotConfig::load_layered(&path, env(&[])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert!((cfg.similarity_threshold - 0.15).abs() < 1e-6);
        assert_eq!(cfg.knowledge_path, PathBuf::from("kb/concepts.json"));
        assert_eq!(cfg.intents_path, PathBuf::from("data/intents.json"));
        assert_eq!(cfg.miss_message, DEFAULT_MISS_MESSAGE);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ChatbotConfig::load_layered(&dir.path().join("absent.toml"), env(&[])).unwrap();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:5000");
        assert!((cfg.similarity_threshold - DEFAULT_SIMILARITY_THRESHOLD).abs() < 1e-6);
    }

    #[test]
    fn threshold_outside_unit_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conceptbot.toml");
        std::fs::write(&path, "similarity_threshold = 1.5\n").unwrap();
        assert!(matches!(
            ChatbotConfig::load_layered(&path, env(&[])),
            Err(LoadError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn environment_overrides_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conceptbot.toml");
        std::fs::write(&path, "port = 8080\nsimilarity_threshold = 0.15\nhost = \"0.0.0.0\"\n").unwrap();

        let cfg = ChatbotConfig::load_layered(
            &path,
            env(&[
                ("CONCEPTBOT__PORT", "9090"),
                ("CONCEPTBOT__SIMILARITY_THRESHOLD", "0.30"),
                ("CONCEPTBOT__MISS_MESSAGE", "nope"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 9090);
        assert!((cfg.similarity_threshold - 0.30).abs() < 1e-6);
        assert_eq!(cfg.miss_message, "nope");
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.knowledge_path, PathBuf::from("data/content.json"));
    }

    #[test]
    fn environment_threshold_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let result = ChatbotConfig::load_layered(
            &dir.path().join("absent.toml"),
            env(&[("CONCEPTBOT__SIMILARITY_THRESHOLD", "-0.1")]),
        );
        assert!(matches!(result, Err(LoadError::InvalidThreshold(_))));
    }
}
