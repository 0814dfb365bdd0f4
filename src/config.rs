use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Language pair and prompt settings for a translation run.
#[derive(Debug, Clone, Serialize)]
pub struct TranslatorConfig {
    pub source_language: String,
    pub target_language: String,
    /// Language name to file extension, including the leading dot.
    pub file_extension_map: BTreeMap<String, String>,
    pub system_prompt: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        let file_extension_map = [
            ("Java", ".java"),
            ("JavaScript", ".js"),
            ("Python", ".py"),
            ("TypeScript", ".ts"),
            ("C", ".c"),
            ("C++", ".cpp"),
            ("C#", ".cs"),
            ("Rust", ".rs"),
        ]
        .into_iter()
        .map(|(lang, ext)| (lang.to_string(), ext.to_string()))
        .collect();

        TranslatorConfig {
            source_language: "Java".to_string(),
            target_language: "JavaScript".to_string(),
            file_extension_map,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl TranslatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = TranslatorConfig::default();

        if let Some(source) = lookup("COACH_SOURCE_LANGUAGE") {
            config.source_language = source;
        }
        if let Some(target) = lookup("COACH_TARGET_LANGUAGE") {
            config.target_language = target;
        }
        if let Some(map) = lookup("COACH_EXTENSION_MAP") {
            config.file_extension_map.extend(parse_extension_map(&map)?);
        }
        if let Some(prompt) = lookup("COACH_SYSTEM_PROMPT") {
            config.system_prompt = prompt;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_language.eq_ignore_ascii_case(&self.target_language) {
            bail!(
                "source and target language are both {}",
                self.source_language
            );
        }
        self.extension_for(&self.source_language)?;
        self.extension_for(&self.target_language)?;
        Ok(())
    }

    /// Looks up an extension, matching the language name case-insensitively.
    pub fn extension_for(&self, language: &str) -> Result<&str> {
        self.file_extension_map
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(language))
            .map(|(_, ext)| ext.as_str())
            .with_context(|| format!("no file extension configured for {language}"))
    }

    pub fn source_extension(&self) -> &str {
        self.extension_for(&self.source_language).unwrap_or_default()
    }

    pub fn target_extension(&self) -> &str {
        self.extension_for(&self.target_language).unwrap_or_default()
    }
}

/// Parses `Language=.ext,Other=.ext2`. A missing leading dot is added.
fn parse_extension_map(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (lang, ext) = entry
            .split_once('=')
            .with_context(|| format!("invalid extension map entry `{entry}`"))?;
        let (lang, ext) = (lang.trim(), ext.trim().trim_start_matches('.'));
        if lang.is_empty() || ext.is_empty() {
            bail!("invalid extension map entry `{entry}`");
        }
        map.insert(lang.to_string(), format!(".{ext}"));
    }
    Ok(map)
}

/// Process-level settings for the HTTP service and its backends.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub host_api_url: String,
    #[serde(skip_serializing)]
    pub host_api_token: Option<String>,
    /// When set, prompts go straight to this model endpoint instead of the host.
    pub llm_api_url: Option<String>,
    #[serde(skip_serializing)]
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout_secs: Option<u64>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let llm_temperature = match lookup("LLM_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .with_context(|| format!("LLM_TEMPERATURE is not a number: {raw}"))?,
            None => 0.1,
        };
        let llm_timeout_secs = lookup("LLM_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("LLM_TIMEOUT_SECS is not a whole number: {raw}"))
            })
            .transpose()?;

        Ok(ServiceConfig {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            host_api_url: lookup("HOST_API_URL")
                .unwrap_or_else(|| "http://localhost:8080/api".to_string()),
            host_api_token: lookup("HOST_API_TOKEN"),
            llm_api_url: lookup("LLM_API_URL"),
            llm_api_key: lookup("LLM_API_KEY"),
            llm_model: lookup("LLM_MODEL").unwrap_or_else(|| "llama2".to_string()),
            llm_temperature,
            llm_timeout_secs,
        })
    }
}
