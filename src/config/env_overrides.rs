use super::Config;
use std::path::PathBuf;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) =
            std::env::var("OPSBRIDGE_POLICY_PATH").or_else(|_| std::env::var("POLICY_PATH"))
            && !path.is_empty()
        {
            self.policy_path = PathBuf::from(path);
        }

        if let Ok(dir) = std::env::var("OPSBRIDGE_INCIDENT_DIR")
            && !dir.is_empty()
        {
            self.incident_dir = PathBuf::from(dir);
        }

        if let Ok(model) = std::env::var("OPSBRIDGE_MODEL").or_else(|_| std::env::var("LLM_MODEL"))
            && !model.is_empty()
        {
            self.llm.model = model;
        }

        if let Ok(provider) = std::env::var("OPSBRIDGE_PROVIDER")
            && !provider.is_empty()
        {
            self.llm.provider = provider;
        }

        if let Ok(key) = std::env::var("OPSBRIDGE_API_KEY").or_else(|_| std::env::var("API_KEY"))
            && !key.is_empty()
        {
            self.llm.api_key = Some(key);
        }

        if let Ok(base_url) = std::env::var("OPSBRIDGE_BASE_URL")
            && !base_url.is_empty()
        {
            self.llm.base_url = base_url;
        }

        if let Ok(rounds) = std::env::var("OPSBRIDGE_MAX_ROUNDS")
            && let Ok(rounds) = rounds.parse::<u32>()
        {
            self.workflow.max_rounds = rounds;
        }
    }
}
