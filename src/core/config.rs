use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm_api_hostname: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_refresh_token: String,
    pub user_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let llm_api_hostname =
            env::var("OOO_LLM_HOST").unwrap_or_else(|_| "https://api.openai.com".to_string());
        let llm_api_key =
            env::var("OPENAI_API_KEY").unwrap_or_else(|_| "thiswontworkforopenai".to_string());
        let llm_model = env::var("OOO_LLM_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let llm_temperature = env::var("OOO_LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.7);
        let llm_max_tokens = env::var("OOO_LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        let google_client_id =
            env::var("OOO_GOOGLE_CLIENT_ID").unwrap_or_else(|_| String::new());
        let google_client_secret =
            env::var("OOO_GOOGLE_CLIENT_SECRET").unwrap_or_else(|_| String::new());
        let google_refresh_token =
            env::var("OOO_GOOGLE_REFRESH_TOKEN").unwrap_or_else(|_| String::new());
        let user_name = env::var("OOO_USER_NAME").unwrap_or_else(|_| "Me".to_string());

        Self {
            llm_api_hostname,
            llm_api_key,
            llm_model,
            llm_temperature,
            llm_max_tokens,
            google_client_id,
            google_client_secret,
            google_refresh_token,
            user_name,
        }
    }
}
