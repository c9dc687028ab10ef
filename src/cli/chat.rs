use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::chat::Orchestrator;
use crate::core::AppConfig;
use crate::google::GoogleGateway;
use crate::llm::LlmClient;

pub async fn run() -> Result<()> {
    let mut rl = DefaultEditor::new().expect("Editor failed");

    let config = AppConfig::default();
    let llm = LlmClient::new(
        &config.llm_api_hostname,
        &config.llm_api_key,
        &config.llm_model,
    )
    .sampling(config.llm_temperature, config.llm_max_tokens);
    let gateway = GoogleGateway::new(&config);
    let mut orchestrator = Orchestrator::new(llm, gateway, &config.user_name);

    println!("How can I help with your calendar today? (Ctrl-D to quit, /clear to start over)");

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                if line.trim() == "/clear" {
                    orchestrator.clear();
                    println!("Conversation cleared.");
                    continue;
                }
                let reply = orchestrator.next_turn(line.as_str()).await?;
                println!("{}", reply.text);
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
