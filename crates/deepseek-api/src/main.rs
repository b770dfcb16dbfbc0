//! A simple program demonstrates how to use `deepseek-api` as a library.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::{self as std_io, Write as _};

use deepseek_api::proto::MODEL_DEEPSEEK_CHAT;
use deepseek_api::{ChatRequest, ClientBuilder, DeepSeekClient, Message};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = match ClientBuilder::from_env().and_then(|b| b.build()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    let model = env::var("DEEPSEEK_MODEL")
        .unwrap_or_else(|_| MODEL_DEEPSEEK_CHAT.to_owned());

    let mut history = Vec::new();
    loop {
        print!("> ");
        std_io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/models" => list_models(&client).await,
            "/balance" => show_balance(&client).await,
            "/clear" => history.clear(),
            _ => {
                history.push(Message::user(line));
                match chat(&client, &model, &history).await {
                    Some(reply) if !reply.is_empty() => {
                        history.push(Message::assistant(reply));
                    }
                    _ => {
                        history.pop();
                    }
                }
            }
        }
    }
}

/// Streams one reply and returns its content, or `None` if the call failed.
async fn chat(
    client: &DeepSeekClient,
    model: &str,
    history: &[Message],
) -> Option<String> {
    let req = ChatRequest::new(history.to_vec(), model).with_stream(true);

    let mut reply = String::new();
    let mut thinking = false;
    print!("{}🤖 ", BAR_CHAR.bright_cyan());
    let result = client
        .chat_stream(&req, |chunk| {
            let Some(delta) =
                chunk.choices.first().and_then(|c| c.delta.as_ref())
            else {
                return Ok(());
            };
            if let Some(reasoning) = &delta.reasoning_content {
                thinking = true;
                print!("{}", reasoning.dimmed());
            }
            if let Some(content) = &delta.content {
                if thinking && !content.is_empty() {
                    thinking = false;
                    print!("\n{}🤖 ", BAR_CHAR.bright_cyan());
                }
                reply.push_str(content);
                print!("{}", content.bright_white());
            }
            std_io::stdout().flush()
        })
        .await;
    println!();

    match result {
        Ok(()) => Some(reply),
        Err(err) => {
            error!("chat failed: {err:?}");
            eprintln!("{}⚠️  {err}", BAR_CHAR.bright_red());
            None
        }
    }
}

async fn list_models(client: &DeepSeekClient) {
    match client.models().await {
        Ok(models) => {
            for model in models.data {
                let bar = BAR_CHAR.bright_cyan();
                println!("{bar}{} ({})", model.id, model.owned_by);
            }
        }
        Err(err) => eprintln!("{}⚠️  {err}", BAR_CHAR.bright_red()),
    }
}

async fn show_balance(client: &DeepSeekClient) {
    match client.balance().await {
        Ok(balance) => {
            if !balance.is_available {
                println!("{}balance is insufficient", BAR_CHAR.bright_yellow());
            }
            for info in balance.balance_infos {
                println!(
                    "{}{} {} (granted {}, topped up {})",
                    BAR_CHAR.bright_cyan(),
                    info.total_balance,
                    info.currency,
                    info.granted_balance,
                    info.topped_up_balance
                );
            }
        }
        Err(err) => eprintln!("{}⚠️  {err}", BAR_CHAR.bright_red()),
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
