use std::io::Read;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use agent_chat_lib::agents::{category_or_default, AgentCatalog};
use agent_chat_lib::chat::{ChatController, TurnOutcome};
use agent_chat_lib::config::{self, Config};
use agent_chat_lib::gateway::wire::{handle_completion, CompletionRequest};
use agent_chat_lib::{init_tracing, render, App};

const DEFAULT_USER: &str = "local";

#[derive(Parser)]
#[command(name = "agent-chat", version, about = "Chat with a catalog of expert agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List active agents
    Agents {
        #[arg(long)]
        category: Option<String>,
    },
    /// Open an interactive chat with an agent
    Chat {
        agent: String,
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
        /// Print replies as rendered HTML
        #[arg(long)]
        html: bool,
    },
    /// List stored conversations
    Conversations {
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
    },
    /// Render stdin to an HTML fragment
    Render {
        /// Treat the input as user-authored text
        #[arg(long)]
        user: bool,
    },
    /// Answer one completion request read from stdin as JSON
    Complete,
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum SettingsCommand {
    List,
    Set { key: String, value: String },
    Delete { key: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    if let Command::Render { user } = cli.command {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        let html = if user {
            render::render_user_text(&input)
        } else {
            render::render_agent_text(&input)
        };
        println!("{}", html);
        return Ok(());
    }

    let app = App::bootstrap(Config::from_env()?)?;

    match cli.command {
        Command::Agents { category } => {
            let agents = match &category {
                Some(category) => app.database.list_by_category(category)?,
                None => app.agents()?,
            };
            for agent in agents {
                println!(
                    "{} {:<24} [{}] {}",
                    agent.emoji.as_deref().unwrap_or("•"),
                    agent.id,
                    category_or_default(&agent.category),
                    agent.name
                );
            }
        }
        Command::Chat { agent, user, html } => {
            let chat = app.open_session(&user, &agent)?;
            run_repl(chat, html).await?;
        }
        Command::Conversations { user } => {
            for conversation in app.database.list_conversations(&user)? {
                println!(
                    "{}  {:<22} {}  {}",
                    conversation.id,
                    conversation.agent_id,
                    conversation.updated_at,
                    conversation.title.unwrap_or_default()
                );
            }
        }
        Command::Complete => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            let request: CompletionRequest = serde_json::from_str(&input)?;
            let (status, body) = handle_completion(app.gateway.as_ref(), request).await;
            println!("{}", status);
            println!("{}", serde_json::to_string(&body)?);
        }
        Command::Settings(SettingsCommand::List) => {
            for (key, value) in config::masked_settings(&app.database)? {
                println!("{} = {}", key, value);
            }
        }
        Command::Settings(SettingsCommand::Set { key, value }) => {
            config::set_setting(&app.database, &key, &value)?;
        }
        Command::Settings(SettingsCommand::Delete { key }) => {
            config::delete_setting(&app.database, &key)?;
        }
        Command::Render { .. } => {}
    }

    Ok(())
}

async fn run_repl(mut chat: ChatController, html: bool) -> std::io::Result<()> {
    let show = |chat: &ChatController, from: usize| {
        for message in &chat.messages()[from..] {
            if html {
                println!("{}\n", render::render_message(message));
            } else {
                println!("[{}] {}\n", message.role, message.content);
            }
        }
    };

    println!("{} {}", chat.agent().emoji.as_deref().unwrap_or(""), chat.agent().name);
    println!("/clear, /retry, /quit\n");
    show(&chat, 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let before = chat.messages().len();
        let outcome = match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                chat.clear_chat();
                show(&chat, 0);
                continue;
            }
            "/retry" => chat.retry_last_message().await,
            text => chat.send_message(text).await,
        };
        match outcome {
            TurnOutcome::Rejected => continue,
            TurnOutcome::Replied { .. } | TurnOutcome::Failed { .. } | TurnOutcome::Discarded => {
                // Retry can shrink the list before appending.
                show(&chat, before.min(chat.messages().len().saturating_sub(2)));
            }
        }
    }
    Ok(())
}
