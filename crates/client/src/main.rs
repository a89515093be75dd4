//! A terminal chat front end for the relay.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::Duration;

use chat_relay_client::{
    ChatSession, DEFAULT_RELAY_URL, MessageId, Phase, RelayClient,
};
use chat_relay_protocol::ChatMessage;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

const BAR_CHAR: &str = "▎";
const ONCE_COMMAND: &str = "/once ";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let relay_url =
        env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_owned());
    let client = RelayClient::new(&relay_url);

    match client.health().await {
        Ok(health) => {
            println!("{} {}", "Connected to".dimmed(), health.model.bold());
            if !health.token_configured {
                println!(
                    "{}",
                    "⚠️  The relay has no Hugging Face token configured."
                        .bright_yellow()
                );
            }
        }
        Err(err) => {
            warn!("health check against {relay_url} failed: {err}");
            println!(
                "{}",
                format!("⚠️  Relay at {relay_url} is not reachable: {err}")
                    .bright_yellow()
            );
        }
    }

    let mut session = ChatSession::new();
    if let Some(greeting) = session.transcript().last() {
        println!(
            "{}🤖 {}",
            BAR_CHAR.bright_cyan(),
            greeting.text.bright_white()
        );
    }

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            continue;
        }

        if let Some(text) = line.strip_prefix(ONCE_COMMAND) {
            complete_once(&client, text).await;
            continue;
        }

        let mut printer = ReplyPrinter::new();
        session
            .send(&client, line, |session| printer.update(session))
            .await;
        printer.finish();
    }
}

async fn complete_once(client: &RelayClient, text: &str) {
    let spinner = new_spinner();
    let result = client.complete(vec![ChatMessage::user(text)]).await;
    spinner.finish_and_clear();

    match result {
        Ok(reply) => {
            println!("{}🤖 {}", BAR_CHAR.bright_cyan(), reply.bright_white());
        }
        Err(err) => {
            println!("{}{}", BAR_CHAR.bright_red(), err.red());
        }
    }
}

/// Prints the pending reply of a session as it grows.
struct ReplyPrinter {
    reply: Option<MessageId>,
    printed: String,
    spinner: Option<ProgressBar>,
}

impl ReplyPrinter {
    fn new() -> Self {
        Self {
            reply: None,
            printed: String::new(),
            spinner: None,
        }
    }

    fn update(&mut self, session: &ChatSession) {
        if self.reply.is_none() {
            self.reply = session.pending();
        }

        if session.phase() == Phase::Sending {
            self.spinner.get_or_insert_with(new_spinner);
            return;
        }
        // Finish the spinner before printing anything else.
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }

        let Some(message) =
            self.reply.and_then(|id| session.transcript().get(id))
        else {
            return;
        };
        let text = message.text.as_str();
        if text == self.printed {
            return;
        }

        if self.printed.is_empty() {
            print!("{}🤖 ", BAR_CHAR.bright_cyan());
        }
        match text.strip_prefix(self.printed.as_str()) {
            Some(delta) => print!("{}", delta.bright_white()),
            None => {
                // The reply was replaced by an apology.
                if !self.printed.is_empty() {
                    print!("\n{}", BAR_CHAR.bright_red());
                }
                print!("{}", text.red());
            }
        }
        std::io::stdout().flush().ok();
        self.printed = text.to_owned();
    }

    fn finish(self) {
        if let Some(spinner) = self.spinner {
            spinner.finish_and_clear();
        }
        if !self.printed.is_empty() {
            println!();
        }
    }
}

fn new_spinner() -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(style);
    spinner.set_message("🤔 Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
