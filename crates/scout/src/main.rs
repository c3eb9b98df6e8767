//! A terminal chat with an agent that can search the web, arXiv and
//! Wikipedia.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::pin::pin;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use scout::core::AgentEvent;
use scout::{
    ChatMessage, Config, ERROR_PREFIX, Role, Session, SessionBuilder,
    TurnEvent, TurnOutcome,
};
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";
const TITLE: &str = "🔎 scout - Chat with Search";
const INTRO: &str = "\
Chat with knowledge tools from your terminal!

This app integrates arXiv, Wikipedia, and DuckDuckGo tools to search for
real-world answers. Try asking a factual or research-based question!

Commands: /key <KEY> sets the Groq API key, /key clears it,
/history shows the conversation, /quit exits.";
const MAX_PREVIEW_CHARS: usize = 160;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    SetKey(&'a str),
    ClearKey,
    History,
    Quit,
    Message(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line.split_once(char::is_whitespace) {
            Some(("/key", key)) => Command::SetKey(key.trim()),
            _ => match line {
                "/key" => Command::ClearKey,
                "/history" => Command::History,
                "/quit" | "/exit" => Command::Quit,
                _ => Command::Message(line),
            },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    match dotenv {
        Ok(path) => debug!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("failed to load .env: {err}"),
    }

    let mut session = SessionBuilder::with_config(Config::from_env()).build();

    println!("{}\n", TITLE.bold());
    println!("{}\n", INTRO.dimmed());
    render_history(&session);
    if !session.credential().is_present() {
        print_warning("No API key yet. Enter it with /key <KEY>.");
    }

    let progress_style = match ProgressStyle::with_template("{spinner} {wide_msg}")
    {
        Ok(style) => style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        Err(err) => {
            error!("invalid progress template: {err}");
            ProgressStyle::default_spinner()
        }
    };

    let mut stdin = BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        match Command::parse(&line) {
            Command::Quit => break,
            Command::SetKey(key) => {
                session.set_api_key(key);
                println!("API key set: {}\n", session.credential().dimmed());
            }
            Command::ClearKey => {
                session.clear_api_key();
                println!("API key cleared.\n");
            }
            Command::History => render_history(&session),
            Command::Message(text) => {
                run_turn(&mut session, text, &progress_style).await;
            }
        }
    }
}

async fn run_turn(session: &mut Session, text: &str, progress_style: &ProgressStyle) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut turn = pin!(session.send_message(text, move |event| {
        event_tx.send(event).ok();
    }));

    let mut view = TurnView::new(progress_style);
    let outcome = loop {
        view.tick();
        select! {
            biased;
            Some(event) = event_rx.recv() => view.show(event),
            outcome = &mut turn => break outcome,
            _ = sleep(Duration::from_millis(100)) => {}
        }
    };
    // Events sent in the last poll of the turn.
    while let Ok(event) = event_rx.try_recv() {
        view.show(event);
    }
    view.finish_progress();

    match outcome {
        TurnOutcome::Ignored => {}
        TurnOutcome::AwaitingCredential => {
            print_warning("Please enter your Groq API Key with /key <KEY>.");
        }
        TurnOutcome::Completed(reply) => {
            render_message(&reply);
            println!();
        }
    }
}

/// Renders the intermediate steps of one turn.
struct TurnView<'a> {
    progress_style: &'a ProgressStyle,
    progress_bar: Option<ProgressBar>,
    thought: String,
    iteration: usize,
}

impl<'a> TurnView<'a> {
    fn new(progress_style: &'a ProgressStyle) -> Self {
        Self {
            progress_style,
            progress_bar: None,
            thought: String::new(),
            iteration: 1,
        }
    }

    fn tick(&mut self) {
        // Create a new progress bar if it has been finished.
        let iteration = self.iteration;
        self.progress_bar
            .get_or_insert_with(|| {
                let progress_bar = ProgressBar::new_spinner();
                progress_bar.set_style(self.progress_style.clone());
                progress_bar.set_message(if iteration > 1 {
                    format!("🤔 Thinking... (step {iteration})")
                } else {
                    "🤔 Thinking...".to_owned()
                });
                progress_bar
            })
            .inc(1);
    }

    // Finish the progress bar before printing anything else.
    fn finish_progress(&mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }

    fn show(&mut self, event: TurnEvent) {
        let TurnEvent::Agent(event) = event else {
            return;
        };
        let bar = BAR_CHAR.bright_black();
        match event {
            AgentEvent::Thinking { iteration } => {
                self.thought.clear();
                self.iteration = iteration;
                self.finish_progress();
            }
            AgentEvent::Thought(delta) => self.thought.push_str(&delta),
            AgentEvent::ToolStarted { name, input } => {
                self.finish_progress();
                if !self.thought.trim().is_empty() {
                    println!("{bar}💭 {}", preview(&self.thought).dimmed());
                }
                println!("{bar}🔧 {name} {}", input.to_string().dimmed());
            }
            AgentEvent::ToolFinished {
                output, is_error, ..
            } => {
                self.finish_progress();
                let icon = if is_error { "⚠️ " } else { "📄" };
                println!("{bar}{icon} {}", preview(&output).dimmed());
            }
        }
    }
}

fn render_history(session: &Session) {
    for message in session.history().all() {
        render_message(message);
    }
    println!();
}

fn render_message(message: &ChatMessage) {
    match message.role() {
        Role::User => {
            println!("{}🧑 {}", BAR_CHAR.bright_green(), message.content());
        }
        Role::Assistant if message.content().starts_with(ERROR_PREFIX) => {
            println!("{}{}", BAR_CHAR.bright_red(), message.content().red());
        }
        Role::Assistant => {
            println!(
                "{}🤖 {}",
                BAR_CHAR.bright_cyan(),
                message.content().bright_white()
            );
        }
    }
}

fn print_warning(text: &str) {
    println!("{}⚠️  {}\n", BAR_CHAR.bright_yellow(), text.yellow());
}

fn preview(text: &str) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match text.char_indices().nth(MAX_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text,
    }
}

async fn read_line(stdin: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    match stdin.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
