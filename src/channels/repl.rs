//! Interactive REPL with line editing and markdown rendering.
//!
//! Each non-command line runs the full pipeline (parse, gate, execute, reply).
//! rustyline owns the terminal on a dedicated thread; lines are handed to the
//! async side one at a time so output never interleaves with the prompt.
//!
//! ## Commands
//!
//! - `/help` - Show available commands
//! - `/balance` - List smart wallet balances
//! - `/guardians` - List recovery guardians
//! - `/debug` - Toggle intent details under each reply
//! - `/quit` or `/exit` - Exit the REPL

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;

use rustyline::completion::Completer;
use rustyline::config::Config;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Editor, Helper};
use termimad::MadSkin;
use tokio::sync::mpsc;

use crate::agent::{Agent, AgentReply};
use crate::error::ChannelError;
use crate::wallet::WalletService;

const SLASH_COMMANDS: &[&str] = &["/help", "/balance", "/guardians", "/debug", "/quit", "/exit"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Help,
    Balance,
    Guardians,
    Debug,
    Quit,
    UnknownCommand(String),
    Message(String),
}

fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if !line.starts_with('/') {
        return ReplCommand::Message(line.to_string());
    }
    match line.to_lowercase().as_str() {
        "/help" => ReplCommand::Help,
        "/balance" | "/balances" => ReplCommand::Balance,
        "/guardians" => ReplCommand::Guardians,
        "/debug" => ReplCommand::Debug,
        "/quit" | "/exit" => ReplCommand::Quit,
        other => ReplCommand::UnknownCommand(other.to_string()),
    }
}

/// Rustyline helper for slash-command tab completion.
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let prefix = &line[..pos];
        let matches = SLASH_COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| cmd.to_string())
            .collect();
        Ok((0, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if !line.starts_with('/') || pos < line.len() {
            return None;
        }
        SLASH_COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && **cmd != line)
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Highlighter for ReplHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[90m{hint}\x1b[0m"))
    }
}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

fn make_skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.set_headers_fg(termimad::crossterm::style::Color::Yellow);
    skin.bold.set_fg(termimad::crossterm::style::Color::White);
    skin.inline_code
        .set_fg(termimad::crossterm::style::Color::Green);
    skin
}

fn print_help() {
    let h = "\x1b[1m";
    let c = "\x1b[1;36m";
    let d = "\x1b[90m";
    let r = "\x1b[0m";

    println!();
    println!("  {h}SmartWallet REPL{r}");
    println!();
    println!("  {h}Commands{r}");
    println!("  {c}/help{r}              {d}show this help{r}");
    println!("  {c}/balance{r}           {d}list wallet balances{r}");
    println!("  {c}/guardians{r}         {d}list recovery guardians{r}");
    println!("  {c}/debug{r}             {d}toggle intent details{r}");
    println!("  {c}/quit{r} {c}/exit{r}        {d}exit the repl{r}");
    println!();
    println!("  {h}Try{r}");
    println!("  {d}What's my balance?{r}");
    println!("  {d}Send 0.1 BDAG to 0x...{r}");
    println!("  {d}What's the price of bitcoin?{r}");
    println!();
}

/// `Action: send | Confidence: 95%`, as shown under chat replies.
fn intent_footer(reply: &AgentReply) -> String {
    format!(
        "Action: {} | Confidence: {:.0}%",
        reply.intent.action,
        reply.intent.confidence * 100.0
    )
}

fn history_path() -> std::path::PathBuf {
    crate::bootstrap::smartwallet_home().join("history")
}

/// Line handed from the editor thread, with a channel to resume prompting.
struct PendingLine {
    line: String,
    done: std_mpsc::Sender<()>,
}

pub struct ReplChannel {
    agent: Arc<Agent>,
    wallet: Arc<WalletService>,
    /// Run this one message and exit (for `-m`).
    single_message: Option<String>,
}

impl ReplChannel {
    pub fn new(agent: Arc<Agent>, wallet: Arc<WalletService>) -> Self {
        Self {
            agent,
            wallet,
            single_message: None,
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.single_message = Some(message);
        self
    }

    pub async fn run(&self) -> Result<(), ChannelError> {
        let skin = make_skin();

        if let Some(message) = &self.single_message {
            let reply = self.agent.handle_message(message).await;
            render(&skin, &reply.reply);
            return Ok(());
        }

        let mut lines = spawn_editor();
        let mut debug = false;

        while let Some(PendingLine { line, done }) = lines.recv().await {
            match parse_command(&line) {
                ReplCommand::Quit => break,
                ReplCommand::Help => print_help(),
                ReplCommand::Debug => {
                    debug = !debug;
                    println!(
                        "\x1b[90mdebug mode {}\x1b[0m",
                        if debug { "on" } else { "off" }
                    );
                }
                ReplCommand::Balance => self.print_balances(&skin).await,
                ReplCommand::Guardians => self.print_guardians(&skin).await,
                ReplCommand::UnknownCommand(cmd) => {
                    eprintln!("\x1b[31mUnknown command {cmd}\x1b[0m, /help for commands");
                }
                ReplCommand::Message(text) => {
                    let reply = self.agent.handle_message(&text).await;
                    render(&skin, &reply.reply);
                    if debug {
                        eprintln!("\x1b[90m{}\x1b[0m", intent_footer(&reply));
                        if let Some(error) = &reply.error {
                            eprintln!("\x1b[90merror: {error}\x1b[0m");
                        }
                    }
                }
            }
            let _ = done.send(());
        }
        Ok(())
    }

    async fn print_balances(&self, skin: &MadSkin) {
        match self.wallet.get_all_balances().await {
            Ok(balances) if balances.is_empty() => render(skin, "💰 No balances found."),
            Ok(balances) => {
                let lines: Vec<String> = balances
                    .iter()
                    .map(|b| format!("- **{}**: {}", b.token, b.balance))
                    .collect();
                render(skin, &format!("💰 Your balances:\n{}", lines.join("\n")));
            }
            Err(e) => eprintln!("\x1b[31m{e}\x1b[0m"),
        }
    }

    async fn print_guardians(&self, skin: &MadSkin) {
        match self.wallet.guardians().await {
            Ok(guardians) if guardians.is_empty() => render(skin, "🔐 No guardians configured."),
            Ok(guardians) => {
                let lines: Vec<String> = guardians.iter().map(|g| format!("- `{g}`")).collect();
                render(skin, &format!("🔐 Guardians:\n{}", lines.join("\n")));
            }
            Err(e) => eprintln!("\x1b[31m{e}\x1b[0m"),
        }
    }
}

fn render(skin: &MadSkin, text: &str) {
    let width = termimad::crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80);
    eprintln!("\x1b[90m{}\x1b[0m", "\u{2500}".repeat(width.min(80)));
    print!("{}", termimad::FmtText::from(skin, text, Some(width)));
    println!();
}

/// Run rustyline on its own thread; each line waits for the async side to
/// finish before the next prompt.
fn spawn_editor() -> mpsc::Receiver<PendingLine> {
    let (tx, rx) = mpsc::channel(1);

    std::thread::spawn(move || {
        let config = match Config::builder().history_ignore_dups(true) {
            Ok(builder) => builder
                .auto_add_history(true)
                .completion_type(CompletionType::List)
                .build(),
            Err(e) => {
                eprintln!("Invalid line editor config: {e}");
                return;
            }
        };

        let mut rl = match Editor::with_config(config) {
            Ok(editor) => editor,
            Err(e) => {
                eprintln!("Failed to initialize line editor: {e}");
                return;
            }
        };
        rl.set_helper(Some(ReplHelper));

        let hist_path = history_path();
        if let Some(parent) = hist_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.load_history(&hist_path);

        println!("\x1b[1mSmartWallet\x1b[0m  /help for commands, /quit to exit");
        println!();

        loop {
            let line = match rl.readline("\x1b[1;36m\u{203A}\x1b[0m ") {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => "/quit".to_string(),
                Err(e) => {
                    eprintln!("Input error: {e}");
                    "/quit".to_string()
                }
            };
            let quitting = parse_command(&line) == ReplCommand::Quit;

            let (done, wait) = std_mpsc::channel();
            if tx.blocking_send(PendingLine { line, done }).is_err() || quitting {
                break;
            }
            if wait.recv().is_err() {
                break;
            }
        }

        let _ = rl.save_history(&hist_path);
    });

    rx
}
