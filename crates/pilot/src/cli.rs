//! Interactive prompt
//!
//! Reads user turns with reedline and hands them to the [`Runner`]. Ctrl-C
//! while a turn is running aborts that turn; at the prompt it only clears
//! the line.

use std::sync::Arc;

use nu_ansi_term::{Color, Style};
use pilot_browser::BrowserSession;
use pilot_core::{CancellationToken, Error, Runner, TurnOutcome, TurnReport};
use reedline::{
    ColumnarMenu, Completer, DefaultHinter, Emacs, KeyCode, KeyModifiers, Keybindings,
    MenuBuilder, Prompt, Reedline, ReedlineEvent, ReedlineMenu, Signal, Suggestion,
};
use tracing::{info, warn};

/// Available commands for autocomplete display
const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show this help"),
    ("/tools", "List the tools the agent can call"),
    ("/new", "Start a new conversation"),
    ("/exit", "Quit"),
    ("/quit", "Quit"),
];

/// Command completer for reedline
#[derive(Clone)]
pub struct CommandCompleter {
    commands: Vec<(&'static str, &'static str)>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        Self {
            commands: COMMANDS.to_vec(),
        }
    }
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self::new()
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        if !line.starts_with('/') {
            return Vec::new();
        }

        self.commands
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(line))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.to_string(),
                description: Some(desc.to_string()),
                extra: None,
                span: reedline::Span::new(0, pos),
                append_whitespace: true,
                style: None,
            })
            .collect()
    }
}

/// Custom prompt with colored styling
struct ColoredPrompt {
    style: Style,
}

impl ColoredPrompt {
    fn new() -> Self {
        Self {
            style: Color::Cyan.bold(),
        }
    }
}

impl Prompt for ColoredPrompt {
    fn render_prompt_left(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Owned(self.style.paint("🧑 > ").to_string())
    }

    fn render_prompt_right(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_indicator(
        &self,
        _prompt_mode: reedline::PromptEditMode,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: reedline::PromptHistorySearch,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }
}

/// One line of user input, classified
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Quit,
    Help,
    Tools,
    NewConversation,
    UnknownCommand(&'a str),
    Message(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let input = line.trim();
    let lower = input.to_lowercase();

    match lower.as_str() {
        "" => Input::Empty,
        "quit" | "exit" | "q" | "/exit" | "/quit" => Input::Quit,
        "/help" | "/?" => Input::Help,
        "/tools" => Input::Tools,
        "/new" => Input::NewConversation,
        _ if lower.starts_with('/') => Input::UnknownCommand(input),
        _ => Input::Message(input),
    }
}

/// What the prompt loop should do after a turn
#[derive(Debug, PartialEq, Eq)]
enum AfterTurn {
    Continue,
    Exit,
}

/// Run the interactive prompt until the user quits or the browser is gone
pub async fn run_cli(mut runner: Runner, session: Arc<BrowserSession>) -> anyhow::Result<()> {
    info!("Starting prompt with {} tools", runner.registry().len());

    print_welcome();

    // Setup keybindings
    let mut keybindings = default_keybindings();

    // Trigger completion on '/' key
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Char('/'),
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );

    let menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_menu")
            .with_columns(1)
            .with_column_width(Some(40))
            .with_only_buffer_difference(false),
    );

    let hinter = DefaultHinter::default().with_style(Style::new().dimmed());

    let mut line_editor = Reedline::create()
        .with_completer(Box::new(CommandCompleter::new()))
        .with_menu(ReedlineMenu::EngineCompleter(menu))
        .with_hinter(Box::new(hinter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let prompt = ColoredPrompt::new();

    loop {
        let signal = line_editor.read_line(&prompt);

        match signal {
            Ok(Signal::Success(line)) => match classify(&line) {
                Input::Empty => continue,
                Input::Quit => {
                    println!("\n👋 Bye!\n");
                    break;
                }
                Input::Help => print_help(),
                Input::Tools => print_tools(&runner),
                Input::NewConversation => {
                    runner.reset_conversation().await?;
                    println!("\n✅ Started a new conversation.\n");
                }
                Input::UnknownCommand(cmd) => {
                    eprintln!("\n❓ Unknown command: {}. Type /help for the list.\n", cmd);
                }
                Input::Message(text) => {
                    if handle_turn(&runner, &session, text).await? == AfterTurn::Exit {
                        break;
                    }
                }
            },
            Ok(Signal::CtrlC) => {
                println!("^C");
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("\n👋 Bye!\n");
                break;
            }
            Err(err) => {
                eprintln!("\n❌ Error: {}\n", err);
                break;
            }
        }
    }

    Ok(())
}

/// Run one turn, print what came of it and decide whether to keep going
///
/// Agent-service failures end the process; a poll timeout only ends the turn.
async fn handle_turn(
    runner: &Runner,
    session: &BrowserSession,
    text: &str,
) -> anyhow::Result<AfterTurn> {
    let report = match run_abortable(runner, text).await {
        Ok(report) => report,
        Err(e @ Error::PollTimeout { .. }) => {
            eprintln!("\n⏱️  {}\n", e);
            return Ok(AfterTurn::Continue);
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&report);

    if report.session_lost || !session.is_alive() {
        eprintln!("❌ The browser window was closed. Restart pilot to continue.\n");
        return Ok(AfterTurn::Exit);
    }

    Ok(AfterTurn::Continue)
}

/// Run a turn, cancelling it when the user presses Ctrl-C
async fn run_abortable(runner: &Runner, text: &str) -> pilot_core::Result<TurnReport> {
    let cancel = CancellationToken::new();
    let turn = runner.run_turn(text, &cancel);
    tokio::pin!(turn);

    let mut listening = true;
    loop {
        tokio::select! {
            report = &mut turn => return report,
            signal = tokio::signal::ctrl_c(), if listening => {
                listening = false;
                match signal {
                    Ok(()) => {
                        println!("\n⏹️  Aborting...");
                        cancel.cancel();
                    }
                    Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
                }
            }
        }
    }
}

fn describe_outcome(outcome: &TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Reply(text) => format!("🤖 {}", text),
        TurnOutcome::NoReply => "🤖 (no reply)".to_string(),
        TurnOutcome::Failed { status, reason } => format!(
            "⚠️  The run {}: {}",
            status,
            reason.as_deref().unwrap_or("no reason given")
        ),
        TurnOutcome::Cancelled => "⚠️  The run was cancelled.".to_string(),
        TurnOutcome::Aborted => "⏹️  Aborted.".to_string(),
    }
}

fn print_report(report: &TurnReport) {
    if report.tool_calls > 0 {
        let summary = format!(
            "⚙️ {} tool call(s) in {} round(s)",
            report.tool_calls, report.tool_rounds
        );
        println!("\n{}", Style::new().dimmed().paint(summary));
    }

    println!("\n{}\n", describe_outcome(&report.outcome));
}

/// Default keybindings for reedline
fn default_keybindings() -> Keybindings {
    let mut keybindings = Keybindings::new();
    // Tab key triggers completion
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Esc, ReedlineEvent::Esc);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('c'), ReedlineEvent::CtrlC);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::CtrlD);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings
}

/// Print welcome message
fn print_welcome() {
    println!();
    println!("🟢 Pipeline Pilot ready. Ask away.");
    println!("   Commands: /help, /tools, /new, /exit. Ctrl-C aborts a running turn.");
    println!();
}

/// Print help message
fn print_help() {
    println!();
    println!("📖 Commands:");
    for (cmd, desc) in COMMANDS {
        println!("  {} - {}", cmd, desc);
    }
    println!("  quit, exit, q - Quit");
    println!();
    println!("💡 Ctrl-C while the agent is working aborts the current run.");
    println!();
}

fn print_tools(runner: &Runner) {
    println!();
    println!("🧰 Tools:");
    for spec in runner.registry().describe_all() {
        println!("  {} - {}", spec.name, spec.description);
    }
    println!();
}
