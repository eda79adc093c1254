//! Headless front-end.
//!
//! Reads commands from stdin in place of global hotkeys and the tray menu.
//! State changes are printed as they are published.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use textlift_lib::capture::CaptureState;
use textlift_lib::credentials::store_in_keychain;
use textlift_lib::engine::{TriggerReply, TriggerSource};
use textlift_lib::llm::Provider;
use textlift_lib::{App, AppParts};

const HELP: &str = "\
Commands:
  process              enhance the captured text (or the clipboard)
  auto [on|off]        toggle or set auto-mode
  status               show state and settings
  prompts              list prompts
  use <n>              select prompt n
  add <name> | <text>  create a prompt and select it
  delete <n>           delete prompt n
  provider <name>      openai | anthropic
  model <name|default> set or clear the model override
  key <api-key>        save the API key in settings
  keychain <api-key>   save the API key in the OS keychain
  test                 send a test request
  quit";

#[tokio::main]
async fn main() {
    textlift_lib::load_env_files();
    textlift_lib::init_logging();

    let app = App::start(AppParts::system());

    let mut transitions = app.engine.transitions();
    tokio::spawn(async move {
        loop {
            match transitions.recv().await {
                Ok(CaptureState::Failed(reason)) => println!("[failed] {}", reason),
                Ok(state) => println!("[{}]", state.label()),
                Err(RecvError::Lagged(missed)) => log::debug!("[CLI] Missed {} state updates", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("textlift ready. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("[CLI] Failed to read stdin: {}", e);
                break;
            }
        };
        let line = line.trim();
        let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
        let arg = arg.trim();

        match cmd {
            "" => {}
            "help" | "?" => println!("{}", HELP),
            "quit" | "exit" => break,
            "process" | "p" => match app.engine.trigger(TriggerSource::Hotkey).await {
                Ok(TriggerReply::Started) => {}
                Ok(TriggerReply::Busy) => println!("Already processing."),
                Ok(TriggerReply::NoText) => println!("No text available."),
                Err(e) => println!("{}", e),
            },
            "auto" => {
                let sent = match arg {
                    "on" => app.engine.set_auto_mode(true).await,
                    "off" => app.engine.set_auto_mode(false).await,
                    _ => app.engine.toggle_auto_mode().await,
                };
                if let Err(e) = sent {
                    println!("{}", e);
                }
            }
            "status" => print_status(&app),
            "prompts" => print_prompts(&app),
            "use" => match prompt_id_at(&app, arg) {
                Some(id) => report(app.settings.select_prompt(id)),
                None => println!("No prompt '{}'.", arg),
            },
            "add" => match arg.split_once('|') {
                Some((name, text)) => report(app.settings.create_prompt(name, text.trim())),
                None => println!("Usage: add <name> | <text>"),
            },
            "delete" => match prompt_id_at(&app, arg) {
                Some(id) => report(app.settings.delete_prompt(id)),
                None => println!("No prompt '{}'.", arg),
            },
            "provider" => match Provider::from_name(arg) {
                Some(p) => app.settings.set_provider(p),
                None => println!("Unknown provider '{}'.", arg),
            },
            "model" => {
                let model = if arg == "default" { "" } else { arg };
                app.settings.set_custom_model(model);
            }
            "key" => app.settings.set_api_key(arg),
            "keychain" => {
                let provider = app.settings.read(|s| s.provider);
                if let Err(e) = store_in_keychain(provider, arg) {
                    println!("{}", e);
                }
            }
            "test" => match app.pipeline.test_connection().await {
                Ok(_) => println!("Connection OK."),
                Err(e) => println!("{}: {}", e.title(), e.user_message()),
            },
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
    }

    app.shutdown().await;
}

fn print_status(app: &App) {
    let s = app.settings.snapshot();
    let model = s
        .model_override()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} (default)", s.provider.default_model()));
    println!("state:     {}", app.engine.state().label());
    println!("provider:  {}", s.provider.display_name());
    println!("model:     {}", model);
    println!("api key:   {}", if s.api_key.is_empty() { "not set" } else { "set" });
    println!("prompt:    {}", s.selected_prompt().name);
    println!("auto-mode: {} ({:?})", s.auto_mode, s.auto_mode_behavior);
    println!(
        "hotkeys:   process {}, toggle auto-mode {}",
        s.hotkeys.process_text, s.hotkeys.toggle_auto_mode
    );
}

fn print_prompts(app: &App) {
    let s = app.settings.snapshot();
    for (i, p) in s.prompts.iter().enumerate() {
        let marker = if p.id == s.prompts.selected_id() { '*' } else { ' ' };
        println!("{} {}. {}", marker, i + 1, p.name);
    }
}

fn prompt_id_at(app: &App, arg: &str) -> Option<uuid::Uuid> {
    let index: usize = arg.parse().ok()?;
    let s = app.settings.snapshot();
    let id = s.prompts.iter().nth(index.checked_sub(1)?).map(|p| p.id);
    id
}

fn report<T, E: std::fmt::Display>(result: Result<T, E>) {
    if let Err(e) = result {
        println!("{}", e);
    }
}
