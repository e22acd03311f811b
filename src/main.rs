//! Ingredient MVC terminal front-end
//!
//! Mounts the ingredient view and drives it from stdin, one command per line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{JoinHandle, LocalSet};
use tracing::{info, warn};

use ingredient_mvc::components::{Component, IngredientMvc, COMMIT_KEY};
use ingredient_mvc::transport::{HttpTransport, MemoryTransport, Transport};
use ingredient_mvc::{AppContext, MvcConfig};

const HELP: &str = "\
commands:
  add <name> | <quantity>   create an ingredient
  check <id>                toggle the check mark
  del <id>                  delete on the server (row stays until refresh)
  refresh                   refetch the list
  show                      print the view
  log                       print recent log lines
  quit";

#[derive(Parser, Debug)]
#[command(name = "ingredient-mvc", version, about = "Ingredient list synced with a REST server")]
struct Cli {
    /// JSON config file
    #[arg(long, default_value = "ingredient-mvc.json")]
    config: PathBuf,

    /// Server origin, overrides config and environment
    #[arg(long)]
    base_url: Option<String>,

    /// Use an in-process server instead of HTTP
    #[arg(long)]
    offline: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Add { name: String, quantity: String },
    Check(i64),
    Delete(i64),
    Refresh,
    Show,
    Log,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let id = |rest: &str| {
        rest.parse::<i64>()
            .map_err(|_| format!("expected a numeric id, got '{}'", rest))
    };

    match word {
        "add" => {
            let (name, quantity) = rest.split_once('|').unwrap_or((rest, ""));
            Ok(Command::Add {
                name: name.trim().to_string(),
                quantity: quantity.trim().to_string(),
            })
        }
        "check" => id(rest).map(Command::Check),
        "del" | "delete" => id(rest).map(Command::Delete),
        "refresh" => Ok(Command::Refresh),
        "show" | "" => Ok(Command::Show),
        "log" => Ok(Command::Log),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}', try 'help'", other)),
    }
}

fn build_transport(cli: &Cli, config: &MvcConfig) -> Rc<dyn Transport> {
    if cli.offline {
        info!("using in-process transport");
        Rc::new(MemoryTransport::new())
    } else {
        info!(base_url = %config.base_url, "using http transport");
        Rc::new(HttpTransport::new(&config.base_url, &config.api_prefix))
    }
}

async fn settle(view: &IngredientMvc, handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        if let Err(err) = handle.await {
            warn!(%err, "command task aborted");
        }
    }
    view.list().idle().await;
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = MvcConfig::load(&cli.config)?.with_env_overrides();
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }

    rolling_logger::init_logger(&config.log_dir, "IngredientMvc")?;
    info!(config = %cli.config.display(), "ingredient-mvc starting");

    let context = AppContext::new(build_transport(&cli, &config), &config);
    let view = context.view();
    view.on_mount();
    view.list().idle().await;
    let _ = rolling_logger::info(&format!(
        "ingredient-mvc ready with {} ingredients",
        view.list().child_count()
    ));
    println!("{}", view.render());
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            Command::Add { name, quantity } => {
                view.input().set_name(&name);
                view.input().set_quantity(&quantity);
                let handle = view.input().on_key_up(COMMIT_KEY);
                settle(&view, handle).await;
            }
            Command::Check(id) => match view.list().find(id) {
                Some(item) => settle(&view, item.toggle_check()).await,
                None => println!("no ingredient #{}", id),
            },
            Command::Delete(id) => match view.list().find(id) {
                Some(item) => settle(&view, item.request_delete()).await,
                None => println!("no ingredient #{}", id),
            },
            Command::Refresh => {
                view.list().spawn_refresh();
                settle(&view, None).await;
            }
            Command::Show => {}
            Command::Log => {
                for line in rolling_logger::recent_lines() {
                    println!("{}", line);
                }
                continue;
            }
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Quit => break,
        }
        println!("{}", view.render());
    }

    view.on_unmount();
    info!("ingredient-mvc stopped");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let local = LocalSet::new();
    match local.run_until(run(cli)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", report_failure(&*err));
            ExitCode::FAILURE
        }
    }
}

/// Log a fatal error to the rolling log when it is up, and return the line
/// for stderr
fn report_failure(err: &dyn std::error::Error) -> String {
    let message = format!("ingredient-mvc: {}", err);
    let _ = rolling_logger::error(&message);
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        assert_eq!(
            parse_command("add brown sugar | 1 cup").unwrap(),
            Command::Add { name: "brown sugar".into(), quantity: "1 cup".into() }
        );
        // a missing quantity is left for validation to reject
        assert_eq!(
            parse_command("add salt").unwrap(),
            Command::Add { name: "salt".into(), quantity: "".into() }
        );
    }

    #[test]
    fn test_parse_ids() {
        assert_eq!(parse_command("check 1000").unwrap(), Command::Check(1000));
        assert_eq!(parse_command("  del 7 ").unwrap(), Command::Delete(7));
        assert!(parse_command("check flour").is_err());
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(parse_command("").unwrap(), Command::Show);
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn test_report_failure_before_logger_init() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no config dir");
        assert_eq!(report_failure(&err), "ingredient-mvc: no config dir");
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["ingredient-mvc", "--offline", "--base-url", "http://x:1"]);
        assert!(cli.offline);
        assert_eq!(cli.base_url.as_deref(), Some("http://x:1"));
        assert_eq!(cli.config, PathBuf::from("ingredient-mvc.json"));
    }
}
