//! Line-oriented session over stdin. Each line is one interaction; the
//! report snapshot stays cached for the life of the session.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::dashboard::Dashboard;
use crate::gate::Access;
use crate::models::Area;
use crate::report;

const HELP: &str = "\
commands:
  area <Delhi|Noida|Mumbai>  switch area (logs out)
  login <password>           admin login for the current area
  logout                     back to the public panel
  alerts                     today's serious-issue scan
  reports                    admin: today's reports with an AI review
  ask <question>             ask the water body AI
  forms                      show the report form links
  refresh                    drop the cached report snapshot
  help                       this text
  quit                       leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Area(Area),
    Login(String),
    Logout,
    Alerts,
    Reports,
    Ask(String),
    Forms,
    Refresh,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim_start();
    if line.trim_end().is_empty() {
        return Ok(None);
    }

    // `raw` keeps its spacing; passwords are compared exactly.
    let (word, raw) = match line.split_once(char::is_whitespace) {
        Some((word, raw)) => (word, raw),
        None => (line, ""),
    };
    let rest = raw.trim();

    let command = match word.to_ascii_lowercase().as_str() {
        "area" => match Area::from_name(rest) {
            Some(area) => Command::Area(area),
            None => return Err(format!("unknown area {rest:?}")),
        },
        "login" => Command::Login(raw.to_string()),
        "logout" => Command::Logout,
        "alerts" => Command::Alerts,
        "reports" => Command::Reports,
        "ask" => Command::Ask(rest.to_string()),
        "forms" => Command::Forms,
        "refresh" => Command::Refresh,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command {other:?}, try `help`")),
    };

    Ok(Some(command))
}

struct Session {
    area: Area,
    password: String,
}

pub async fn run(dashboard: &mut Dashboard, area: Area) -> anyhow::Result<()> {
    let mut session = Session {
        area,
        password: String::new(),
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Water Body Companion, area {area}. Type `help` for commands.");

    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        if let Err(err) = handle(dashboard, &mut session, command).await {
            println!("error: {err:#}");
        }
    }

    Ok(())
}

async fn handle(dashboard: &mut Dashboard, session: &mut Session, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Area(area) => {
            session.area = area;
            session.password.clear();
            println!("Area set to {area}.");
        }
        Command::Login(password) => match dashboard.access(session.area, &password) {
            Access::Admin => {
                session.password = password;
                println!("Admin access granted for {}", session.area);
            }
            Access::Public { wrong_password } => {
                session.password.clear();
                if wrong_password {
                    println!("Wrong admin password. Showing public user options.");
                }
            }
        },
        Command::Logout => {
            session.password.clear();
            println!("Logged out.");
        }
        Command::Alerts => {
            let alerts = dashboard.alerts(session.area).await?;
            let text = report::build_alerts(&alerts);
            if text.is_empty() {
                println!("No serious issues reported today in {}.", session.area);
            } else {
                print!("{text}");
            }
        }
        Command::Reports => {
            if dashboard.access(session.area, &session.password).is_admin() {
                let view = dashboard.admin_view(session.area).await?;
                print!("{}", report::build_admin_view(&view));
            } else {
                println!("Admin login required for {}.", session.area);
            }
        }
        Command::Ask(question) => match dashboard.ask(&question).await {
            Some(answer) => print!("{}", report::build_answer(&answer)),
            None => println!("Type a question after `ask`."),
        },
        Command::Forms => print!("{}", report::build_forms(dashboard.config())),
        Command::Refresh => {
            dashboard.invalidate();
            println!("Report snapshot cleared.");
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }

    Ok(())
}
