//! Command parsing and dispatch for the `hrms` binary.

use anyhow::{anyhow, bail, Result};
use tracing::debug;

use crate::config::ClientConfig;
use crate::identity::{landing_route, resolve_navigation, BootstrapOutcome, Navigation, RegisterRequest, Route};
use crate::HrmsClient;

pub mod outputformatter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Register { username: String, email: String, password: String, full_name: Option<String> },
    Whoami,
    Status,
    Routes,
    Navigate { route: String },
    ChangePassword { current: String, new: String },
    Logout,
    Help,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login { .. } => "login",
            Command::Register { .. } => "register",
            Command::Whoami => "whoami",
            Command::Status => "status",
            Command::Routes => "routes",
            Command::Navigate { .. } => "navigate",
            Command::ChangePassword { .. } => "change-password",
            Command::Logout => "logout",
            Command::Help => "help",
        }
    }
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage:\n  {program} [--base-url <url>] [--session-dir <dir>] <command>\n\nCommands:\n  login <username> <password>                     log in and persist the session\n  register <username> <email> <password> [name]   create an account (does not log in)\n  whoami                                          show the current identity (fetched from the server)\n  status                                          show the restored session without a network call when cached\n  routes                                          list routes permitted for the current role\n  navigate <route>                                resolve a route against the current role\n  change-password <current> <new>                 rotate the password\n  logout                                          clear the stored session\n  help                                            show this help\n\nEnvironment:\n  HRMS_API_BASE_URL        API base URL (default http://127.0.0.1:8000/api/v1)\n  HRMS_SESSION_DIR         session directory (default .hrms)\n  HRMS_REQUEST_TIMEOUT_MS  request timeout in milliseconds (default 30000)\n  HRMS_OUTPUT=json         print JSON instead of tables\n  RUST_LOG                 log filter (default info)"
    )
}

/// Parse arguments (without the program name). Flags override `cfg`.
pub fn parse_args(args: &[String], cfg: &mut ClientConfig) -> Result<Command> {
    let mut rest: Vec<String> = Vec::new();
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--base-url" => {
                i += 1;
                cfg.base_url = args.get(i).cloned().ok_or_else(|| anyhow!("--base-url requires a value"))?;
            }
            "--session-dir" => {
                i += 1;
                cfg.session_dir = args.get(i).cloned().ok_or_else(|| anyhow!("--session-dir requires a value"))?.into();
            }
            "-h" | "--help" => return Ok(Command::Help),
            other => rest.push(other.to_string()),
        }
        i += 1;
    }
    let Some((cmd, params)) = rest.split_first() else { return Ok(Command::Help) };
    let arg = |n: usize, what: &str| params.get(n).cloned().ok_or_else(|| anyhow!("{} requires <{}>", cmd, what));
    let command = match cmd.as_str() {
        "login" => Command::Login { username: arg(0, "username")?, password: arg(1, "password")? },
        "register" => Command::Register {
            username: arg(0, "username")?,
            email: arg(1, "email")?,
            password: arg(2, "password")?,
            full_name: params.get(3).cloned(),
        },
        "whoami" => Command::Whoami,
        "status" => Command::Status,
        "routes" => Command::Routes,
        "navigate" => Command::Navigate { route: arg(0, "route")? },
        "change-password" => Command::ChangePassword { current: arg(0, "current")?, new: arg(1, "new")? },
        "logout" => Command::Logout,
        "help" => Command::Help,
        other => bail!("unknown command '{}'", other),
    };
    Ok(command)
}

pub async fn run(command: Command, client: &HrmsClient) -> Result<()> {
    debug!(target: "hrms::cli", "running command={}", command.name());
    match command {
        Command::Help => {
            println!("{}", usage("hrms"));
        }
        Command::Login { username, password } => {
            let session = client.auth.login(&username, &password).await.map_err(|e| anyhow!(e.message()))?;
            println!("signed in as {} ({})", session.identity.display_name(), session.identity.role);
            if let Navigation::Route(r) = landing_route(&session.identity.role) {
                println!("landing route: {}", r);
            }
        }
        Command::Register { username, email, password, full_name } => {
            let req = RegisterRequest { username, email, password, full_name };
            let user = client.auth.register(&req).await.map_err(|e| anyhow!(e.message()))?;
            println!("{}", outputformatter::render_identity(&user));
        }
        Command::Logout => {
            client.auth.logout()?;
            println!("logged out");
        }
        Command::Status => match client.bootstrap.run().await {
            BootstrapOutcome::LoggedIn(s) => println!("{}", outputformatter::render_identity(&s.identity)),
            BootstrapOutcome::LoggedOut => println!("not logged in"),
        },
        Command::Whoami => {
            require_session(client).await?;
            let me = client.auth.current_user().await.map_err(|e| anyhow!(e.message()))?;
            println!("{}", outputformatter::render_identity(&me));
        }
        Command::Routes => {
            let role = require_session(client).await?;
            println!("{}", outputformatter::render_routes(&role));
        }
        Command::Navigate { route } => {
            let role = require_session(client).await?;
            let requested = Route::parse(&route).ok_or_else(|| anyhow!("unknown route '{}'", route))?;
            match resolve_navigation(requested, &role) {
                Navigation::Route(r) if r == requested => println!("{}", r),
                Navigation::Route(r) => println!("{} (redirected from {})", r, requested),
                Navigation::LoggedOut => println!("login (no routes permitted for role '{}')", role),
            }
        }
        Command::ChangePassword { current, new } => {
            require_session(client).await?;
            client.auth.change_password(&current, &new).await.map_err(|e| anyhow!(e.message()))?;
            println!("password changed");
        }
    }
    Ok(())
}

/// Bootstrap and return the current role, or fail when logged out.
async fn require_session(client: &HrmsClient) -> Result<String> {
    match client.bootstrap.run().await {
        BootstrapOutcome::LoggedIn(s) => Ok(s.identity.role),
        BootstrapOutcome::LoggedOut => bail!("not logged in; run `hrms login <username> <password>`"),
    }
}
