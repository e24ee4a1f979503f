mod config;
mod interrupt;
mod launch;
mod logging;
mod observer;
mod paths;
mod provider;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::config::{LaunchConfig, load_cfg, save_cfg};
use crate::launch::{
    LaunchRequest, LaunchResult, LoginMethod, Orchestrator, PumpOptions, SettleStrategy,
    read_game_path, stop_background_service,
};
use crate::observer::{ConsoleObserver, LaunchObserver};
use crate::paths::{LIB_MAXIMA, PATH_DATA};
use crate::provider::{NativeProvider, Provider};

/// Environment variable holding the password for `--persona` logins
const PASSWORD_ENV: &str = "MXLAUNCH_PASSWORD";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    slug: Option<String>,
    library: Option<PathBuf>,
    lsx_port: Option<u16>,
    persona: Option<String>,
    settle: Option<SettleStrategy>,
    debug: bool,
    game_path: Option<String>,
    stop_service: bool,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", flag))
        };
        match arg.as_str() {
            "--help" => cli.help = true,
            "--debug" => cli.debug = true,
            "--stop-service" => cli.stop_service = true,
            "--slug" => cli.slug = Some(value("--slug")?),
            "--library" => cli.library = Some(PathBuf::from(value("--library")?)),
            "--persona" => cli.persona = Some(value("--persona")?),
            "--game-path" => cli.game_path = Some(value("--game-path")?),
            "--lsx-port" => {
                let port = value("--lsx-port")?;
                cli.lsx_port = Some(
                    port.parse()
                        .map_err(|_| format!("invalid LSX port '{}'", port))?,
                );
            }
            "--settle" => {
                cli.settle = Some(match value("--settle")?.as_str() {
                    "poll" => SettleStrategy::Poll,
                    "fixed" => SettleStrategy::Fixed,
                    other => return Err(format!("unknown settle strategy '{}'", other)),
                });
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option '{}'", flag)),
            slug => {
                if cli.slug.is_some() {
                    return Err(format!("unexpected argument '{}'", slug));
                }
                cli.slug = Some(slug.to_string());
            }
        }
    }

    Ok(cli)
}

/// Merge command-line flags over the stored settings
fn build_request(
    cli: &CliArgs,
    config: &LaunchConfig,
    password: Option<String>,
) -> Result<Option<LaunchRequest>, Box<dyn Error>> {
    let Some(slug) = cli.slug.clone().or_else(|| config.game_slug.clone()) else {
        return Ok(None);
    };

    let mut provisioning = config.provisioning_policy();
    if let Some(settle) = cli.settle {
        provisioning.strategy = settle;
    }

    let login = match cli.persona.clone().or_else(|| config.persona.clone()) {
        Some(persona) => {
            let password = password
                .ok_or_else(|| format!("{} must be set to log in as '{}'", PASSWORD_ENV, persona))?;
            LoginMethod::Credentials { persona, password }
        }
        None => LoginMethod::Browser,
    };

    Ok(Some(LaunchRequest {
        login,
        lsx_port: cli.lsx_port.or(config.lsx_port),
        focus_after_login: config.focus_after_login,
        provisioning,
        ..LaunchRequest::new(slug)
    }))
}

/// Launch, then stream events until `should_stop` says so.
///
/// `arm_stop` runs only once the game is up. Until then signals keep their
/// default disposition, so Ctrl-C during login or provisioning ends the process.
fn launch_and_stream<P, O>(
    orchestrator: &mut Orchestrator<'_, P, O>,
    request: &LaunchRequest,
    options: PumpOptions,
    arm_stop: impl FnOnce(),
    should_stop: impl Fn() -> bool,
) -> LaunchResult<()>
where
    P: Provider + 'static,
    O: LaunchObserver,
{
    let game = orchestrator.launch(request)?;
    arm_stop();
    orchestrator.pump_events(game, options, should_stop)
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("[mxlaunch] {}", msg);
            eprintln!("{}", USAGE_TEXT);
            std::process::exit(1);
        }
    };

    if cli.help {
        println!("{}", USAGE_TEXT);
        std::process::exit(0);
    }

    logging::init(cli.debug);

    let settings = PATH_DATA.join("settings.json");
    if !settings.exists() {
        if let Err(e) = save_cfg(&LaunchConfig::default()) {
            warn!(path = %settings.display(), error = %e, "could not write default settings");
        }
    }
    let config = load_cfg();

    // The provider reads its log level once, when its logger starts.
    if cli.debug || config.debug_logging {
        unsafe {
            std::env::set_var("MAXIMA_LOG_LEVEL", "debug");
        }
    }

    if let Err(e) = run(&cli, &config) {
        println!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &CliArgs, config: &LaunchConfig) -> Result<(), Box<dyn Error>> {
    let request = if cli.game_path.is_some() || cli.stop_service {
        None
    } else {
        match build_request(cli, config, std::env::var(PASSWORD_ENV).ok())? {
            Some(request) => Some(request),
            None => {
                eprintln!("[mxlaunch] no game slug given");
                eprintln!("{}", USAGE_TEXT);
                std::process::exit(1);
            }
        }
    };

    let library = cli
        .library
        .clone()
        .or_else(|| config.library_path.clone())
        .unwrap_or_else(|| LIB_MAXIMA.clone());
    let provider = NativeProvider::load(&library)?;

    if let Some(name) = &cli.game_path {
        let path = read_game_path(&provider, name)?;
        println!("{}", path.display());
        return Ok(());
    }

    if cli.stop_service {
        stop_background_service(&provider)?;
        println!("Background service stopped");
        return Ok(());
    }

    let Some(request) = request else {
        return Ok(());
    };

    let mut observer = ConsoleObserver;
    let mut orchestrator = Orchestrator::new(Arc::new(provider), &mut observer);
    launch_and_stream(
        &mut orchestrator,
        &request,
        config.pump_options(),
        interrupt::install,
        interrupt::requested,
    )?;
    Ok(())
}

static USAGE_TEXT: &str = r#"
Usage: mxlaunch [OPTIONS] [SLUG]

Options:
    --slug <slug>           Owned game to launch (same as the positional SLUG)
    --library <path>        Provider library to load instead of the default location
    --lsx-port <port>       LSX port handed to the game
    --persona <name>        Log in with credentials; the password is read from MXLAUNCH_PASSWORD
    --settle <poll|fixed>   How to wait for the background service after fixing it
    --debug                 Verbose diagnostics, and MAXIMA_LOG_LEVEL=debug for the provider
    --game-path <name>      Print a game's install path and exit
    --stop-service          Stop the background service and exit
    --help                  Show this text
"#;
