use anyhow::{Context, Result, bail};
use argh::FromArgs;
use lleh::config::{default_config_path, load_config};
use lleh::logging::init_logging;
use lleh::{DEFAULT_PROMPT, ExecMode, Interpreter, StdinSource};
use std::path::PathBuf;
use std::time::Duration;

#[derive(FromArgs)]
/// Interactive shell that runs commands one after another or in the background.
struct Args {
    #[argh(option, default = "default_config_path()")]
    /// file holding the program search path (default: ./shell-config)
    config: PathBuf,

    #[argh(option)]
    /// log level: error, warn, info, debug or trace (default: $LLEH_LOG, then warn)
    log_level: Option<String>,

    #[argh(option, default = "500")]
    /// longest wait for input in milliseconds before checking background processes
    poll_interval_ms: u64,

    #[argh(switch)]
    /// start in parallel mode
    parallel: bool,

    #[argh(option, default = "DEFAULT_PROMPT.to_string()")]
    /// prompt shown when the shell is ready for input
    prompt: String,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    init_logging(args.log_level.as_deref())?;

    if args.poll_interval_ms == 0 {
        bail!("--poll-interval-ms must be greater than zero");
    }

    let config = load_config(&args.config)?;
    let mode = if args.parallel {
        ExecMode::Parallel
    } else {
        ExecMode::Sequential
    };

    let input = StdinSource::new().context("can't open standard input")?;
    let mut shell = Interpreter::new(config, Box::new(input))
        .with_mode(mode)
        .with_prompt(args.prompt)
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms));
    shell.run()
}
