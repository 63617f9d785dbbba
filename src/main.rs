use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use openai_cli::commands::{parse_repl_command, ReplCommand};
use openai_cli::config::DEFAULT_HEADER;
use openai_cli::providers::provider_from_config;
use openai_cli::{AppConfig, ConversationEngine, EngineError, EngineResult};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const QUIT_INPUT: &str = "QUIT";

fn main() -> ExitCode {
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{DEFAULT_HEADER} {error}");
            return ExitCode::FAILURE;
        }
    };

    let mut engine = match open_engine(&config) {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("{} {error}", config.header);
            return ExitCode::FAILURE;
        }
    };

    run_repl(&mut engine, &config.header)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn open_engine(config: &AppConfig) -> Result<ConversationEngine, EngineError> {
    config.validate()?;
    let client = provider_from_config(config)?;
    ConversationEngine::open(config, client)
}

fn run_repl(engine: &mut ConversationEngine, header: &str) -> ExitCode {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();

    loop {
        print!("You: ");
        if let Err(error) = stdout.flush() {
            tracing::debug!(%error, "failed to flush prompt");
        }

        let (line, at_eof) = match lines.next() {
            Some(Ok(line)) => (line, false),
            Some(Err(error)) => {
                eprintln!("{header} failed to read input: {error}");
                (QUIT_INPUT.to_string(), true)
            }
            None => {
                println!();
                (QUIT_INPUT.to_string(), true)
            }
        };

        if let Some(command) = parse_repl_command(&line) {
            handle_repl_command(engine, header, command);
            continue;
        }

        match engine.submit(&line) {
            Ok(EngineResult::Continue(reply)) => println!("ChatGPT: {}", reply.content),
            Ok(EngineResult::Stopped) => return ExitCode::SUCCESS,
            Err(error) => {
                if let Some(reply) = error.response() {
                    println!("ChatGPT: {}", reply.content);
                }
                eprintln!("{header} {error}");
                if at_eof {
                    return ExitCode::FAILURE;
                }
            }
        }
    }
}

fn handle_repl_command(engine: &mut ConversationEngine, header: &str, command: ReplCommand) {
    match command {
        ReplCommand::Toggle(name) => match engine.flip_option_by_name(&name) {
            Ok((option, value)) => println!("{header} {option} = {value}"),
            Err(error) => eprintln!("{header} {error}"),
        },
        ReplCommand::Options => {
            for (option, value) in engine.options().iter() {
                println!("{header} {option} = {value}");
            }
        }
        ReplCommand::Help => {
            println!("{header} QUIT saves and exits; WRITELAST saves; WIPE archives history");
            println!("{header} :toggle <option> flips an option; :options lists them");
        }
        ReplCommand::Unknown(command) => {
            eprintln!("{header} unknown command {command}; try :help");
        }
    }
}
