use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::{LoxError, RunError};
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::scanner::{scan_tokens, Scanner};

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: Option<PathBuf> },

    /// Parses a program from a file and prints its AST
    Parse {
        filename: Option<PathBuf>,

        /// Print the AST as JSON instead of prefix notation
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a program
    Run { filename: Option<PathBuf> },

    /// Reads and runs programs line by line from stdin
    Repl,
}

/// Reads the contents of a file as UTF‑8 text.
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report(errors: &[LoxError]) {
    for e in errors {
        debug!("Reporting: {:?}", e);
        eprintln!("{}", e);
    }
}

fn report_run_error(error: &RunError) {
    match error {
        RunError::Static(errors) => report(errors),
        RunError::Runtime(e) => report(std::slice::from_ref(e)),
    }
}

fn no_input(command: &str) -> ! {
    info!("No filepath provided for {}", command);
    println!("No input filepath was provided. Exiting...");
    std::process::exit(0);
}

fn tokenize(source: &str) {
    let mut tokenized = true;

    for result in Scanner::new(source) {
        match result {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");
        std::process::exit(65);
    }
}

fn parse(source: &str, json: bool) -> Result<()> {
    let (tokens, mut errors) = scan_tokens(source);
    let (statements, parse_errors) = Parser::new(&tokens).parse();
    errors.extend(parse_errors);

    if !errors.is_empty() {
        report(&errors);
        std::process::exit(65);
    }

    if json {
        let rendered = serde_json::to_string_pretty(&statements).context("Failed to encode AST")?;
        println!("{}", rendered);
    } else {
        for stmt in &statements {
            println!("{}", AstPrinter::print_stmt(stmt));
        }
    }

    Ok(())
}

fn evaluate(source: &str) {
    let (tokens, lex_errors) = scan_tokens(source);

    if !lex_errors.is_empty() {
        report(&lex_errors);
        std::process::exit(65);
    }

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,
        Err(errors) => {
            report(&errors);
            std::process::exit(65);
        }
    };

    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut stdout);

    match interpreter.evaluate_expression(&expr) {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(70);
        }
    }
}

fn repl() -> Result<()> {
    let mut stdout = io::stdout();
    let mut interpreter = Interpreter::new(&mut stdout);
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 || line.trim().is_empty() {
            break;
        }

        // Errors are reported and the session carries on.
        if let Err(e) = rox::run(&line, &mut interpreter) {
            report_run_error(&e);
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            let filename = filename.unwrap_or_else(|| no_input("Tokenize"));
            tokenize(&read_file(filename)?);
        }

        Commands::Parse { filename, json } => {
            let filename = filename.unwrap_or_else(|| no_input("Parse"));
            parse(&read_file(filename)?, json)?;
        }

        Commands::Evaluate { filename } => {
            let filename = filename.unwrap_or_else(|| no_input("Evaluate"));
            evaluate(&read_file(filename)?);
        }

        Commands::Run { filename } => {
            let filename = filename.unwrap_or_else(|| no_input("Run"));
            let source = read_file(filename)?;

            let mut stdout = io::stdout();
            let mut interpreter = Interpreter::new(&mut stdout);

            if let Err(e) = rox::run(&source, &mut interpreter) {
                report_run_error(&e);
                std::process::exit(e.exit_code());
            }

            info!("Program executed successfully");
        }

        Commands::Repl => repl()?,
    }

    Ok(())
}
