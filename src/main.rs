use clap::{Parser as ClapParser, Subcommand};
use graphquery::{
    cli::{self, CheckOptions, CheckResult, CliError},
    output, Registry,
};
use std::{
    io::{self, Read},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "gq")]
#[command(about = "GraphQuery - extract typed JSON from HTML, XML and JSON documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an expression and run it against a document
    Check {
        /// The expression to run
        expression: String,

        /// Document text (reads from stdin if neither this nor --file is given)
        #[arg(short, long)]
        input: Option<String>,

        /// Read the document from a file
        #[arg(short, long, conflicts_with = "input")]
        file: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax and print the normalised expression
        #[arg(long)]
        syntax_only: bool,
    },

    /// List the available pipeline operations
    Ops,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            expression,
            input,
            file,
            pretty,
            syntax_only,
        } => run_check(expression, input, file, pretty, syntax_only),
        Commands::Ops => {
            print!("{}", cli::list_operations(Registry::global()));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    expression: String,
    input: Option<String>,
    file: Option<PathBuf>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if file.is_none() && !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        expression,
        input,
        file,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid(normalised) => {
            println!("Syntax is valid");
            println!("{}", normalised);
        }
        CheckResult::Success(response) => {
            let json = if pretty {
                output::to_json_pretty(&response)
            } else {
                output::to_json(&response)
            };
            println!("{}", json);
        }
    }
    Ok(())
}
