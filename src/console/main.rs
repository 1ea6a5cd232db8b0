use clap::{Parser, Subcommand};
use jdma_forms::console::commands::{self, CallableTrait};
use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    Debug {
        #[command(subcommand)]
        command: DebugCommands,
    },
}

#[derive(Debug, Subcommand)]
enum TemplateCommands {
    /// Import a template tree from a YAML file
    Import {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// List config versions of a product with their validity windows
    Versions {
        #[arg(long)]
        template_id: i32,
        #[arg(long)]
        product_id: i32,
        #[arg(long)]
        form_id: Option<i32>,
    },
}

#[derive(Debug, Subcommand)]
enum DebugCommands {
    Json {
        #[arg(long)]
        line: usize,
        #[arg(long)]
        column: usize,
        #[arg(long)]
        payload: String,
    },
    /// Print a signed admin token
    Token {
        #[arg(long)]
        sub: String,
        #[arg(long, default_value = "admin")]
        role: String,
        #[arg(long, default_value = "")]
        email: String,
        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl: i64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    get_command(cli).call()
}

fn get_command(cli: Cli) -> Box<dyn CallableTrait> {
    match cli.command {
        Commands::Template { command } => match command {
            TemplateCommands::Import { file } => {
                Box::new(commands::template::ImportCommand::new(file))
            }
        },
        Commands::Config { command } => match command {
            ConfigCommands::Versions {
                template_id,
                product_id,
                form_id,
            } => Box::new(commands::config::VersionsCommand::new(
                template_id,
                product_id,
                form_id,
            )),
        },
        Commands::Debug { command } => match command {
            DebugCommands::Json {
                line,
                column,
                payload,
            } => Box::new(commands::debug::JsonCommand::new(line, column, payload)),
            DebugCommands::Token {
                sub,
                role,
                email,
                ttl,
            } => Box::new(commands::debug::TokenCommand::new(sub, role, email, ttl)),
        },
    }
}
