use std::{fs, path::{Path, PathBuf}, process};

use clap::{Parser as ClapParser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::{fmt, EnvFilter};

use textproto::codec::FloatFormat;
use textproto::lexer::Lexer;
use textproto::token_dumper::TokenDumper;
use textproto::{DescriptorPool, DynamicMessage, ParseError, ParseOptions, Parser, PrintOptions};

/// Inspect and reformat protocol-buffer text format
#[derive(ClapParser, Debug)]
#[command(name = "textproto", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the token stream of a file
    Tokens {
        file: PathBuf,

        #[arg(long)]
        no_color: bool,

        /// Print string segments instead of raw source text
        #[arg(long)]
        pretty: bool,
    },

    /// Parse a file against a schema and print it back
    Fmt {
        /// Descriptor pool snapshot (postcard bytes)
        #[arg(long)]
        schema: PathBuf,

        /// Fully-qualified message type of the file
        #[arg(long = "type")]
        message_type: String,

        file: PathBuf,

        /// Merge repeated singular fields instead of rejecting them
        #[arg(long)]
        merge: bool,

        #[arg(long)]
        allow_unknown_field: bool,

        #[arg(long)]
        allow_unknown_extension: bool,

        #[arg(long)]
        one_line: bool,

        #[arg(long)]
        pointy: bool,

        /// Leave non-ASCII text unescaped
        #[arg(long)]
        utf8: bool,

        #[arg(long)]
        index_order: bool,

        /// printf-style float format, e.g. ".15g"
        #[arg(long)]
        float_format: Option<FloatFormat>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            error!("failed to read '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn report(path: &Path, e: &ParseError) -> ! {
    eprintln!("{}:{}:{}: {}", path.display(), e.line, e.column, e.message);
    process::exit(1);
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Tokens {
            file,
            no_color,
            pretty,
        } => {
            let source = read(&file);
            let mut dumper = TokenDumper::new();
            if no_color {
                dumper = dumper.no_color();
            }
            if pretty {
                dumper = dumper.pretty();
            }
            let result = Lexer::new(&source).and_then(|lexer| dumper.dump(lexer));
            if let Err(e) = result {
                report(&file, &e);
            }
        }

        Command::Fmt {
            schema,
            message_type,
            file,
            merge,
            allow_unknown_field,
            allow_unknown_extension,
            one_line,
            pointy,
            utf8,
            index_order,
            float_format,
        } => {
            let bytes = match fs::read(&schema) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("failed to read '{}': {}", schema.display(), e);
                    process::exit(1);
                }
            };
            let pool = match DescriptorPool::from_bytes(&bytes) {
                Ok(pool) => pool,
                Err(e) => {
                    error!("bad schema '{}': {}", schema.display(), e);
                    process::exit(1);
                }
            };
            if pool.message(&message_type).is_none() {
                error!("message type '{}' is not in '{}'", message_type, schema.display());
                process::exit(1);
            }
            debug!(messages = pool.messages().count(), "schema loaded");

            let mut parse_options = ParseOptions::default();
            parse_options.allow_unknown_field = allow_unknown_field;
            parse_options.allow_unknown_extension = allow_unknown_extension;
            let parser = Parser::new(&pool).options(parse_options);

            let source = read(&file);
            let mut message = DynamicMessage::new(&message_type);
            let result = if merge {
                parser.merge(&source, &mut message)
            } else {
                parser.parse(&source, &mut message)
            };
            if let Err(e) = result {
                report(&file, &e);
            }

            let options = PrintOptions {
                as_one_line: one_line,
                as_utf8: utf8,
                pointy_brackets: pointy,
                use_index_order: index_order,
                float_format,
                indent: 0,
            };
            let text = textproto::to_text(&message, &pool, &options);
            if one_line {
                println!("{}", text);
            } else {
                print!("{}", text);
            }
        }
    }
}
