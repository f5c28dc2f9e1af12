//! LiteDB CLI Client
//!
//! Command-line interface for interacting with a LiteDB server.

use std::collections::VecDeque;

use clap::{Parser, Subcommand};
use litedb::{Client, Command, Config, LiteDbError, ReplyFuture, ResponseFrame};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

/// LiteDB CLI
#[derive(Parser, Debug)]
#[command(name = "litedb-cli")]
#[command(about = "CLI for the LiteDB key-value store")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = litedb::protocol::DEFAULT_SERVER_HOST)]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = litedb::protocol::DEFAULT_SERVER_PORT)]
    port: u16,

    /// Maximum commands in flight
    #[arg(long, default_value_t = litedb::queue::DEFAULT_MAX_QUEUE_LENGTH)]
    max_queue: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a raw command string
    Raw {
        /// Command words, joined with spaces
        #[arg(required = true)]
        text: Vec<String>,

        /// Extra `key=value` options appended to the command
        #[arg(short, long = "opt", value_parser = parse_option)]
        options: Vec<(String, String)>,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all keys
    Keys,

    /// Ping the server
    Ping,

    /// Read commands from stdin, one per line, and pipeline them
    Pipe,
}

fn parse_option(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{}`", s))
}

impl Commands {
    /// Build the command text for a single-shot subcommand
    fn to_command(&self) -> Option<Command> {
        let command = match self {
            Commands::Raw { text, options } => {
                Command::with_options(&text.join(" "), options.iter().map(|(k, v)| (k, v)))
            }
            Commands::Get { key } => Command::new(format!("get {}", key)),
            Commands::Set { key, value } => Command::new(format!("set {} {}", key, value)),
            Commands::Del { key } => Command::new(format!("del {}", key)),
            Commands::Keys => Command::new("keys"),
            Commands::Ping => Command::new("ping"),
            Commands::Pipe => return None,
        };
        Some(command)
    }
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,litedb=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .max_queue_length(args.max_queue)
        .build();

    tracing::debug!("LiteDB CLI v{} connecting to {}", litedb::VERSION, config.addr());

    let client = match Client::connect(config).await {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    let had_error = match args.command.to_command() {
        Some(command) => run_single(&client, command).await,
        None => run_pipe(&client).await,
    };

    if let Err(e) = client.close().await {
        tracing::error!("Close failed: {}", e);
        std::process::exit(1);
    }

    if had_error {
        std::process::exit(1);
    }
}

/// Send one command and print the reply. Returns true on any error.
async fn run_single(client: &Client, command: Command) -> bool {
    let reply = match client.send(command) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("{}", e);
            return true;
        }
    };

    report_reply(reply.await)
}

/// Pipeline every stdin line, printing replies in order
async fn run_pipe(client: &Client) -> bool {
    let stdin = BufReader::new(tokio::io::stdin());
    pipe_lines(client, stdin, report_reply).await
}

/// Send one command per non-blank input line, keeping as many in flight as
/// the queue admits
///
/// When the queue is full the oldest reply is awaited and reported before
/// the same line is retried. `report` receives every reply in send order
/// and returns true for an error. Returns true if any line failed.
async fn pipe_lines<R, F>(client: &Client, input: R, mut report: F) -> bool
where
    R: AsyncBufRead + Unpin,
    F: FnMut(Result<ResponseFrame, LiteDbError>) -> bool,
{
    let mut in_flight: VecDeque<ReplyFuture> = VecDeque::new();
    let mut had_error = false;
    let mut lines = input.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                had_error = true;
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        loop {
            match client.send(line) {
                Ok(reply) => {
                    in_flight.push_back(reply);
                    break;
                }
                Err(LiteDbError::QueueFull { .. }) if !in_flight.is_empty() => {
                    if let Some(oldest) = in_flight.pop_front() {
                        had_error |= report(oldest.await);
                    }
                }
                Err(e) => {
                    tracing::error!("`{}` not sent: {}", line, e);
                    had_error = true;
                    break;
                }
            }
        }
    }

    while let Some(reply) = in_flight.pop_front() {
        had_error |= report(reply.await);
    }

    had_error
}

/// Print a reply or log its failure; returns true on any error
fn report_reply(reply: Result<ResponseFrame, LiteDbError>) -> bool {
    match reply {
        Ok(frame) => print_frame(&frame),
        Err(e) => {
            tracing::error!("{}", e);
            true
        }
    }
}

/// Print a reply; returns true if the server reported an error
fn print_frame(frame: &ResponseFrame) -> bool {
    println!("{}", frame);
    frame.is_error()
}
