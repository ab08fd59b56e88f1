use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gmail-export", version, about = "Export Gmail messages to files or stdout")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output for auth commands")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Auth(AuthArgs),
    Export(ExportArgs),
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    Login,
    Status,
    Logout,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    // Selection conditions, joined with AND into a Gmail search query.
    #[arg(short = 'm', long = "message", help = "Filter by RFC 822 message id")]
    pub message: Option<String>,
    #[arg(short = 'l', long, help = "Filter by label")]
    pub label: Option<String>,
    #[arg(short = 'f', long, help = "Filter by sender")]
    pub from: Option<String>,
    #[arg(short = 't', long, help = "Filter by recipient")]
    pub to: Option<String>,
    #[arg(short = 's', long, help = "Filter by subject")]
    pub subject: Option<String>,

    // Presentation of results.
    #[arg(
        short = 'O',
        long,
        default_value = "stdout",
        help = "Output path, or `stdout`"
    )]
    pub output: String,
    #[arg(short = 'S', long, help = "Write each message to its own file")]
    pub split: bool,
    #[arg(
        short = 'F',
        long,
        default_value = "json",
        value_parser = ["json", "txt"],
        help = "Output format"
    )]
    pub format: String,
    #[arg(
        short = 'A',
        long,
        default_value = "all",
        value_parser = ["raw", "all", "small", "easy"],
        help = "Fullness of the output"
    )]
    pub area: String,
    #[arg(long, default_value = "me", help = "Mailbox owner (email address or `me`)")]
    pub user: String,
}
