use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = gmail_export::cli::Cli::parse();

    if let Err(err) = gmail_export::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
