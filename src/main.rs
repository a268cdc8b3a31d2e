use retag::cli;
use retag::ui::output;

#[tokio::main]
async fn main() {
    if let Err(error) = cli::run().await {
        // Single terminal failure surface: "<what> failed ...: <cause>"
        output::error(format!("{:#}", error));
        std::process::exit(1);
    }
}
