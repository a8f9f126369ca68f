mod app;
mod audio;
mod chat;
mod commands;
mod config;
mod logging;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
