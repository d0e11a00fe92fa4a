mod app;
mod capture;
mod commands;
mod config;
mod downloader;
mod logging;
mod recognition;
mod ui;
mod workflow;

fn main() {
    if let Err(e) = app::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
