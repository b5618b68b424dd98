#[tokio::main]
async fn main() {
    sqlpack_cli::logging::init();

    if let Err(e) = sqlpack_cli::run(std::env::args().collect()).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
