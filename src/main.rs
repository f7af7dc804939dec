#[tokio::main]
async fn main() {
    if let Err(e) = expertdesk_lib::run().await {
        tracing::error!(error = %e, "Expertdesk exited with an error");
        eprintln!("expertdesk: {e}");
        std::process::exit(1);
    }
}
