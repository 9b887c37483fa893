#[tokio::main]
async fn main() {
    if let Err(err) = mm_api::run().await {
        tracing::error!(error = %err, "mm-api failed");
        std::process::exit(1);
    }
}
