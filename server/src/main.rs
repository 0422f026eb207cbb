#[tokio::main]
async fn main() {
    nextword::start_server().await;
}
