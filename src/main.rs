#[tokio::main]
async fn main() -> anyhow::Result<()> {
    armanual_lib::run().await
}
