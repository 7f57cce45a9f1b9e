/*
 * Responsibility
 * - tokio runtime
 * - app::run() (no logic here)
 */
use anyhow::Result;

use negotiate_gate::app;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
