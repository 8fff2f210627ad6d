use std::sync::Arc;

use wsb_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), wsb_core::Error> {
    wsb_core::logging::init("wsb")?;

    let cfg = Arc::new(Config::load()?);

    wsb_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| wsb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
