#![forbid(unsafe_code)]

use std::sync::Arc;

use dotenvy::dotenv;
use eyre::WrapErr;
use log::{info, warn};
use primordial_pit::{
    api::{self, Services},
    Config,
};
use store::{Clock, SystemClock};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    pretty_env_logger::init_timed();
    dotenv().ok();

    let config = Config::from_env().wrap_err("Could not load configuration")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = config
        .store
        .connect(clock.clone())
        .wrap_err("Could not connect to store")?;

    if config.helius.api_key.is_none() {
        warn!("HELIUS_API_KEY not set, NFT search will fail");
    }

    let services = Arc::new(Services::new(&config, store, clock));
    let routes = api::routes(services, &config.allowed_origin);

    info!(
        "Listening on {} for {}",
        config.bind_addr, config.allowed_origin
    );
    warp::serve(routes).run(config.bind_addr).await;

    Ok(())
}
