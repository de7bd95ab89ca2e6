//! Legacy digital API example.
//!
//! Starts a legacy session, prints the first contract's positions, slides
//! the session once, and signs out.
//!
//! Run with: cargo run --example legacy_session
//!
//! Set GBM_USER and GBM_PASSWORD. The session pack is kept in
//! `last_session.json` under the preferences directory.

use gbm::legacy::{LegacySession, SessionPack};
use gbm::{ClientConfig, InstrumentType, SessionStore};

#[tokio::main]
async fn main() -> gbm::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = ClientConfig::default();
    let store = SessionStore::from_env()?;

    let session = match SessionPack::load_last(&store)
        .and_then(|pack| LegacySession::from_pack(pack, &config))
    {
        Ok(session) => {
            println!("Resumed session for {}", session.user());
            session
        }
        Err(e) => {
            println!("No usable saved session ({}), signing in", e);
            let user = std::env::var("GBM_USER").expect("GBM_USER environment variable required");
            let password =
                std::env::var("GBM_PASSWORD").expect("GBM_PASSWORD environment variable required");
            LegacySession::start(&user, &password, &config).await?
        }
    };
    let mut session = session.with_autosave(store)?;

    let api = session.api()?;
    let contract = api.first_contract_id().await?;
    println!("Contract {}", contract);

    let positions = api.portfolio().position(&contract).await?;
    println!("{}", serde_json::to_string_pretty(&positions)?);

    let monitor = api
        .market()
        .market_price_monitor_detail(InstrumentType::Bmv)
        .await?;
    println!("{} issues in the BMV monitor", monitor.as_array().map_or(0, Vec::len));

    session.slide().await?;
    println!("{} minutes left", session.remaining().num_minutes());

    session.stop().await?;
    println!("Signed out");
    Ok(())
}
