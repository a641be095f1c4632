// SPDX-License-Identifier: GPL-3.0-or-later

use dotenvy::dotenv;
use rocket::launch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use xapi_lrs::build;

#[launch]
async fn rocket() -> _ {
    let _ = dotenv();
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned());
    let filter = tracing_subscriber::EnvFilter::builder()
        .parse(rust_log)
        .expect("Failed parsing RUST_LOG :(");
    let console_logger = tracing_subscriber::fmt::layer().with_filter(filter);

    tracing_subscriber::registry().with(console_logger).init();

    build(false) // false == not for testing
}
