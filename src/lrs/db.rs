// SPDX-License-Identifier: GPL-3.0-or-later

//! Wires the connection pool as Rocket managed state: the real pool in
//! production, an ephemeral [MockDB][crate::db::MockDB] while testing.

use crate::db::MockDB;
use rocket::{
    fairing::{self, Fairing, Info, Kind},
    Build, Rocket,
};
use tracing::info;

/// Rocket Fairing that creates the connection pool on ignition and manages
/// it as Rocket state. When `testing`, an ephemeral [MockDB] is created
/// eagerly and kept alive for the fairing's lifetime so its physical
/// database survives until the Rocket instance is torn down.
#[derive(Debug, Default)]
pub(crate) struct DBFairing {
    mock_db: Option<MockDB>,
}

impl DBFairing {
    pub(crate) fn new(testing: bool) -> Self {
        let mock_db = testing.then(MockDB::new);
        Self { mock_db }
    }
}

#[rocket::async_trait]
impl Fairing for DBFairing {
    fn info(&self) -> Info {
        Info {
            name: "DB Connections Pool",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, r: Rocket<Build>) -> fairing::Result {
        let pool = match &self.mock_db {
            Some(mock) => mock.pool().await,
            None => crate::db::connect().await.expect("Failed creating DB pool"),
        };
        info!("DB ready!");
        Ok(r.manage(pool))
    }
}
