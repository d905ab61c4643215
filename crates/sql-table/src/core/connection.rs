use crate::{
    config::DbConfig,
    core::client::{Connect, DbClient, DbStatement},
    error::{TableError, TableResult},
};

/// Owns the driver handle and the single transaction flag.
pub struct ConnectionManager {
    client: Option<Box<dyn DbClient>>,
    using_transaction: bool,
    debug: bool,
}

impl ConnectionManager {
    pub fn new(client: Box<dyn DbClient>) -> Self {
        Self {
            client: Some(client),
            using_transaction: false,
            debug: false,
        }
    }

    pub fn connect<C: Connect>(config: &DbConfig) -> TableResult<Self> {
        let target = config.redacted_url();
        let client = C::connect(config).map_err(|source| {
            tracing::error!(url = %target, error = %source, "connect failed");
            TableError::ConnectFailed {
                target: target.clone(),
                source,
            }
        })?;
        tracing::debug!(url = %target, "connected");
        Ok(Self::new(Box::new(client)))
    }

    fn client(&self) -> TableResult<&dyn DbClient> {
        self.client.as_deref().ok_or(TableError::NoConnection)
    }

    pub fn prepare(&self, sql: &str) -> TableResult<Box<dyn DbStatement + '_>> {
        Ok(self.client()?.prepare(sql)?)
    }

    /// No-op while a transaction is already open.
    pub fn begin_transaction(&mut self) -> TableResult<()> {
        if self.using_transaction {
            return Ok(());
        }
        self.client()?.begin_transaction()?;
        self.using_transaction = true;
        tracing::debug!("transaction started");
        Ok(())
    }

    /// No-op without an open transaction.
    pub fn commit(&mut self) -> TableResult<()> {
        if !self.using_transaction {
            return Ok(());
        }
        self.client()?.commit()?;
        self.using_transaction = false;
        tracing::debug!("transaction committed");
        Ok(())
    }

    /// No-op without an open transaction.
    pub fn roll_back(&mut self) -> TableResult<()> {
        if !self.using_transaction {
            return Ok(());
        }
        self.client()?.roll_back()?;
        self.using_transaction = false;
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.using_transaction
    }

    pub fn last_insert_id(&self, name: Option<&str>) -> TableResult<String> {
        Ok(self.client()?.last_insert_id(name)?)
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    /// Drops the driver handle; an open transaction goes with it.
    pub fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!(in_transaction = self.using_transaction, "connection closed");
        }
        self.using_transaction = false;
    }
}
