//! In-memory warehouse for tests and credential-less local runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::db::{LookupError, LookupResult, Warehouse, WarehouseSession};

#[derive(Debug, Default)]
struct MockState {
    warranty_columns: Vec<String>,
    warranty_rows: HashMap<String, Vec<String>>,
    product_columns: Vec<String>,
    product_rows: Vec<(String, Vec<String>)>,
    open_error: Option<LookupError>,
    warranty_error: Option<LookupError>,
    product_error: Option<LookupError>,
    sessions_opened: usize,
    sessions_closed: usize,
    warranty_queries: usize,
    product_queries: usize,
}

/// Scriptable warehouse double: preload rows, inject failures, then assert
/// on session and query counts afterwards.
#[derive(Clone, Default)]
pub struct MockWarehouse {
    state: Arc<Mutex<MockState>>,
}

impl MockWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_warranty_columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().unwrap().warranty_columns =
            columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_warranty_row<I, S>(self, id: &str, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .unwrap()
            .warranty_rows
            .insert(id.to_string(), row.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_product_columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().unwrap().product_columns =
            columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_product_row<I, S>(self, name: &str, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .unwrap()
            .product_rows
            .push((name.to_string(), row.into_iter().map(Into::into).collect()));
        self
    }

    pub fn failing_open(self, message: &str) -> Self {
        self.state.lock().unwrap().open_error =
            Some(LookupError::Session(message.to_string()));
        self
    }

    pub fn failing_warranty(self, error: LookupError) -> Self {
        self.state.lock().unwrap().warranty_error = Some(error);
        self
    }

    pub fn failing_product(self, error: LookupError) -> Self {
        self.state.lock().unwrap().product_error = Some(error);
        self
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.lock().unwrap().sessions_opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.lock().unwrap().sessions_closed
    }

    pub fn warranty_queries(&self) -> usize {
        self.state.lock().unwrap().warranty_queries
    }

    pub fn product_queries(&self) -> usize {
        self.state.lock().unwrap().product_queries
    }
}

#[async_trait]
impl Warehouse for MockWarehouse {
    async fn open_session(&self) -> Result<Box<dyn WarehouseSession>, LookupError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.open_error.clone() {
            return Err(err);
        }
        state.sessions_opened += 1;
        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct MockSession {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl WarehouseSession for MockSession {
    async fn find_warranty(&mut self, warranty_id: &str) -> Result<LookupResult, LookupError> {
        let mut state = self.state.lock().unwrap();
        state.warranty_queries += 1;
        if let Some(err) = state.warranty_error.clone() {
            return Err(err);
        }
        Ok(match state.warranty_rows.get(warranty_id) {
            Some(row) => LookupResult {
                columns: state.warranty_columns.clone(),
                row: Some(row.clone()),
            },
            None => LookupResult::empty(),
        })
    }

    async fn find_product(&mut self, model: &str) -> Result<LookupResult, LookupError> {
        let mut state = self.state.lock().unwrap();
        state.product_queries += 1;
        if let Some(err) = state.product_error.clone() {
            return Err(err);
        }
        // ILIKE approximated as case-insensitive equality; wildcard patterns
        // are not emulated. First inserted match wins, mirroring the
        // "some row, not a specific one" contract.
        let hit = state
            .product_rows
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(model))
            .map(|(_, row)| row.clone());
        Ok(match hit {
            Some(row) => LookupResult {
                columns: state.product_columns.clone(),
                row: Some(row),
            },
            None => LookupResult::empty(),
        })
    }

    async fn close(self: Box<Self>) -> Result<(), LookupError> {
        self.state.lock().unwrap().sessions_closed += 1;
        Ok(())
    }
}
