use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::AppConfig;
use crate::services::email::EmailProvider;
use crate::services::notify::StatusChangeEvent;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub email: Box<dyn EmailProvider>,
    /// Queue feeding the background bot notifier. Events are emitted after
    /// the local transaction commits; delivery is best effort.
    pub notify_tx: UnboundedSender<StatusChangeEvent>,
}
