pub mod buckets;
pub mod config;
pub mod device;
pub mod history;
pub mod maintenance;
pub mod monitor;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod timestamp;

pub use buckets::{aggregate, BucketedSeries, Granularity};
pub use config::DashboardConfig;
pub use device::{Coordinates, Device, DeviceSnapshot, RawDevice};
pub use history::{normalize, ClogEvent, ClogHistory, ClogStatus, RawClogRepresentation};
pub use maintenance::{MaintenanceCounts, MaintenanceStatus};
pub use monitor::{DashboardMonitor, NewDevice};
pub use session::{AppState, CredentialSource, Credentials, LoginGate, LogoutReason, Route};
pub use snapshot::{DashboardSnapshot, DashboardSummary};
pub use store::{CancelHandle, Cancellation, DeviceStore, FileStore, FirebaseStore, StoreError};
