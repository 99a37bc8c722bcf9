// Service exports
pub mod notify;
pub mod postgres;
pub mod reconciler;
pub mod similarity;

pub use notify::{MatchNotification, NotificationClient, NotifyError, NotifyResult};
pub use postgres::{CounterpartProfile, MatchSummary, PostgresClient, PostgresError, UserMatchView};
pub use reconciler::{MatchReconciler, ReconcileOutcome};
pub use similarity::SimilarityClient;
