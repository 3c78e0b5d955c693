pub mod alert_sent;

pub use alert_sent::AlertSentRepository;
