pub mod delivery;

pub use delivery::DeliveryTrackerService;
