mod election;

pub use election::ElectionCoordinator;
