pub mod plan;
pub mod shipment;
