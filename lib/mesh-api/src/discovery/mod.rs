/// Resources written by the discovery layer for each reconciliation pass

pub mod destination;
pub mod mesh;
pub mod workload;

pub use destination::Destination;
pub use mesh::Mesh;
pub use workload::Workload;
