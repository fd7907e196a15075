mod vector3;

pub use vector3::Vector3;
