mod chunks;
mod package;

pub use package::CompressedPackage;
