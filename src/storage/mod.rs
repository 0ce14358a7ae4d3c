pub mod azure_blob;
pub mod local;
pub mod shared_key;

pub use azure_blob::AzureBlobStore;
pub use local::LocalBlobStore;
