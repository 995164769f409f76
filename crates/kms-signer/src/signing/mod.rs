mod signer;
mod transactor;
mod local;
pub mod normalize;
pub mod recovery;

pub use signer::KmsSigner;
pub use transactor::{SignableTransaction, TransactionSigner};
pub use local::LocalKeyService;
pub use normalize::{canonicalize, normalize_integer};
pub use recovery::{finalize, recover_public_key};
