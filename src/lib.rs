pub mod archive;
pub mod cli;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod remote;
pub mod runlog;
pub mod scan;
pub mod settings;
pub mod transfer;
pub mod util;

pub use error::SessionError;
pub use error::TransferError;
