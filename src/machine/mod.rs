pub mod channel;
pub mod error;

pub use channel::{HttpMachineChannel, MachineChannel, SlotStatus};
pub use error::{ChannelError, ChannelErrorKind};
