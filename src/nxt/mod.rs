//! The nxt module contains the EmpirBus NXT wire format: the 8-byte payload
//! codec, channel addressing, and the data model selector.

pub mod channels;
pub mod data_model;
pub mod frame;

pub use channels::{channel_path, ChannelId, ChannelKind, SwitchBits, SwitchState};
pub use data_model::{DataModel, DataModel2Codec, FrameCodec};
pub use frame::{decode, decode_strict, encode, proprietary_header, ChannelReading, ModuleState};
