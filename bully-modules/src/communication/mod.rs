pub mod inproc;
pub mod network;
pub mod request_channel;
