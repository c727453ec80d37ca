pub mod inproc_peer_communicator;
