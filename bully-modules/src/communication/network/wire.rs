use serde::{Deserialize, Serialize};

use bully::{
    Acknowledgement, Address, AliveRequest, ElectionRequest, JoinRequest, JoinResponse,
    LeaderAnnouncementRequest, MessageRequest, NodeId, QuitTopologyRequest, UpdateTopologyRequest,
};

/// Address wire form: `{hostname, port, nodeId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAddress {
    pub hostname: String,
    pub port: i32,
    pub node_id: NodeId,
}

impl From<&Address> for WireAddress {
    fn from(address: &Address) -> Self {
        WireAddress {
            hostname: address.hostname.clone(),
            port: address.port,
            node_id: address.node_id,
        }
    }
}

impl From<WireAddress> for Address {
    fn from(address: WireAddress) -> Self {
        Address::new(address.hostname, address.port, address.node_id)
    }
}

fn to_wire(addresses: &[Address]) -> Vec<WireAddress> {
    addresses.iter().map(WireAddress::from).collect()
}

fn from_wire(addresses: Vec<WireAddress>) -> Vec<Address> {
    addresses.into_iter().map(Address::from).collect()
}

/// One JSON line per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rpc")]
pub enum WireRequest {
    #[serde(rename_all = "camelCase")]
    Join { hostname: String, port: i32, node_id: NodeId },
    #[serde(rename_all = "camelCase")]
    SendMessage {
        sender_id: NodeId,
        receiver_id: NodeId,
        payload: String,
    },
    #[serde(rename_all = "camelCase")]
    StartElection { candidate_id: NodeId },
    #[serde(rename_all = "camelCase")]
    AnnounceLeader { leader_id: NodeId },
    #[serde(rename_all = "camelCase")]
    IsAlive { sender_id: NodeId },
    #[serde(rename_all = "camelCase")]
    UpdateTopology { known_addresses: Vec<WireAddress> },
    #[serde(rename_all = "camelCase")]
    QuitTopology { sender_id: NodeId },
}

/// One JSON line per response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireResponse {
    #[serde(rename_all = "camelCase")]
    Join {
        ack: bool,
        leader: Option<WireAddress>,
        known_addresses: Vec<WireAddress>,
    },
    Ack { ack: bool },
    Error { message: String },
}

impl From<JoinRequest> for WireRequest {
    fn from(request: JoinRequest) -> Self {
        WireRequest::Join {
            hostname: request.hostname,
            port: request.port,
            node_id: request.node_id,
        }
    }
}

impl From<MessageRequest> for WireRequest {
    fn from(request: MessageRequest) -> Self {
        WireRequest::SendMessage {
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            payload: request.payload,
        }
    }
}

impl From<ElectionRequest> for WireRequest {
    fn from(request: ElectionRequest) -> Self {
        WireRequest::StartElection {
            candidate_id: request.candidate_id,
        }
    }
}

impl From<LeaderAnnouncementRequest> for WireRequest {
    fn from(request: LeaderAnnouncementRequest) -> Self {
        WireRequest::AnnounceLeader {
            leader_id: request.leader_id,
        }
    }
}

impl From<AliveRequest> for WireRequest {
    fn from(request: AliveRequest) -> Self {
        WireRequest::IsAlive {
            sender_id: request.sender_id,
        }
    }
}

impl From<UpdateTopologyRequest> for WireRequest {
    fn from(request: UpdateTopologyRequest) -> Self {
        WireRequest::UpdateTopology {
            known_addresses: to_wire(&request.known_addresses),
        }
    }
}

impl From<QuitTopologyRequest> for WireRequest {
    fn from(request: QuitTopologyRequest) -> Self {
        WireRequest::QuitTopology {
            sender_id: request.sender_id,
        }
    }
}

impl From<JoinResponse> for WireResponse {
    fn from(response: JoinResponse) -> Self {
        WireResponse::Join {
            ack: response.ack,
            leader: response.leader.as_ref().map(WireAddress::from),
            known_addresses: to_wire(&response.known_addresses),
        }
    }
}

impl From<Acknowledgement> for WireResponse {
    fn from(response: Acknowledgement) -> Self {
        WireResponse::Ack { ack: response.ack }
    }
}

impl WireResponse {
    pub fn into_join_response(self) -> Result<JoinResponse, String> {
        match self {
            WireResponse::Join {
                ack,
                leader,
                known_addresses,
            } => Ok(JoinResponse {
                ack,
                leader: leader.map(Address::from),
                known_addresses: from_wire(known_addresses),
            }),
            other => Err(unexpected(other)),
        }
    }

    pub fn into_acknowledgement(self) -> Result<Acknowledgement, String> {
        match self {
            WireResponse::Ack { ack } => Ok(Acknowledgement::new(ack)),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: WireResponse) -> String {
    match response {
        WireResponse::Error { message } => message,
        other => format!("Unexpected response: {:?}", other),
    }
}

pub fn update_topology_request(known_addresses: Vec<WireAddress>) -> UpdateTopologyRequest {
    UpdateTopologyRequest {
        known_addresses: from_wire(known_addresses),
    }
}

#[cfg(test)]
mod tests {
    use bully::{Address, JoinResponse, UpdateTopologyRequest};

    use super::{WireAddress, WireRequest, WireResponse};

    #[test]
    fn address_survives_json() {
        let address = Address::new("node-4.local", 50054, 4);

        let json = serde_json::to_string(&WireAddress::from(&address)).unwrap();
        let decoded: WireAddress = serde_json::from_str(&json).unwrap();

        assert_eq!(json, r#"{"hostname":"node-4.local","port":50054,"nodeId":4}"#);
        assert_eq!(Address::from(decoded), address);
    }

    #[test]
    fn requests_are_tagged_by_rpc_name() {
        let request = WireRequest::from(UpdateTopologyRequest {
            known_addresses: vec![Address::new("localhost", 50051, 1)],
        });

        let json = serde_json::to_string(&request).unwrap();

        assert_eq!(
            json,
            r#"{"rpc":"UpdateTopology","knownAddresses":[{"hostname":"localhost","port":50051,"nodeId":1}]}"#
        );
        assert_eq!(serde_json::from_str::<WireRequest>(&json).unwrap(), request);
    }

    #[test]
    fn join_response_keeps_leader_and_members() {
        let response = JoinResponse {
            ack: true,
            leader: Some(Address::new("localhost", 50055, 5)),
            known_addresses: vec![Address::new("localhost", 50055, 5)],
        };

        let json = serde_json::to_string(&WireResponse::from(response.clone())).unwrap();
        let decoded: WireResponse = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.into_join_response(), Ok(response));
    }

    #[test]
    fn error_response_is_not_an_acknowledgement() {
        let response = WireResponse::Error {
            message: "Node 3 is unreachable".to_string(),
        };

        assert_eq!(response.into_acknowledgement(), Err("Node 3 is unreachable".to_string()));
    }
}
