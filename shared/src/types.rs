use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn invert(self) -> Self {
        match self {
            HostType::Server => HostType::Client,
            HostType::Client => HostType::Server,
        }
    }

    /// Only the Server may originate entity lifecycle & ownership changes
    pub fn is_authority(&self) -> bool {
        *self == HostType::Server
    }
}

// PeerId
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct PeerId(u64);

impl PeerId {
    /// The PeerId the authority uses to refer to itself
    pub const SERVER: PeerId = PeerId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer#{}", self.0)
    }
}
