//! Network topology, link properties and face numbering.

use hashbrown::HashMap;
use kitetrace::{Duration, FaceId};

/// Simulated node identifier.
pub type NodeId = u32;

/// Face connecting a node's forwarder to its local application.
pub const APP_FACE: FaceId = FaceId(0);

/// Properties of a link between two nodes.
#[derive(Debug, Clone)]
pub struct Link {
    /// Packet loss rate (0.0 to 1.0).
    pub loss_rate: f64,
    /// Propagation delay.
    pub delay: Duration,
    /// Whether the link is currently up.
    pub active: bool,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            delay: Duration::from_millis(10),
            active: true,
        }
    }
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loss_rate(mut self, rate: f64) -> Self {
        self.loss_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

/// One link with the face each end sees it through.
#[derive(Debug, Clone)]
struct Attachment {
    a: NodeId,
    a_face: FaceId,
    b: NodeId,
    b_face: FaceId,
    link: Link,
}

impl Attachment {
    fn joins(&self, x: NodeId, y: NodeId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

/// Point-to-point links between nodes.
///
/// Each link end gets its own face on its node. Faces are numbered from 1 in
/// the order links are added; face 0 is always the application face.
#[derive(Debug, Clone)]
pub struct Topology {
    links: Vec<Attachment>,
    next_face: HashMap<NodeId, u32>,
    default_link: Link,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            next_face: HashMap::new(),
            default_link: Link::default(),
        }
    }

    /// Set default link properties for [`connect`](Self::connect).
    pub fn with_default_link(mut self, link: Link) -> Self {
        self.default_link = link;
        self
    }

    /// Chain topology (each node linked to its neighbors in order).
    pub fn chain(nodes: &[NodeId]) -> Self {
        let mut topo = Self::new();
        for window in nodes.windows(2) {
            topo.connect(window[0], window[1]);
        }
        topo
    }

    fn allocate_face(&mut self, node: NodeId) -> FaceId {
        let next = self.next_face.entry(node).or_insert(1);
        let face = FaceId(*next);
        *next += 1;
        face
    }

    /// Add a bidirectional link. Returns the faces on `a` and `b`.
    pub fn add_link(&mut self, a: NodeId, b: NodeId, link: Link) -> (FaceId, FaceId) {
        let a_face = self.allocate_face(a);
        let b_face = self.allocate_face(b);
        self.links.push(Attachment {
            a,
            a_face,
            b,
            b_face,
            link,
        });
        (a_face, b_face)
    }

    /// Add a link with default properties.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> (FaceId, FaceId) {
        let link = self.default_link.clone();
        self.add_link(a, b, link)
    }

    pub fn get_link(&self, a: NodeId, b: NodeId) -> Option<&Link> {
        self.links.iter().find(|l| l.joins(a, b)).map(|l| &l.link)
    }

    pub fn get_link_mut(&mut self, a: NodeId, b: NodeId) -> Option<&mut Link> {
        self.links
            .iter_mut()
            .find(|l| l.joins(a, b))
            .map(|l| &mut l.link)
    }

    /// Check if two nodes are connected (link exists and is up).
    pub fn is_connected(&self, a: NodeId, b: NodeId) -> bool {
        self.get_link(a, b).is_some_and(|link| link.active)
    }

    /// Bring a link up or down. Returns false if no such link exists.
    pub fn set_active(&mut self, a: NodeId, b: NodeId, active: bool) -> bool {
        match self.get_link_mut(a, b) {
            Some(link) => {
                link.active = active;
                true
            }
            None => false,
        }
    }

    /// Face on `node` leading to `neighbor`.
    pub fn face_toward(&self, node: NodeId, neighbor: NodeId) -> Option<FaceId> {
        self.links.iter().find_map(|l| {
            if l.a == node && l.b == neighbor {
                Some(l.a_face)
            } else if l.b == node && l.a == neighbor {
                Some(l.b_face)
            } else {
                None
            }
        })
    }

    /// Peer node, its face, and the link behind `face` on `node`.
    pub fn neighbor_on(&self, node: NodeId, face: FaceId) -> Option<(NodeId, FaceId, &Link)> {
        self.links.iter().find_map(|l| {
            if l.a == node && l.a_face == face {
                Some((l.b, l.b_face, &l.link))
            } else if l.b == node && l.b_face == face {
                Some((l.a, l.a_face, &l.link))
            } else {
                None
            }
        })
    }

    /// All link faces of `node` with their up state.
    pub fn faces(&self, node: NodeId) -> Vec<(FaceId, bool)> {
        self.links
            .iter()
            .filter_map(|l| {
                if l.a == node {
                    Some((l.a_face, l.link.active))
                } else if l.b == node {
                    Some((l.b_face, l.link.active))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Set loss rate for all links.
    pub fn set_global_loss_rate(&mut self, rate: f64) {
        let rate = rate.clamp(0.0, 1.0);
        for attachment in &mut self.links {
            attachment.link.loss_rate = rate;
        }
    }
}
