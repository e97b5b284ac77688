use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use glam::Mat4;
use log::debug;
use viewer_asset::{model::ModelAsset, node::NodeTransform};

/// Index of a node in its [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    BadChild(NodeId, usize),
    MultipleParents(NodeId, NodeId, NodeId),
    Cycle(NodeId),
    BadSceneRoot(usize, usize),
}

impl Display for SceneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::BadChild(parent, child) => {
                write!(f, "Node {} has unknown child #{}", parent, child)
            }
            SceneError::MultipleParents(child, first, second) => write!(
                f,
                "Node {} is a child of both {} and {}",
                child, first, second
            ),
            SceneError::Cycle(node) => write!(f, "Node {} is part of a cycle", node),
            SceneError::BadSceneRoot(scene, node) => {
                write!(f, "Scene #{} has unknown root node #{}", scene, node)
            }
        }
    }
}

impl Error for SceneError {}

#[derive(Debug, Clone)]
pub struct Node {
    name: Option<String>,
    transform: NodeTransform,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    mesh: Option<usize>,
}

impl Node {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rest transform, as loaded.
    pub fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn mesh(&self) -> Option<usize> {
        self.mesh
    }
}

/// Node hierarchy stored as a flat arena.
///
/// The topology is fixed once built. Per-frame transforms live outside of
/// the graph, in buffers indexed by [`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    scenes: Vec<Vec<NodeId>>,
    default_scene: Option<usize>,
}

impl SceneGraph {
    pub fn from_asset(asset: &ModelAsset) -> Result<Self, SceneError> {
        let mut nodes: Vec<Node> = asset
            .nodes
            .iter()
            .map(|node| Node {
                name: node.name.clone(),
                transform: node.transform,
                parent: None,
                children: Vec::with_capacity(node.children.len()),
                mesh: node.mesh,
            })
            .collect();

        for (index, node) in asset.nodes.iter().enumerate() {
            let parent = NodeId(index);
            for &child in &node.children {
                let child_node = nodes
                    .get_mut(child)
                    .ok_or(SceneError::BadChild(parent, child))?;
                if let Some(first) = child_node.parent {
                    return Err(SceneError::MultipleParents(NodeId(child), first, parent));
                }
                child_node.parent = Some(parent);
                nodes[index].children.push(NodeId(child));
            }
        }

        let roots: Vec<NodeId> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(index, _)| NodeId(index))
            .collect();

        let scenes = asset
            .scenes
            .iter()
            .enumerate()
            .map(|(scene_index, scene)| {
                scene
                    .nodes
                    .iter()
                    .map(|&node| {
                        if node < nodes.len() {
                            Ok(NodeId(node))
                        } else {
                            Err(SceneError::BadSceneRoot(scene_index, node))
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let graph = Self {
            nodes,
            roots,
            scenes,
            default_scene: asset.default_scene,
        };

        // Each node has at most one parent, so anything unreachable from a
        // root sits on a cycle.
        let mut visited = vec![false; graph.nodes.len()];
        for root in &graph.roots {
            for node in graph.traverse(*root) {
                visited[node.0] = true;
            }
        }
        if let Some(index) = visited.iter().position(|visited| !visited) {
            return Err(SceneError::Cycle(NodeId(index)));
        }

        debug!(
            "Built scene graph with {} nodes and {} roots",
            graph.nodes.len(),
            graph.roots.len()
        );
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Nodes without a parent.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Root nodes of the default scene, or every root when the model has no
    /// scene.
    pub fn scene_roots(&self) -> &[NodeId] {
        self.default_scene
            .and_then(|index| self.scenes.get(index))
            .or_else(|| self.scenes.first())
            .map(Vec::as_slice)
            .unwrap_or(&self.roots)
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name() == Some(name))
            .map(NodeId)
    }

    /// Whether `node` is `ancestor` or lies below it.
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(Node::parent);
        }
        false
    }

    /// Depth-first pre-order walk of the subtree under `root`.
    pub fn traverse(&self, root: NodeId) -> Traverse<'_> {
        let stack = if self.contains(root) {
            vec![root]
        } else {
            Vec::new()
        };
        Traverse { graph: self, stack }
    }

    pub fn local_matrices(&self) -> Vec<Mat4> {
        self.nodes
            .iter()
            .map(|node| node.transform.matrix())
            .collect()
    }

    /// Compute `global = parent_global * local` for the subtree under
    /// `root`, using `root_parent` as the parent of `root` itself.
    ///
    /// Only entries of the subtree are written.
    pub fn propagate(
        &self,
        root: NodeId,
        root_parent: Mat4,
        locals: &[Mat4],
        globals: &mut [Mat4],
    ) {
        if !self.contains(root) {
            return;
        }
        let mut stack = vec![(root, root_parent)];
        while let Some((id, parent)) = stack.pop() {
            let global = parent * locals[id.0];
            globals[id.0] = global;
            for child in self.nodes[id.0].children.iter().rev() {
                stack.push((*child, global));
            }
        }
    }

    /// Global transforms of every node.
    pub fn global_matrices_into(&self, locals: &[Mat4], globals: &mut Vec<Mat4>) {
        globals.clear();
        globals.resize(self.nodes.len(), Mat4::IDENTITY);
        for root in &self.roots {
            self.propagate(*root, Mat4::IDENTITY, locals, globals);
        }
    }

    pub fn global_matrices(&self, locals: &[Mat4]) -> Vec<Mat4> {
        let mut globals = Vec::new();
        self.global_matrices_into(locals, &mut globals);
        globals
    }
}

pub struct Traverse<'a> {
    graph: &'a SceneGraph,
    stack: Vec<NodeId>,
}

impl Iterator for Traverse<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.graph.nodes[id.0].children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use glam::{Mat4, Quat, Vec3};
    use viewer_asset::{
        model::ModelAsset,
        node::{DecomposedTransform, NodeAsset, NodeTransform},
        scene::SceneAsset,
    };

    use super::{NodeId, SceneError, SceneGraph};

    pub(crate) fn translated(x: f32, y: f32, z: f32, children: Vec<usize>) -> NodeAsset {
        NodeAsset {
            transform: NodeTransform::Decomposed(DecomposedTransform {
                translation: Vec3::new(x, y, z),
                ..Default::default()
            }),
            children,
            ..Default::default()
        }
    }

    /// root(0) -> [arm(1) -> hand(2), leg(3)]
    pub(crate) fn chain_model() -> ModelAsset {
        let mut arm = translated(1.0, 0.0, 0.0, vec![2]);
        if let NodeTransform::Decomposed(transform) = &mut arm.transform {
            transform.rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        }
        ModelAsset {
            nodes: vec![
                NodeAsset {
                    name: Some("root".to_string()),
                    ..translated(0.0, 2.0, 0.0, vec![1, 3])
                },
                NodeAsset {
                    name: Some("arm".to_string()),
                    ..arm
                },
                NodeAsset {
                    name: Some("hand".to_string()),
                    ..translated(1.0, 0.0, 0.0, vec![])
                },
                NodeAsset {
                    name: Some("leg".to_string()),
                    ..translated(0.0, -1.0, 0.0, vec![])
                },
            ],
            scenes: vec![SceneAsset {
                name: None,
                nodes: vec![0],
            }],
            default_scene: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_parents() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        assert_eq!(graph.roots(), &[NodeId(0)]);
        assert_eq!(graph.node(NodeId(2)).unwrap().parent(), Some(NodeId(1)));
        assert_eq!(graph.find_by_name("leg"), Some(NodeId(3)));
        assert!(graph.is_descendant(NodeId(2), NodeId(0)));
        assert!(!graph.is_descendant(NodeId(3), NodeId(1)));
    }

    #[test]
    fn test_traverse_pre_order() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let order: Vec<usize> = graph.traverse(NodeId(0)).map(|id| id.index()).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_global_matrices() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let globals = graph.global_matrices(&graph.local_matrices());
        assert_eq!(globals[0], graph.local_matrices()[0]);

        let hand = globals[2].transform_point3(Vec3::ZERO);
        assert!(hand.abs_diff_eq(Vec3::new(1.0, 3.0, 0.0), 1e-5), "{}", hand);
        let leg = globals[3].transform_point3(Vec3::ZERO);
        assert!(leg.abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5), "{}", leg);
    }

    #[test]
    fn test_propagate_subtree_with_identity_parent() {
        let graph = SceneGraph::from_asset(&chain_model()).unwrap();
        let locals = graph.local_matrices();
        let mut globals = vec![Mat4::ZERO; graph.len()];
        graph.propagate(NodeId(1), Mat4::IDENTITY, &locals, &mut globals);
        assert_eq!(globals[0], Mat4::ZERO);
        assert_eq!(globals[1], locals[1]);
        assert_eq!(globals[2], locals[1] * locals[2]);
    }

    #[test]
    fn test_reject_bad_topology() {
        let mut model = chain_model();
        model.nodes[3].children.push(9);
        assert_eq!(
            SceneGraph::from_asset(&model).unwrap_err(),
            SceneError::BadChild(NodeId(3), 9)
        );

        let mut model = chain_model();
        model.nodes[3].children.push(2);
        assert_eq!(
            SceneGraph::from_asset(&model).unwrap_err(),
            SceneError::MultipleParents(NodeId(2), NodeId(1), NodeId(3))
        );

        let mut model = chain_model();
        model.nodes.push(translated(0.0, 0.0, 0.0, vec![5]));
        model.nodes.push(translated(0.0, 0.0, 0.0, vec![4]));
        assert_eq!(
            SceneGraph::from_asset(&model).unwrap_err(),
            SceneError::Cycle(NodeId(4))
        );
    }
}
