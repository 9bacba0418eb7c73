use std::collections::{HashMap, HashSet};

use crate::ast::node::{BaseCall, LiteralValue, Node, NodeId, NodeKind};

/// Immutable, fully linked tree.
///
/// Owns the node arena plus two indexes built in a single pass at
/// construction: `id -> parent id` and `fully qualified name -> id`.
pub struct Environment {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    fqns: HashMap<String, NodeId>,
    root: NodeId,
}

impl Environment {
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &Node {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Parent lookup, O(1). `None` only for the root.
    pub fn parent_of(&self, id: NodeId) -> Option<&Node> {
        self.parents[id.index()].map(|parent| self.node(parent))
    }

    /// Resolve a dotted fully qualified name to its node.
    pub fn node_by_fqn(&self, fqn: &str) -> Option<&Node> {
        self.fqns.get(fqn).map(|&id| self.node(id))
    }

    /// Depth-first pre-order fold over the subtree at `root`, visiting each
    /// node exactly once, children in source order. This is the validator's
    /// sole traversal primitive, which keeps diagnostic order deterministic.
    pub fn reduce<T>(&self, root: NodeId, seed: T, mut step: impl FnMut(T, &Node) -> T) -> T {
        self.reduce_inner(root, seed, &mut step)
    }

    fn reduce_inner<T, F: FnMut(T, &Node) -> T>(&self, id: NodeId, seed: T, step: &mut F) -> T {
        let node = self.node(id);
        let mut accumulator = step(seed, node);
        for child in node.children() {
            accumulator = self.reduce_inner(child, accumulator, step);
        }
        accumulator
    }

    /// Whether the module named by `module_fqn` understands `selector` with
    /// `arity` arguments, looking through its own members, its mixins, and
    /// its superclass chain.
    pub fn resolves_method(&self, module_fqn: &str, selector: &str, arity: usize) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.fqns.get(module_fqn).copied();
        while let Some(id) = current {
            if !visited.insert(id) {
                return false;
            }
            let (members, superclass) = match self.node(id) {
                Node::Class {
                    members,
                    superclass,
                    mixins,
                    ..
                } => {
                    if mixins
                        .iter()
                        .any(|&mixin| self.mixin_declares(mixin, selector, arity))
                    {
                        return true;
                    }
                    (members, *superclass)
                }
                Node::Singleton { members, .. } | Node::Mixin { members, .. } => (members, None),
                _ => return false,
            };
            if members
                .iter()
                .any(|&member| self.method_matches(member, selector, arity))
            {
                return true;
            }
            current = superclass.and_then(|reference| self.reference_target(reference));
        }
        false
    }

    fn mixin_declares(&self, reference: NodeId, selector: &str, arity: usize) -> bool {
        let Some(target) = self.reference_target(reference) else {
            return false;
        };
        match self.node(target) {
            Node::Mixin { members, .. } => members
                .iter()
                .any(|&member| self.method_matches(member, selector, arity)),
            _ => false,
        }
    }

    fn reference_target(&self, reference: NodeId) -> Option<NodeId> {
        match self.node(reference) {
            Node::Reference { name, .. } => self.fqns.get(name).copied(),
            _ => None,
        }
    }

    fn method_matches(&self, member: NodeId, selector: &str, arity: usize) -> bool {
        let Node::Method {
            name, parameters, ..
        } = self.node(member)
        else {
            return false;
        };
        if name != selector {
            return false;
        }
        let absorbs_rest = parameters
            .last()
            .is_some_and(|&parameter| is_var_arg(self.node(parameter)));
        parameters.len() == arity || (absorbs_rest && arity + 1 >= parameters.len())
    }
}

fn is_var_arg(node: &Node) -> bool {
    matches!(node, Node::Parameter { is_var_arg: true, .. })
}

/// Allocates dense node ids bottom-up, then links the tree.
///
/// Children must be created before the node that owns them; `build` adds the
/// `Environment` root and runs the single indexing pass.
pub struct EnvironmentBuilder {
    nodes: Vec<Node>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn add(&mut self, make: impl FnOnce(NodeId) -> Node) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(make(id));
        id
    }

    pub fn package(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Package { id, name, members })
    }

    pub fn import(&mut self, reference: NodeId, alias: Option<&str>) -> NodeId {
        let alias = alias.map(str::to_string);
        self.add(|id| Node::Import {
            id,
            reference,
            alias,
        })
    }

    pub fn class(
        &mut self,
        name: &str,
        superclass: Option<NodeId>,
        mixins: Vec<NodeId>,
        members: Vec<NodeId>,
    ) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Class {
            id,
            name,
            superclass,
            mixins,
            members,
        })
    }

    pub fn singleton(&mut self, name: Option<&str>, members: Vec<NodeId>) -> NodeId {
        let name = name.map(str::to_string);
        self.add(|id| Node::Singleton { id, name, members })
    }

    pub fn mixin(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Mixin { id, name, members })
    }

    pub fn field(&mut self, name: &str, initializer: NodeId) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Field {
            id,
            name,
            initializer,
        })
    }

    pub fn method(&mut self, name: &str, parameters: Vec<NodeId>, body: Option<NodeId>) -> NodeId {
        self.method_with_flags(name, parameters, body, false, false)
    }

    pub fn native_method(&mut self, name: &str, parameters: Vec<NodeId>) -> NodeId {
        self.method_with_flags(name, parameters, None, false, true)
    }

    pub fn method_with_flags(
        &mut self,
        name: &str,
        parameters: Vec<NodeId>,
        body: Option<NodeId>,
        is_override: bool,
        is_native: bool,
    ) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Method {
            id,
            name,
            parameters,
            body,
            is_override,
            is_native,
        })
    }

    pub fn constructor(
        &mut self,
        parameters: Vec<NodeId>,
        base_call: Option<BaseCall>,
        body: NodeId,
    ) -> NodeId {
        self.add(|id| Node::Constructor {
            id,
            parameters,
            base_call,
            body,
        })
    }

    pub fn parameter(&mut self, name: &str) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Parameter {
            id,
            name,
            is_var_arg: false,
        })
    }

    pub fn var_arg_parameter(&mut self, name: &str) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Parameter {
            id,
            name,
            is_var_arg: true,
        })
    }

    pub fn body(&mut self, sentences: Vec<NodeId>) -> NodeId {
        self.add(|id| Node::Body { id, sentences })
    }

    pub fn variable(&mut self, name: &str, is_constant: bool, value: Option<NodeId>) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Variable {
            id,
            name,
            is_constant,
            value,
        })
    }

    pub fn returns(&mut self, value: Option<NodeId>) -> NodeId {
        self.add(|id| Node::Return { id, value })
    }

    pub fn assignment(&mut self, reference: NodeId, value: NodeId) -> NodeId {
        self.add(|id| Node::Assignment {
            id,
            reference,
            value,
        })
    }

    pub fn reference(&mut self, name: &str) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Reference { id, name })
    }

    pub fn self_ref(&mut self) -> NodeId {
        self.add(|id| Node::SelfRef { id })
    }

    pub fn super_call(&mut self, arguments: Vec<NodeId>) -> NodeId {
        self.add(|id| Node::Super { id, arguments })
    }

    pub fn new_instance(&mut self, class_reference: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.add(|id| Node::New {
            id,
            class_reference,
            arguments,
        })
    }

    pub fn literal(&mut self, value: LiteralValue) -> NodeId {
        self.add(|id| Node::Literal { id, value })
    }

    pub fn number(&mut self, value: f64) -> NodeId {
        self.literal(LiteralValue::Number(value))
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.literal(LiteralValue::String(value.to_string()))
    }

    pub fn nil(&mut self) -> NodeId {
        self.literal(LiteralValue::Nil)
    }

    pub fn send(&mut self, receiver: NodeId, selector: &str, arguments: Vec<NodeId>) -> NodeId {
        let selector = selector.to_string();
        self.add(|id| Node::Send {
            id,
            receiver,
            selector,
            arguments,
        })
    }

    pub fn if_expression(
        &mut self,
        condition: NodeId,
        then_body: NodeId,
        else_body: Option<NodeId>,
    ) -> NodeId {
        self.add(|id| Node::If {
            id,
            condition,
            then_body,
            else_body,
        })
    }

    pub fn throw(&mut self, exception: NodeId) -> NodeId {
        self.add(|id| Node::Throw { id, exception })
    }

    pub fn try_expression(
        &mut self,
        body: NodeId,
        catches: Vec<NodeId>,
        always: Option<NodeId>,
    ) -> NodeId {
        self.add(|id| Node::Try {
            id,
            body,
            catches,
            always,
        })
    }

    pub fn catch(&mut self, parameter: NodeId, body: NodeId) -> NodeId {
        self.add(|id| Node::Catch {
            id,
            parameter,
            body,
        })
    }

    pub fn program(&mut self, name: &str, body: NodeId) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Program { id, name, body })
    }

    pub fn test(&mut self, name: &str, body: NodeId) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Test { id, name, body })
    }

    pub fn describe(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        let name = name.to_string();
        self.add(|id| Node::Describe { id, name, members })
    }

    pub fn build(mut self, members: Vec<NodeId>) -> Environment {
        let root = self.add(|id| Node::Environment { id, members });
        let mut parents = vec![None; self.nodes.len()];
        let mut fqns = HashMap::new();
        let mut visited = vec![false; self.nodes.len()];
        link(&self.nodes, root, None, "", &mut parents, &mut fqns, &mut visited);
        Environment {
            nodes: self.nodes,
            parents,
            fqns,
            root,
        }
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn link(
    nodes: &[Node],
    id: NodeId,
    parent: Option<NodeId>,
    prefix: &str,
    parents: &mut [Option<NodeId>],
    fqns: &mut HashMap<String, NodeId>,
    visited: &mut [bool],
) {
    debug_assert!(!visited[id.index()], "node {id} linked twice");
    visited[id.index()] = true;
    parents[id.index()] = parent;

    let node = &nodes[id.index()];
    let prefix = match node.kind() {
        NodeKind::Package
        | NodeKind::Class
        | NodeKind::Singleton
        | NodeKind::Mixin
        | NodeKind::Program
        | NodeKind::Test
        | NodeKind::Describe => match node.name() {
            Some(name) => {
                let fqn = if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{prefix}.{name}")
                };
                fqns.insert(fqn.clone(), id);
                fqn
            }
            None => prefix.to_string(),
        },
        _ => prefix.to_string(),
    };

    for child in node.children() {
        link(nodes, child, Some(id), &prefix, parents, fqns, visited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Environment, NodeId, NodeId, NodeId) {
        let mut builder = EnvironmentBuilder::new();
        let initializer = builder.number(100.0);
        let field = builder.field("energy", initializer);
        let parameter = builder.parameter("meters");
        let body = builder.body(vec![]);
        let method = builder.method("fly", vec![parameter], Some(body));
        let class = builder.class("Bird", None, vec![], vec![field, method]);
        let package = builder.package("zoo", vec![class]);
        let environment = builder.build(vec![package]);
        (environment, package, class, method)
    }

    #[test]
    fn parent_lookup_inverts_children() {
        let (environment, package, class, _) = sample();
        let parent = environment.parent_of(class).expect("class has a parent");
        assert_eq!(parent.id(), package);
        assert!(parent.children().contains(&class));
        assert!(environment.parent_of(environment.root_id()).is_none());
    }

    #[test]
    fn every_node_has_a_parent_inside_the_tree() {
        let (environment, ..) = sample();
        let ids = environment.reduce(environment.root_id(), Vec::new(), |mut acc, node| {
            acc.push(node.id());
            acc
        });
        for &id in &ids {
            if id == environment.root_id() {
                continue;
            }
            let parent = environment.parent_of(id).expect("non-root node has a parent");
            assert!(parent.children().contains(&id));
            assert!(ids.contains(&parent.id()));
        }
    }

    #[test]
    fn reduce_visits_each_node_once_in_pre_order() {
        let (environment, package, class, method) = sample();
        let order = environment.reduce(environment.root_id(), Vec::new(), |mut acc, node| {
            acc.push(node.id());
            acc
        });

        let mut deduplicated = order.clone();
        deduplicated.sort();
        deduplicated.dedup();
        assert_eq!(deduplicated.len(), order.len());

        assert_eq!(order[0], environment.root_id());
        assert_eq!(order[1], package);
        let class_at = order.iter().position(|&id| id == class).expect("class visited");
        let method_at = order.iter().position(|&id| id == method).expect("method visited");
        assert!(class_at < method_at);
    }

    #[test]
    fn resolves_nodes_by_fully_qualified_name() {
        let (environment, _, class, _) = sample();
        assert_eq!(
            environment.node_by_fqn("zoo.Bird").map(Node::id),
            Some(class)
        );
        assert!(environment.node_by_fqn("zoo.Cage").is_none());
        assert!(environment.node_by_fqn("Bird").is_none());
    }

    #[test]
    fn resolves_methods_through_members_and_arity() {
        let (environment, ..) = sample();
        assert!(environment.resolves_method("zoo.Bird", "fly", 1));
        assert!(!environment.resolves_method("zoo.Bird", "fly", 0));
        assert!(!environment.resolves_method("zoo.Bird", "swim", 1));
        assert!(!environment.resolves_method("zoo.Fish", "fly", 1));
    }

    #[test]
    fn resolves_methods_through_superclass_and_mixins() {
        let mut builder = EnvironmentBuilder::new();
        let position = builder.native_method("position", vec![]);
        let base = builder.class("Visual", None, vec![], vec![position]);
        let noise = builder.var_arg_parameter("values");
        let chirp = builder.native_method("chirp", vec![noise]);
        let noisy = builder.mixin("Noisy", vec![chirp]);
        let superclass_reference = builder.reference("board.Visual");
        let mixin_reference = builder.reference("board.Noisy");
        let bird = builder.class(
            "Bird",
            Some(superclass_reference),
            vec![mixin_reference],
            vec![],
        );
        let package = builder.package("board", vec![base, noisy, bird]);
        let environment = builder.build(vec![package]);

        assert!(environment.resolves_method("board.Bird", "position", 0));
        assert!(environment.resolves_method("board.Bird", "chirp", 0));
        assert!(environment.resolves_method("board.Bird", "chirp", 3));
        assert!(!environment.resolves_method("board.Bird", "quack", 0));
    }
}
