//! Arena-backed computation graph.
//!
//! Nodes are appended in creation order and refer to their operands by
//! [`NodeId`] handles into the same arena. The graph is built forward-only and
//! never mutated after creation, so it cannot contain cycles. One node may feed
//! any number of consumers.

use crate::autodiff::{
    checked, Backend, DENOM_EPSILON, DISCRIMINANT_EPSILON, DISCRIMINANT_PENALTY,
};
use crate::error::CurveError;

/// Handle to a node on a [`Tape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The operation that produced a node, with its operand handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Leaf,
    Add(NodeId, NodeId),
    Sub(NodeId, NodeId),
    Mul(NodeId, NodeId),
    Div(NodeId, NodeId),
    Neg(NodeId),
    Sin(NodeId),
    Cos(NodeId),
    Tan(NodeId),
    Sqrt(NodeId),
    Square(NodeId),
    /// Epsilon stand-in for a negative discriminant.
    Penalty(NodeId),
}

impl Op {
    pub fn name(self) -> &'static str {
        match self {
            Op::Leaf => "leaf",
            Op::Add(..) => "add",
            Op::Sub(..) => "sub",
            Op::Mul(..) => "mul",
            Op::Div(..) => "div",
            Op::Neg(_) => "neg",
            Op::Sin(_) => "sin",
            Op::Cos(_) => "cos",
            Op::Tan(_) => "tan",
            Op::Sqrt(_) => "sqrt",
            Op::Square(_) => "square",
            Op::Penalty(_) => "penalty",
        }
    }

    /// Operand handles, in order.
    pub fn inputs(self) -> [Option<NodeId>; 2] {
        match self {
            Op::Leaf => [None, None],
            Op::Add(a, b) | Op::Sub(a, b) | Op::Mul(a, b) | Op::Div(a, b) => [Some(a), Some(b)],
            Op::Neg(a)
            | Op::Sin(a)
            | Op::Cos(a)
            | Op::Tan(a)
            | Op::Sqrt(a)
            | Op::Square(a)
            | Op::Penalty(a) => [Some(a), None],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    value: f64,
    grad: f64,
    op: Op,
}

/// A reverse-mode computation graph of scalar nodes.
#[derive(Debug, Default)]
pub struct Tape {
    nodes: Vec<Node>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node, keeping the allocation for the next graph.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn grad(&self, id: NodeId) -> f64 {
        self.nodes[id.0].grad
    }

    pub fn op(&self, id: NodeId) -> Op {
        self.nodes[id.0].op
    }

    /// Reset every accumulated gradient to zero.
    pub fn zero_grad(&mut self) {
        for node in &mut self.nodes {
            node.grad = 0.0;
        }
    }

    fn push(&mut self, value: f64, op: Op) -> Result<NodeId, CurveError> {
        let value = checked(value, op.name())?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            value,
            grad: 0.0,
            op,
        });
        Ok(id)
    }

    /// Every node reachable from `root`, each exactly once, with `root` last.
    ///
    /// Inputs always precede their consumers.
    pub fn topological_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if visited[id.0] {
                continue;
            }
            visited[id.0] = true;
            stack.push((id, true));
            for input in self.nodes[id.0].op.inputs().into_iter().flatten().rev() {
                if !visited[input.0] {
                    stack.push((input, false));
                }
            }
        }

        order
    }

    /// Propagate `seed` from `root` back through the graph.
    ///
    /// `root`'s gradient is overwritten with `seed`; every other node keeps
    /// its current gradient and accumulates into it. Nodes not reachable from
    /// `root` are left untouched.
    pub fn backward(&mut self, root: NodeId, seed: f64) {
        let order = self.topological_order(root);
        self.nodes[root.0].grad = seed;

        for &id in order.iter().rev() {
            let Node { grad: g, op, .. } = self.nodes[id.0];
            match op {
                Op::Leaf => {}
                Op::Add(a, b) => {
                    self.accumulate(a, g);
                    self.accumulate(b, g);
                }
                Op::Sub(a, b) => {
                    self.accumulate(a, g);
                    self.accumulate(b, -g);
                }
                Op::Mul(a, b) => {
                    let (va, vb) = (self.value(a), self.value(b));
                    self.accumulate(a, g * vb);
                    self.accumulate(b, g * va);
                }
                Op::Div(a, b) => {
                    let (va, vb) = (self.value(a), self.value(b));
                    self.accumulate(a, g / (DENOM_EPSILON + vb));
                    self.accumulate(b, -g * va / (vb * vb + DENOM_EPSILON));
                }
                Op::Neg(a) => self.accumulate(a, -g),
                Op::Sin(a) => {
                    let va = self.value(a);
                    self.accumulate(a, g * va.cos());
                }
                Op::Cos(a) => {
                    let va = self.value(a);
                    self.accumulate(a, -g * va.sin());
                }
                Op::Tan(a) => {
                    let sec = 1.0 / (self.value(a).cos() + DENOM_EPSILON);
                    self.accumulate(a, g * sec * sec);
                }
                Op::Sqrt(a) => {
                    let va = self.value(a);
                    self.accumulate(a, g / (2.0 * va.sqrt() + DENOM_EPSILON));
                }
                Op::Square(a) => {
                    let va = self.value(a);
                    self.accumulate(a, 2.0 * va * g);
                }
                Op::Penalty(a) => self.accumulate(a, DISCRIMINANT_PENALTY * g),
            }
        }
    }

    fn accumulate(&mut self, id: NodeId, delta: f64) {
        self.nodes[id.0].grad += delta;
    }
}

impl Backend for Tape {
    type Value = NodeId;

    fn leaf(&mut self, value: f64) -> Result<NodeId, CurveError> {
        self.push(value, Op::Leaf)
    }

    fn value(&self, v: NodeId) -> f64 {
        self.nodes[v.0].value
    }

    fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, CurveError> {
        self.push(self.value(a) + self.value(b), Op::Add(a, b))
    }

    fn sub(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, CurveError> {
        self.push(self.value(a) - self.value(b), Op::Sub(a, b))
    }

    fn mul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, CurveError> {
        self.push(self.value(a) * self.value(b), Op::Mul(a, b))
    }

    fn div(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, CurveError> {
        self.push(self.value(a) / self.value(b), Op::Div(a, b))
    }

    fn neg(&mut self, a: NodeId) -> Result<NodeId, CurveError> {
        self.push(-self.value(a), Op::Neg(a))
    }

    fn sin(&mut self, a: NodeId) -> Result<NodeId, CurveError> {
        self.push(self.value(a).sin(), Op::Sin(a))
    }

    fn cos(&mut self, a: NodeId) -> Result<NodeId, CurveError> {
        self.push(self.value(a).cos(), Op::Cos(a))
    }

    fn tan(&mut self, a: NodeId) -> Result<NodeId, CurveError> {
        self.push(self.value(a).tan(), Op::Tan(a))
    }

    fn sqrt(&mut self, a: NodeId) -> Result<NodeId, CurveError> {
        self.push(self.value(a).sqrt(), Op::Sqrt(a))
    }

    fn square(&mut self, a: NodeId) -> Result<NodeId, CurveError> {
        let v = self.value(a);
        self.push(v * v, Op::Square(a))
    }

    fn guard_discriminant(&mut self, d: NodeId) -> Result<NodeId, CurveError> {
        if self.value(d) < 0.0 {
            self.push(DISCRIMINANT_EPSILON, Op::Penalty(d))
        } else {
            Ok(d)
        }
    }
}
