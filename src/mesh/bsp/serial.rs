//! Serial BSP operations

use crate::mesh::bsp::node::Node;
use crate::mesh::bsp::traits::{BalancedSplittingStrategy, BspOps, SplittingPlaneStrategy};
use crate::mesh::plane::Plane;
use crate::mesh::polygon::Polygon;
use std::fmt::Debug;
use std::marker::PhantomData;

pub struct SerialBspOps<SP: SplittingPlaneStrategy<S> = BalancedSplittingStrategy, S: Clone = ()> {
    splitting_strategy: SP,
    _phantom: PhantomData<S>,
}

impl<S: Clone> SerialBspOps<BalancedSplittingStrategy, S> {
    pub fn new() -> Self {
        Self::with_strategy(BalancedSplittingStrategy::default())
    }
}

impl<S: Clone> Default for SerialBspOps<BalancedSplittingStrategy, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<SP: SplittingPlaneStrategy<S>, S: Clone> SerialBspOps<SP, S> {
    pub const fn with_strategy(strategy: SP) -> Self {
        Self {
            splitting_strategy: strategy,
            _phantom: PhantomData,
        }
    }
}

/// Split every polygon by `plane`; coplanar facets join the side they face.
fn split_all<S: Clone>(plane: &Plane, polygons: &[Polygon<S>]) -> (Vec<Polygon<S>>, Vec<Polygon<S>>) {
    let mut front = Vec::with_capacity(polygons.len());
    let mut back = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let (coplanar_front, coplanar_back, f, b) = plane.split_polygon(polygon);
        front.extend(coplanar_front);
        front.extend(f);
        back.extend(coplanar_back);
        back.extend(b);
    }
    (front, back)
}

impl<SP: SplittingPlaneStrategy<S>, S: Clone + Send + Sync + Debug> BspOps<S> for SerialBspOps<SP, S> {
    fn invert(&self, node: &mut Node<S>) {
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            current.polygons.iter_mut().for_each(Polygon::flip);
            if let Some(plane) = current.plane.as_mut() {
                plane.flip();
            }
            std::mem::swap(&mut current.front, &mut current.back);

            if let Some(front) = current.front.as_deref_mut() {
                stack.push(front);
            }
            if let Some(back) = current.back.as_deref_mut() {
                stack.push(back);
            }
        }
    }

    fn clip_polygons(&self, node: &Node<S>, polygons: &[Polygon<S>]) -> Vec<Polygon<S>> {
        let Some(plane) = node.plane.as_ref() else {
            return polygons.to_vec();
        };

        let (front, back) = split_all(plane, polygons);

        let mut result = match node.front.as_deref() {
            Some(f) => self.clip_polygons(f, &front),
            None => front,
        };

        // no back child: everything behind is inside the solid
        if let Some(b) = node.back.as_deref() {
            result.extend(self.clip_polygons(b, &back));
        }

        result
    }

    fn partition_polygons(
        &self,
        node: &Node<S>,
        polygons: &[Polygon<S>],
    ) -> (Vec<Polygon<S>>, Vec<Polygon<S>>) {
        let Some(plane) = node.plane.as_ref() else {
            return (polygons.to_vec(), Vec::new());
        };

        let (front, back) = split_all(plane, polygons);

        let (mut outside, mut inside) = match node.front.as_deref() {
            Some(f) => self.partition_polygons(f, &front),
            None => (front, Vec::new()),
        };

        match node.back.as_deref() {
            Some(b) => {
                let (o, i) = self.partition_polygons(b, &back);
                outside.extend(o);
                inside.extend(i);
            },
            None => inside.extend(back),
        }

        (outside, inside)
    }

    fn clip_to(&self, node: &mut Node<S>, other: &Node<S>) {
        node.polygons = self.clip_polygons(other, &node.polygons);

        if let Some(front) = node.front.as_deref_mut() {
            self.clip_to(front, other);
        }
        if let Some(back) = node.back.as_deref_mut() {
            self.clip_to(back, other);
        }
    }

    fn build(&self, node: &mut Node<S>, polygons: &[Polygon<S>]) {
        if polygons.is_empty() {
            return;
        }

        let plane = node
            .plane
            .get_or_insert_with(|| self.splitting_strategy.pick_best_splitting_plane(polygons))
            .clone();

        let mut front = Vec::with_capacity(polygons.len() / 2);
        let mut back = Vec::with_capacity(polygons.len() / 2);

        for polygon in polygons {
            let (coplanar_front, coplanar_back, f, b) = plane.split_polygon(polygon);
            node.polygons.extend(coplanar_front);
            node.polygons.extend(coplanar_back);
            front.extend(f);
            back.extend(b);
        }

        if !front.is_empty() {
            let child = node.front.get_or_insert_with(|| Box::new(Node::new()));
            self.build(child, &front);
        }
        if !back.is_empty() {
            let child = node.back.get_or_insert_with(|| Box::new(Node::new()));
            self.build(child, &back);
        }
    }

    fn all_polygons(&self, node: &Node<S>) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            result.extend_from_slice(&current.polygons);
            stack.extend(current.front.as_deref());
            stack.extend(current.back.as_deref());
        }
        result
    }
}
