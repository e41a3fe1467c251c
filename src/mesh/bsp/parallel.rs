//! BSP operations splitting facets with rayon

use rayon::prelude::*;

use crate::mesh::bsp::node::Node;
use crate::mesh::bsp::traits::{BalancedSplittingStrategy, BspOps, SplittingPlaneStrategy};
use crate::mesh::plane::{Plane, Split};
use crate::mesh::polygon::Polygon;
use std::fmt::Debug;
use std::marker::PhantomData;

pub struct ParallelBspOps<SP: SplittingPlaneStrategy<S> = BalancedSplittingStrategy, S: Clone = ()> {
    splitting_strategy: SP,
    _phantom: PhantomData<S>,
}

impl<S: Clone> ParallelBspOps<BalancedSplittingStrategy, S> {
    pub fn new() -> Self {
        Self::with_strategy(BalancedSplittingStrategy::default())
    }
}

impl<S: Clone> Default for ParallelBspOps<BalancedSplittingStrategy, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<SP: SplittingPlaneStrategy<S>, S: Clone> ParallelBspOps<SP, S> {
    pub const fn with_strategy(strategy: SP) -> Self {
        Self {
            splitting_strategy: strategy,
            _phantom: PhantomData,
        }
    }
}

fn par_split<S: Clone + Send + Sync>(plane: &Plane, polygons: &[Polygon<S>]) -> Split<S> {
    polygons
        .par_iter()
        .map(|poly| plane.split_polygon(poly))
        .reduce(
            || (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
            |mut acc, x| {
                acc.0.extend(x.0);
                acc.1.extend(x.1);
                acc.2.extend(x.2);
                acc.3.extend(x.3);
                acc
            },
        )
}

/// Like [`par_split`] with coplanar facets moved to the side they face.
fn par_split_sides<S: Clone + Send + Sync>(
    plane: &Plane,
    polygons: &[Polygon<S>],
) -> (Vec<Polygon<S>>, Vec<Polygon<S>>) {
    let (coplanar_front, coplanar_back, mut front, mut back) = par_split(plane, polygons);
    front.extend(coplanar_front);
    back.extend(coplanar_back);
    (front, back)
}

impl<SP, S> BspOps<S> for ParallelBspOps<SP, S>
where
    SP: SplittingPlaneStrategy<S> + Sync,
    S: Clone + Send + Sync + Debug,
{
    fn invert(&self, node: &mut Node<S>) {
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            current.polygons.par_iter_mut().for_each(Polygon::flip);
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

        let (front, back) = par_split_sides(plane, polygons);

        let (mut result, behind) = rayon::join(
            || match node.front.as_deref() {
                Some(f) => self.clip_polygons(f, &front),
                None => front,
            },
            || match node.back.as_deref() {
                Some(b) => self.clip_polygons(b, &back),
                None => Vec::new(),
            },
        );

        result.extend(behind);
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

        let (front, back) = par_split_sides(plane, polygons);

        let ((mut outside, mut inside), (o, i)) = rayon::join(
            || match node.front.as_deref() {
                Some(f) => self.partition_polygons(f, &front),
                None => (front, Vec::new()),
            },
            || match node.back.as_deref() {
                Some(b) => self.partition_polygons(b, &back),
                None => (Vec::new(), back),
            },
        );

        outside.extend(o);
        inside.extend(i);
        (outside, inside)
    }

    fn clip_to(&self, node: &mut Node<S>, other: &Node<S>) {
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            current.polygons = self.clip_polygons(other, &current.polygons);

            if let Some(front) = current.front.as_deref_mut() {
                stack.push(front);
            }
            if let Some(back) = current.back.as_deref_mut() {
                stack.push(back);
            }
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

        let (coplanar_front, coplanar_back, front, back) = par_split(&plane, polygons);
        node.polygons.extend(coplanar_front);
        node.polygons.extend(coplanar_back);

        // children are built one after the other to keep the stack shallow
        if !front.is_empty() {
            let mut child = node.front.take().unwrap_or_else(|| Box::new(Node::new()));
            self.build(&mut child, &front);
            node.front = Some(child);
        }
        if !back.is_empty() {
            let mut child = node.back.take().unwrap_or_else(|| Box::new(Node::new()));
            self.build(&mut child, &back);
            node.back = Some(child);
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
