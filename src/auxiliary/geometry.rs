//! Geometrical helpers shared by the collision predicates and the tensor expansions.

use nalgebra::{ClosedMul, Matrix3, Scalar, Vector3};

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod geometry_tests;

/// Computes the outer product between two three-dimensional vectors.
///
/// # Arguments
///
/// * vec1 - The first vector, $\boldsymbol{v}_1$.
/// * vec2 - The second vector, $\boldsymbol{v}_2$.
///
/// # Returns
///
/// The outer product $\boldsymbol{v}_1 \otimes \boldsymbol{v}_2$.
pub fn outer<T: Scalar + ClosedMul + Copy>(vec1: &Vector3<T>, vec2: &Vector3<T>) -> Matrix3<T> {
    let outer_product_iter: Vec<T> = vec2
        .iter()
        .flat_map(|&item_x| vec1.iter().map(move |&item_y| item_y * item_x))
        .collect();
    Matrix3::from_iterator(outer_product_iter)
}

/// Returns the shortest distance between a point and a closed line segment.
///
/// # Arguments
///
/// * `point` - The point $\boldsymbol{p}$.
/// * `start` - The start of the segment, $\boldsymbol{a}$.
/// * `end` - The end of the segment, $\boldsymbol{b}$.
///
/// # Returns
///
/// $\min_{t \in [0, 1]} \lVert \boldsymbol{a} + t(\boldsymbol{b} - \boldsymbol{a}) - \boldsymbol{p} \rVert$.
pub fn point_segment_distance(
    point: &Vector3<f64>,
    start: &Vector3<f64>,
    end: &Vector3<f64>,
) -> f64 {
    let seg = end - start;
    let seg_sq = seg.norm_squared();
    if seg_sq <= f64::EPSILON {
        return (point - start).norm();
    }
    let t = ((point - start).dot(&seg) / seg_sq).clamp(0.0, 1.0);
    (start + t * seg - point).norm()
}
